//! Process-wide wiring of the media library.

use crate::config::MediaLibraryConfig;
use crate::data_manager::MediaLibraryDataManager;
use medialib_cache::PictureCache;
use medialib_capture::CaptureManager;
use medialib_command::CommandResolver;
use medialib_interface::{Database, DeferredProcessingSession, ImageCodec, ProcessingEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Owns every long-lived component and hands out shared handles.
///
/// Built once at start-up and passed to whoever serves requests.
#[derive(Debug)]
pub struct MediaLibraryContext {
    config: MediaLibraryConfig,
    resolver: CommandResolver,
    cache: Arc<PictureCache>,
    capture: Arc<CaptureManager>,
    data_manager: MediaLibraryDataManager,
}

impl MediaLibraryContext {
    /// Wire the components around the external collaborators.
    #[instrument(skip_all)]
    pub fn new(
        config: MediaLibraryConfig,
        db: Arc<dyn Database>,
        session: Arc<dyn DeferredProcessingSession>,
        codec: Arc<dyn ImageCodec>,
    ) -> Self {
        let resolver = CommandResolver::standard(config.tables().mode());
        let cache = Arc::new(PictureCache::new(
            config.picture_cache().clone(),
            codec.clone(),
        ));
        let capture = Arc::new(CaptureManager::with_report_interval(
            db.clone(),
            session,
            codec,
            cache.clone(),
            config.dfx().report_interval(),
        ));
        let data_manager = MediaLibraryDataManager::new(resolver.clone(), db, capture.clone());
        info!(mode = ?resolver.mode(), "Media library context created");
        Self {
            config,
            resolver,
            cache,
            capture,
            data_manager,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &MediaLibraryConfig {
        &self.config
    }

    /// URI resolver.
    pub fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    /// Shared picture cache.
    pub fn cache(&self) -> &Arc<PictureCache> {
        &self.cache
    }

    /// Capture pipeline.
    pub fn capture(&self) -> &Arc<CaptureManager> {
        &self.capture
    }

    /// Request router.
    pub fn data_manager(&self) -> &MediaLibraryDataManager {
        &self.data_manager
    }

    /// Start background work: completion loop, cache sweeper and, when
    /// configured, start-up reconciliation.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self) -> BackgroundTasks {
        let (events, rx) = mpsc::channel((*self.config.capture().event_queue()).max(1));
        let event_loop = self.capture.spawn_event_loop(rx);
        let sweeper = if *self.config.picture_cache().enabled() {
            Some(self.cache.spawn_sweeper())
        } else {
            None
        };
        let sync = self.capture.init(*self.config.capture().sync_on_start());
        info!("Background tasks started");
        BackgroundTasks {
            events,
            event_loop,
            sweeper,
            sync,
        }
    }
}

/// Handles to the background work started by [`MediaLibraryContext::start`].
#[derive(Debug)]
pub struct BackgroundTasks {
    events: mpsc::Sender<ProcessingEvent>,
    event_loop: JoinHandle<()>,
    sweeper: Option<JoinHandle<()>>,
    sync: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Sender handed to the deferred session adapter.
    pub fn events(&self) -> mpsc::Sender<ProcessingEvent> {
        self.events.clone()
    }

    /// Stop the sweeper and wait for queued completions to drain.
    ///
    /// Returns once every sender obtained from [`events`](Self::events) is dropped.
    pub async fn shutdown(self) {
        if let Some(sweeper) = self.sweeper {
            sweeper.abort();
        }
        if let Some(sync) = self.sync
            && let Err(e) = sync.await
        {
            warn!(error = ?e, "Reconciliation task failed");
        }
        drop(self.events);
        if let Err(e) = self.event_loop.await {
            warn!(error = ?e, "Capture event loop failed");
        }
        info!("Background tasks stopped");
    }
}
