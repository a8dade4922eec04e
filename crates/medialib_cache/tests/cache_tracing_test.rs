//! Tests for the span fields recorded by the picture cache.

use medialib_cache::{PictureCache, PictureCacheConfig, PicturePair};
use medialib_core::{Picture, PictureTier};
use medialib_error::StorageError;
use medialib_interface::ImageCodec;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

struct NullCodec;

impl ImageCodec for NullCodec {
    fn save_picture(
        &self,
        _image_id: &str,
        _picture: &Picture,
        _tier: PictureTier,
        _is_edited: bool,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    fn write_gps(&self, _path: &str, _latitude: f64, _longitude: f64) -> Result<(), StorageError> {
        Ok(())
    }
}

type Recorded = Arc<Mutex<Vec<(String, String, String)>>>;

/// Records `(span, field, value)` for every new span.
struct FieldRecorder(Recorded);

struct FieldVisitor<'a> {
    span: &'static str,
    out: &'a mut Vec<(String, String, String)>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.out
            .push((self.span.to_string(), field.name().to_string(), value.to_string()));
    }

    // Debug-formatted strings arrive quoted.
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.out.push((
            self.span.to_string(),
            field.name().to_string(),
            format!("{:?}", value).trim_matches('"').to_string(),
        ));
    }
}

impl<S: tracing::Subscriber> Layer<S> for FieldRecorder {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut out = self.0.lock();
        attrs.record(&mut FieldVisitor {
            span: attrs.metadata().name(),
            out: &mut out,
        });
    }
}

fn recorded_fields(action: impl FnOnce(&PictureCache)) -> Vec<(String, String, String)> {
    let recorded: Recorded = Arc::default();
    let subscriber = Registry::default().with(FieldRecorder(recorded.clone()));
    let cache = PictureCache::new(PictureCacheConfig::default(), Arc::new(NullCodec));
    tracing::subscriber::with_default(subscriber, || action(&cache));
    recorded.lock().clone()
}

fn pair() -> PicturePair {
    PicturePair::new(Picture::new(vec![1u8; 16], 4, 4), false)
}

#[test]
fn test_insert_spans_record_image_id_and_tier() {
    let fields = recorded_fields(|cache| {
        cache.insert_picture_data("IMG_1", pair(), PictureTier::HighQuality);
        cache.insert_if_absent("IMG_2", pair(), PictureTier::LowQuality);
    });

    let has = |span: &str, field: &str, value: &str| {
        fields
            .iter()
            .any(|(s, f, v)| s == span && f == field && v == value)
    };
    assert!(has("insert_picture_data_at", "image_id", "IMG_1"), "{:?}", fields);
    assert!(has("insert_picture_data_at", "tier", "high_quality"), "{:?}", fields);
    assert!(has("insert_if_absent_at", "image_id", "IMG_2"), "{:?}", fields);
}

#[test]
fn test_flush_span_records_image_id() {
    let fields = recorded_fields(|cache| {
        cache.insert_picture_data("IMG_3", pair(), PictureTier::HighQuality);
        assert!(cache.save_picture_with_image_id("IMG_3"));
    });

    assert!(
        fields
            .iter()
            .any(|(s, f, v)| s == "save_tier" && f == "image_id" && v == "IMG_3"),
        "{:?}",
        fields
    );
}
