//! Parsed inbound request.

use crate::tables::{OperationTables, TableNameMode};
use crate::uri::{self, ApiVersion, AssetKind, UriShape, query_key};
use crate::{OperationObject, OperationType};
use medialib_core::{RdbPredicates, ValuesBucket, columns};
use tracing::{debug, trace};

/// One inbound request resolved into object, verb, row id and payload.
///
/// The table name is resolved on first request and cached; later changes to
/// the object or to the lookup tables do not affect it.
///
/// # Example
///
/// ```
/// use medialib_command::{MediaLibraryCommand, OperationObject, OperationType};
///
/// let cmd = MediaLibraryCommand::new("datashare:///media/phaccess_photo_operation/42");
/// assert_eq!(cmd.object(), OperationObject::PahPhoto);
/// assert_eq!(cmd.op_type(), OperationType::UnknownType);
/// assert_eq!(cmd.file_id(), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct MediaLibraryCommand {
    uri: String,
    object: OperationObject,
    op_type: OperationType,
    api_version: ApiVersion,
    file_id: Option<String>,
    device_id: Option<String>,
    user_id: Option<i32>,
    query: Vec<(String, String)>,
    values: ValuesBucket,
    predicates: RdbPredicates,
    bundle_name: String,
    table: Option<String>,
    table_resolved: bool,
}

impl MediaLibraryCommand {
    /// Parse with the built-in tables.
    pub fn new(uri: &str) -> Self {
        Self::with_tables(uri, &OperationTables::standard())
    }

    /// Parse with the built-in tables and attach a value bucket.
    pub fn with_values(uri: &str, values: ValuesBucket) -> Self {
        let mut cmd = Self::new(uri);
        cmd.values = values;
        cmd
    }

    /// Parse against the given tables.
    pub fn with_tables(uri: &str, tables: &OperationTables) -> Self {
        let parsed = uri::parse(uri);
        let find = |key: &str| {
            parsed
                .query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let (object, mut op_type, file_id) = match &parsed.shape {
            UriShape::Media(segments) => {
                let object = segments
                    .first()
                    .map(|s| tables.resolve_object(s))
                    .unwrap_or(OperationObject::UnknownObject);
                let last = segments.last().filter(|_| segments.len() > 1);
                let file_id = last.filter(|s| uri::is_row_id(s)).cloned();
                let op_type = match last {
                    Some(segment) if file_id.is_none() => tables.resolve_type(segment),
                    _ => OperationType::UnknownType,
                };
                (object, op_type, file_id)
            }
            UriShape::Asset(kind, id) => {
                let object = match kind {
                    AssetKind::Photo => OperationObject::FilesystemPhoto,
                    AssetKind::Audio => OperationObject::FilesystemAudio,
                };
                (object, OperationType::UnknownType, id.clone())
            }
            UriShape::Foreign => (OperationObject::UnknownObject, OperationType::UnknownType, None),
        };

        if op_type == OperationType::UnknownType
            && let Some(keyword) = find(query_key::OPERATION)
        {
            op_type = tables.resolve_type(keyword);
        }

        let mut predicates = RdbPredicates::default();
        if let Some(id) = &file_id {
            predicates.equal_to(columns::FILE_ID, id.as_str());
        }

        let cmd = Self {
            uri: uri.to_string(),
            object,
            op_type,
            api_version: ApiVersion::from_query(find(query_key::API_VERSION)),
            file_id,
            device_id: find(query_key::NETWORK_ID)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            user_id: find(query_key::USER).and_then(|s| s.parse().ok()),
            query: parsed.query.clone(),
            values: ValuesBucket::new(),
            predicates,
            bundle_name: String::new(),
            table: None,
            table_resolved: false,
        };
        trace!(
            uri,
            object = %cmd.object,
            op_type = %cmd.op_type,
            file_id = ?cmd.file_id,
            "Parsed command"
        );
        cmd
    }

    /// Build an internal command with no URI.
    pub fn from_parts(
        object: OperationObject,
        op_type: OperationType,
        api_version: ApiVersion,
    ) -> Self {
        Self {
            uri: String::new(),
            object,
            op_type,
            api_version,
            file_id: None,
            device_id: None,
            user_id: None,
            query: Vec::new(),
            values: ValuesBucket::new(),
            predicates: RdbPredicates::default(),
            bundle_name: String::new(),
            table: None,
            table_resolved: false,
        }
    }

    /// Original URI, empty for internal commands.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Resource kind.
    pub fn object(&self) -> OperationObject {
        self.object
    }

    /// Verb.
    pub fn op_type(&self) -> OperationType {
        self.op_type
    }

    /// Override the resource kind. Has no effect on an already resolved table.
    pub fn set_object(&mut self, object: OperationObject) {
        self.object = object;
    }

    /// Override the verb. Has no effect on an already resolved table.
    pub fn set_op_type(&mut self, op_type: OperationType) {
        self.op_type = op_type;
    }

    /// API generation of the caller.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Row id from the trailing path segment.
    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    /// Distributed device id.
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Secondary user id.
    pub fn user_id(&self) -> Option<i32> {
        self.user_id
    }

    /// Any query parameter by key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value bucket.
    pub fn values(&self) -> &ValuesBucket {
        &self.values
    }

    /// Mutable value bucket.
    pub fn values_mut(&mut self) -> &mut ValuesBucket {
        &mut self.values
    }

    /// Replace the value bucket.
    pub fn set_values(&mut self, values: ValuesBucket) {
        self.values = values;
    }

    /// Row predicate. Seeded with `file_id = N` when the URI carried a row id.
    pub fn predicates(&self) -> &RdbPredicates {
        &self.predicates
    }

    /// Mutable row predicate.
    pub fn predicates_mut(&mut self) -> &mut RdbPredicates {
        &mut self.predicates
    }

    /// Replace the row predicate, keeping the resolved table.
    pub fn set_predicates(&mut self, mut predicates: RdbPredicates) {
        if let Some(table) = &self.table {
            predicates.set_table(table.clone());
        }
        self.predicates = predicates;
    }

    /// Calling bundle.
    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// Record the calling bundle.
    pub fn set_bundle_name(&mut self, bundle_name: impl Into<String>) {
        self.bundle_name = bundle_name.into();
    }

    /// Whether the table has already been resolved.
    pub fn is_table_resolved(&self) -> bool {
        self.table_resolved
    }

    /// Resolve the table once and return the cached name afterwards.
    ///
    /// A device id switches to the distributed table, except for smart
    /// albums. `None` means the object has no table.
    pub fn table_name_in(&mut self, tables: &OperationTables, mode: TableNameMode) -> Option<&str> {
        if !self.table_resolved {
            self.table_resolved = true;
            self.table = tables
                .resolve_table_name(self.object, self.op_type, mode)
                .map(|name| match &self.device_id {
                    Some(device) if self.object.is_distributable() => {
                        distributed_table_name(device, name)
                    }
                    _ => name.to_string(),
                });
            if let Some(table) = &self.table {
                self.predicates.set_table(table.clone());
            }
            debug!(
                object = %self.object,
                op_type = %self.op_type,
                table = ?self.table,
                "Resolved table"
            );
        }
        self.table.as_deref()
    }
}

/// Name of the local mirror of `table` for a remote device.
pub fn distributed_table_name(device_id: &str, table: &str) -> String {
    format!("{}_{}", table, device_id)
}
