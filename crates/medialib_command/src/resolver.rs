//! Entry point turning URIs into commands.

use crate::tables::{OperationTables, TableNameMode};
use crate::{MediaLibraryCommand, OperationObject, OperationType};
use medialib_core::ValuesBucket;
use medialib_error::{CommandError, CommandErrorKind, MediaLibraryResult};
use std::sync::Arc;

/// Parses URIs against injected tables and resolves table names in the
/// configured [`TableNameMode`].
#[derive(Debug, Clone)]
pub struct CommandResolver {
    tables: Arc<OperationTables>,
    mode: TableNameMode,
}

impl CommandResolver {
    /// Resolver over the given tables.
    pub fn new(tables: Arc<OperationTables>, mode: TableNameMode) -> Self {
        Self { tables, mode }
    }

    /// Resolver over the built-in tables.
    pub fn standard(mode: TableNameMode) -> Self {
        Self::new(OperationTables::standard(), mode)
    }

    /// Lookup tables in use.
    pub fn tables(&self) -> &OperationTables {
        &self.tables
    }

    /// Table name mode in use.
    pub fn mode(&self) -> TableNameMode {
        self.mode
    }

    /// Parse a URI.
    pub fn parse(&self, uri: &str) -> MediaLibraryCommand {
        MediaLibraryCommand::with_tables(uri, &self.tables)
    }

    /// Parse a URI and attach a value bucket.
    pub fn parse_with_values(&self, uri: &str, values: ValuesBucket) -> MediaLibraryCommand {
        let mut cmd = self.parse(uri);
        cmd.set_values(values);
        cmd
    }

    /// Table for `(object, type)` in this resolver's mode.
    pub fn resolve_table_name(
        &self,
        object: OperationObject,
        op_type: OperationType,
    ) -> Option<&str> {
        self.tables.resolve_table_name(object, op_type, self.mode)
    }

    /// The command's table, or `E_INVALID_URI` when it has none.
    pub fn table_name<'c>(&self, cmd: &'c mut MediaLibraryCommand) -> MediaLibraryResult<&'c str> {
        let (object, op_type, uri) = (cmd.object(), cmd.op_type(), cmd.uri().to_string());
        cmd.table_name_in(&self.tables, self.mode).ok_or_else(|| {
            CommandError::new(CommandErrorKind::UnknownTable(format!(
                "{} / {} ({})",
                object, op_type, uri
            )))
            .into()
        })
    }
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::standard(TableNameMode::Standard)
    }
}
