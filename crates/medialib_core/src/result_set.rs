//! Query results.

use crate::ValuesBucket;
use serde::{Deserialize, Serialize};

/// Rows returned by a query, each projected onto the requested columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<ValuesBucket>,
}

impl ResultSet {
    /// Build from the requested columns and matched rows.
    pub fn new(columns: Vec<String>, rows: Vec<ValuesBucket>) -> Self {
        Self { columns, rows }
    }

    /// Requested columns. Empty means all columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Matched rows.
    pub fn rows(&self) -> &[ValuesBucket] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&ValuesBucket> {
        self.rows.first()
    }
}

impl IntoIterator for ResultSet {
    type Item = ValuesBucket;
    type IntoIter = std::vec::IntoIter<ValuesBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
