//! HashMap-backed implementation of [`Database`].
//!
//! Tables are created on first insert. Predicates are evaluated directly
//! against stored rows, so the store needs no schema. All data is lost when
//! the last handle is dropped.

use medialib_core::{RdbPredicates, ResultSet, ValueObject, ValuesBucket, columns};
use medialib_error::{DatabaseError, DatabaseErrorKind, MediaLibraryResult};
use medialib_interface::{Database, UpdateStatement};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Operations that can be made to fail once, for exercising error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Next `query`
    Query,
    /// Next `insert`
    Insert,
    /// Next `update`
    Update,
    /// Next `delete`
    Delete,
    /// Next `update_batch`
    Batch,
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<i64, ValuesBucket>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct Store {
    tables: HashMap<String, Table>,
    primary_keys: HashMap<String, String>,
    statements: Vec<String>,
    fail_points: Vec<FailPoint>,
}

impl Store {
    fn take_fail_point(&mut self, point: FailPoint) -> bool {
        match self.fail_points.iter().position(|p| *p == point) {
            Some(pos) => {
                self.fail_points.remove(pos);
                true
            }
            None => false,
        }
    }

    fn primary_key(&self, table: &str) -> String {
        self.primary_keys
            .get(table)
            .cloned()
            .unwrap_or_else(|| columns::FILE_ID.to_string())
    }

    fn apply_update(&mut self, values: &ValuesBucket, predicates: &RdbPredicates) -> usize {
        let Some(table) = self.tables.get_mut(predicates.table()) else {
            return 0;
        };
        let mut changed = 0;
        for row in table.rows.values_mut().filter(|row| predicates.matches(row)) {
            row.merge(values);
            changed += 1;
        }
        changed
    }
}

/// In-memory relational store.
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use medialib_core::{RdbPredicates, ValuesBucket};
/// use medialib_database::MemoryDatabase;
/// use medialib_interface::Database;
///
/// let db = MemoryDatabase::new();
/// let mut values = ValuesBucket::new();
/// values.put_string("display_name", "a.jpg");
/// let id = db.insert("Photos", &values).unwrap();
///
/// let mut predicates = RdbPredicates::new("Photos");
/// predicates.equal_to("file_id", id);
/// let rows = db.query(&predicates, &[]).unwrap();
/// assert_eq!(rows.row_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    store: Arc<RwLock<Store>>,
}

impl MemoryDatabase {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `column` as the row id of `table` instead of `file_id`.
    pub fn with_primary_key(self, table: &str, column: &str) -> Self {
        self.store
            .write()
            .primary_keys
            .insert(table.to_string(), column.to_string());
        self
    }

    /// Make the next call of `point` fail.
    pub fn fail_next(&self, point: FailPoint) {
        self.store.write().fail_points.push(point);
    }

    /// Every row of `table` in id order.
    pub fn rows(&self, table: &str) -> Vec<ValuesBucket> {
        self.store
            .read()
            .tables
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Row of `table` with the given id.
    pub fn row(&self, table: &str, id: i64) -> Option<ValuesBucket> {
        self.store
            .read()
            .tables
            .get(table)
            .and_then(|t| t.rows.get(&id).cloned())
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.store
            .read()
            .tables
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    /// Raw statements received through `execute_sql`.
    pub fn executed_statements(&self) -> Vec<String> {
        self.store.read().statements.clone()
    }
}

fn injected(kind: fn(String) -> DatabaseErrorKind, point: FailPoint) -> DatabaseError {
    DatabaseError::new(kind(format!("injected failure at {:?}", point)))
}

impl Database for MemoryDatabase {
    #[instrument(skip(self, values), fields(columns = values.len()))]
    fn insert(&self, table: &str, values: &ValuesBucket) -> MediaLibraryResult<i64> {
        let mut store = self.store.write();
        if store.take_fail_point(FailPoint::Insert) {
            return Err(injected(DatabaseErrorKind::Insert, FailPoint::Insert).into());
        }
        let key = store.primary_key(table);
        let entry = store.tables.entry(table.to_string()).or_default();

        let id = match values.get_long(&key) {
            Some(id) if id > 0 => {
                if entry.rows.contains_key(&id) {
                    return Err(DatabaseError::new(DatabaseErrorKind::Insert(format!(
                        "duplicate {} {} in {}",
                        key, id, table
                    )))
                    .into());
                }
                id
            }
            _ => entry.next_id + 1,
        };
        entry.next_id = entry.next_id.max(id);

        let mut row = values.clone();
        row.put_long(key, id);
        entry.rows.insert(id, row);
        debug!(table, id, "Inserted row");
        Ok(id)
    }

    #[instrument(skip(self, values, predicates), fields(table = predicates.table()))]
    fn update(&self, values: &ValuesBucket, predicates: &RdbPredicates) -> MediaLibraryResult<usize> {
        let mut store = self.store.write();
        if store.take_fail_point(FailPoint::Update) {
            return Err(injected(DatabaseErrorKind::Update, FailPoint::Update).into());
        }
        let changed = store.apply_update(values, predicates);
        debug!(changed, "Updated rows");
        Ok(changed)
    }

    #[instrument(skip(self, predicates), fields(table = predicates.table()))]
    fn delete(&self, predicates: &RdbPredicates) -> MediaLibraryResult<usize> {
        let mut store = self.store.write();
        if store.take_fail_point(FailPoint::Delete) {
            return Err(injected(DatabaseErrorKind::Delete, FailPoint::Delete).into());
        }
        let Some(table) = store.tables.get_mut(predicates.table()) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|_, row| !predicates.matches(row));
        let removed = before - table.rows.len();
        debug!(removed, "Deleted rows");
        Ok(removed)
    }

    #[instrument(skip(self, predicates, columns), fields(table = predicates.table()))]
    fn query(&self, predicates: &RdbPredicates, columns: &[String]) -> MediaLibraryResult<ResultSet> {
        let mut store = self.store.write();
        if store.take_fail_point(FailPoint::Query) {
            return Err(injected(DatabaseErrorKind::Query, FailPoint::Query).into());
        }
        let mut rows: Vec<ValuesBucket> = store
            .tables
            .get(predicates.table())
            .map(|t| {
                t.rows
                    .values()
                    .filter(|row| predicates.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !predicates.order_by().is_empty() {
            rows.sort_by(|a, b| {
                for (column, ascending) in predicates.order_by() {
                    let lhs = a.get(column).unwrap_or(&ValueObject::Null);
                    let rhs = b.get(column).unwrap_or(&ValueObject::Null);
                    let ordering = lhs.compare(rhs).unwrap_or(Ordering::Equal);
                    let ordering = if *ascending { ordering } else { ordering.reverse() };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = predicates.limit_value() {
            rows.truncate(limit);
        }

        let rows = rows.iter().map(|row| row.project(columns)).collect();
        Ok(ResultSet::new(columns.to_vec(), rows))
    }

    fn execute_sql(&self, sql: &str) -> MediaLibraryResult<()> {
        debug!(sql, "Recording raw statement");
        self.store.write().statements.push(sql.to_string());
        Ok(())
    }

    #[instrument(skip(self, statements), fields(statements = statements.len()))]
    fn update_batch(&self, statements: &[UpdateStatement]) -> MediaLibraryResult<Vec<usize>> {
        let mut store = self.store.write();
        if store.take_fail_point(FailPoint::Batch) {
            warn!("Rolling back batch");
            return Err(injected(DatabaseErrorKind::Transaction, FailPoint::Batch).into());
        }
        let changed = statements
            .iter()
            .map(|s| store.apply_update(&s.values, &s.predicates))
            .collect();
        Ok(changed)
    }
}
