//! Row predicates for query, update and delete commands.
//!
//! A predicate is a flat list of conditions, connectors and wrap markers, as
//! produced by the builder methods. It can be rendered to a SQL where clause
//! with positional arguments, or evaluated directly against a row.

use crate::ValuesBucket;
use crate::values::ValueObject;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum CompareOp {
    /// `=`
    #[display("=")]
    Equal,
    /// `<>`
    #[display("<>")]
    NotEqual,
    /// `>`
    #[display(">")]
    Greater,
    /// `>=`
    #[display(">=")]
    GreaterOrEqual,
    /// `<`
    #[display("<")]
    Less,
    /// `<=`
    #[display("<=")]
    LessOrEqual,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
            Self::Greater => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::Less => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
        }
    }
}

/// One element of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredicateItem {
    /// `column op ?`
    Compare {
        /// Column name
        column: String,
        /// Operator
        op: CompareOp,
        /// Right-hand value
        value: ValueObject,
    },
    /// `column IS NULL`
    IsNull(String),
    /// `column IS NOT NULL`
    IsNotNull(String),
    /// `column IN (?, ...)`
    In {
        /// Column name
        column: String,
        /// Candidate values
        values: Vec<ValueObject>,
    },
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `(`
    BeginWrap,
    /// `)`
    EndWrap,
}

impl PredicateItem {
    fn is_operand_end(&self) -> bool {
        !matches!(self, Self::And | Self::Or | Self::BeginWrap)
    }
}

/// Predicate builder scoped to one table.
///
/// Adjacent conditions without an explicit connector are joined with `AND`.
///
/// # Example
///
/// ```
/// use medialib_core::RdbPredicates;
///
/// let mut predicates = RdbPredicates::new("Photos");
/// predicates
///     .is_not_null("photo_id")
///     .greater_than("photo_quality", 0)
///     .begin_wrap()
///     .equal_to("media_type", 1)
///     .or()
///     .equal_to("media_type", 2)
///     .end_wrap();
/// assert_eq!(
///     predicates.where_clause(),
///     "photo_id IS NOT NULL AND photo_quality > ? AND (media_type = ? OR media_type = ?)"
/// );
/// assert_eq!(predicates.where_args().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RdbPredicates {
    table: String,
    items: Vec<PredicateItem>,
    order_by: Vec<(String, bool)>,
    limit: Option<usize>,
}

impl RdbPredicates {
    /// Create an empty predicate on `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Target table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Retarget to another table, keeping conditions.
    pub fn set_table(&mut self, table: impl Into<String>) {
        self.table = table.into();
    }

    /// Raw items in builder order.
    pub fn items(&self) -> &[PredicateItem] {
        &self.items
    }

    /// Whether no condition has been added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ordering terms as `(column, ascending)`.
    pub fn order_by(&self) -> &[(String, bool)] {
        &self.order_by
    }

    /// Row limit.
    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    fn push_operand(&mut self, item: PredicateItem) -> &mut Self {
        if self.items.last().is_some_and(PredicateItem::is_operand_end) {
            self.items.push(PredicateItem::And);
        }
        self.items.push(item);
        self
    }

    fn compare(&mut self, column: &str, op: CompareOp, value: impl Into<ValueObject>) -> &mut Self {
        self.push_operand(PredicateItem::Compare {
            column: column.to_string(),
            op,
            value: value.into(),
        })
    }

    /// `column = value`
    pub fn equal_to(&mut self, column: &str, value: impl Into<ValueObject>) -> &mut Self {
        self.compare(column, CompareOp::Equal, value)
    }

    /// `column <> value`
    pub fn not_equal_to(&mut self, column: &str, value: impl Into<ValueObject>) -> &mut Self {
        self.compare(column, CompareOp::NotEqual, value)
    }

    /// `column > value`
    pub fn greater_than(&mut self, column: &str, value: impl Into<ValueObject>) -> &mut Self {
        self.compare(column, CompareOp::Greater, value)
    }

    /// `column >= value`
    pub fn greater_than_or_equal_to(
        &mut self,
        column: &str,
        value: impl Into<ValueObject>,
    ) -> &mut Self {
        self.compare(column, CompareOp::GreaterOrEqual, value)
    }

    /// `column < value`
    pub fn less_than(&mut self, column: &str, value: impl Into<ValueObject>) -> &mut Self {
        self.compare(column, CompareOp::Less, value)
    }

    /// `column <= value`
    pub fn less_than_or_equal_to(
        &mut self,
        column: &str,
        value: impl Into<ValueObject>,
    ) -> &mut Self {
        self.compare(column, CompareOp::LessOrEqual, value)
    }

    /// `column IS NULL`
    pub fn is_null(&mut self, column: &str) -> &mut Self {
        self.push_operand(PredicateItem::IsNull(column.to_string()))
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(&mut self, column: &str) -> &mut Self {
        self.push_operand(PredicateItem::IsNotNull(column.to_string()))
    }

    /// `column IN (values)`
    pub fn in_values<V: Into<ValueObject>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push_operand(PredicateItem::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Explicit `AND`.
    pub fn and(&mut self) -> &mut Self {
        self.items.push(PredicateItem::And);
        self
    }

    /// Explicit `OR`.
    pub fn or(&mut self) -> &mut Self {
        self.items.push(PredicateItem::Or);
        self
    }

    /// Open a group.
    pub fn begin_wrap(&mut self) -> &mut Self {
        if self.items.last().is_some_and(PredicateItem::is_operand_end) {
            self.items.push(PredicateItem::And);
        }
        self.items.push(PredicateItem::BeginWrap);
        self
    }

    /// Close a group.
    pub fn end_wrap(&mut self) -> &mut Self {
        self.items.push(PredicateItem::EndWrap);
        self
    }

    /// Rewrite as `column = value AND (current conditions)`.
    ///
    /// Keeps any `OR` in the current conditions inside the restriction.
    /// Ordering and limit are unchanged.
    ///
    /// ```
    /// use medialib_core::RdbPredicates;
    ///
    /// let mut predicates = RdbPredicates::new("Photos");
    /// predicates.equal_to("media_type", 1).or().equal_to("media_type", 2);
    /// predicates.restrict_to("file_id", 7);
    /// assert_eq!(
    ///     predicates.where_clause(),
    ///     "file_id = ? AND (media_type = ? OR media_type = ?)"
    /// );
    /// ```
    pub fn restrict_to(&mut self, column: &str, value: impl Into<ValueObject>) -> &mut Self {
        let current = std::mem::take(&mut self.items);
        self.equal_to(column, value);
        if !current.is_empty() {
            self.items.push(PredicateItem::And);
            self.items.push(PredicateItem::BeginWrap);
            self.items.extend(current);
            self.items.push(PredicateItem::EndWrap);
        }
        self
    }

    /// Ascending ordering on `column`.
    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.order_by.push((column.to_string(), true));
        self
    }

    /// Descending ordering on `column`.
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by.push((column.to_string(), false));
        self
    }

    /// Limit the number of returned rows.
    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// SQL where clause with `?` placeholders.
    pub fn where_clause(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let part = match item {
                PredicateItem::Compare { column, op, .. } => format!("{} {} ?", column, op),
                PredicateItem::IsNull(column) => format!("{} IS NULL", column),
                PredicateItem::IsNotNull(column) => format!("{} IS NOT NULL", column),
                PredicateItem::In { column, values } => {
                    let marks = vec!["?"; values.len()].join(", ");
                    format!("{} IN ({})", column, marks)
                }
                PredicateItem::And => "AND".to_string(),
                PredicateItem::Or => "OR".to_string(),
                PredicateItem::BeginWrap => "(".to_string(),
                PredicateItem::EndWrap => ")".to_string(),
            };
            parts.push(part);
        }
        parts.join(" ").replace("( ", "(").replace(" )", ")")
    }

    /// Positional arguments matching [`where_clause`](Self::where_clause).
    pub fn where_args(&self) -> Vec<ValueObject> {
        self.items
            .iter()
            .flat_map(|item| match item {
                PredicateItem::Compare { value, .. } => vec![value.clone()],
                PredicateItem::In { values, .. } => values.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// Evaluate against a row. An empty predicate matches every row.
    ///
    /// `AND` binds tighter than `OR`; comparisons against NULL or a missing
    /// column are false.
    pub fn matches(&self, row: &ValuesBucket) -> bool {
        if self.items.is_empty() {
            return true;
        }
        let mut cursor = 0;
        Evaluator {
            items: &self.items,
            row,
        }
        .expr(&mut cursor)
    }
}

struct Evaluator<'a> {
    items: &'a [PredicateItem],
    row: &'a ValuesBucket,
}

impl Evaluator<'_> {
    fn expr(&self, cursor: &mut usize) -> bool {
        let mut result = self.term(cursor);
        while matches!(self.items.get(*cursor), Some(PredicateItem::Or)) {
            *cursor += 1;
            let rhs = self.term(cursor);
            result = result || rhs;
        }
        result
    }

    fn term(&self, cursor: &mut usize) -> bool {
        let mut result = self.factor(cursor);
        while matches!(self.items.get(*cursor), Some(PredicateItem::And)) {
            *cursor += 1;
            let rhs = self.factor(cursor);
            result = result && rhs;
        }
        result
    }

    fn factor(&self, cursor: &mut usize) -> bool {
        let Some(item) = self.items.get(*cursor) else {
            return true;
        };
        *cursor += 1;
        match item {
            PredicateItem::BeginWrap => {
                let inner = self.expr(cursor);
                if matches!(self.items.get(*cursor), Some(PredicateItem::EndWrap)) {
                    *cursor += 1;
                }
                inner
            }
            PredicateItem::Compare { column, op, value } => self
                .value(column)
                .compare(value)
                .is_some_and(|ordering| op.accepts(ordering)),
            PredicateItem::IsNull(column) => self.value(column).is_null(),
            PredicateItem::IsNotNull(column) => !self.value(column).is_null(),
            PredicateItem::In { column, values } => {
                let actual = self.value(column);
                values
                    .iter()
                    .any(|v| actual.compare(v) == Some(Ordering::Equal))
            }
            // stray connector or closing paren
            PredicateItem::And | PredicateItem::Or | PredicateItem::EndWrap => true,
        }
    }

    fn value(&self, column: &str) -> ValueObject {
        self.row.get(column).cloned().unwrap_or(ValueObject::Null)
    }
}
