//! Typed values and value buckets carried by write commands.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single typed column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::Display)]
#[serde(untagged)]
pub enum ValueObject {
    /// SQL NULL
    #[display("NULL")]
    Null,
    /// 32-bit integer
    #[display("{}", _0)]
    Int(i32),
    /// 64-bit integer
    #[display("{}", _0)]
    Long(i64),
    /// Double precision float
    #[display("{}", _0)]
    Double(f64),
    /// Boolean
    #[display("{}", _0)]
    Bool(bool),
    /// Text
    #[display("'{}'", _0)]
    String(String),
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ValueObject {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

value_from!(i32 => Int, i64 => Long, f64 => Double, bool => Bool, String => String);

impl From<&str> for ValueObject {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl ValueObject {
    /// Whether this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value. Strings are parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Double(v) => Some(*v as i64),
            Self::String(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// Float view of the value. Strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::String(s) => s.trim().parse().ok(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Text view of the value, only for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// SQL-style comparison. NULL compares with nothing.
    pub fn compare(&self, other: &ValueObject) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Double(_), _) | (_, Self::Double(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            _ => Some(self.as_i64()?.cmp(&other.as_i64()?)),
        }
    }
}

/// Column name to value map attached to create and update commands.
///
/// # Example
///
/// ```
/// use medialib_core::{ValueObject, ValuesBucket};
///
/// let mut values = ValuesBucket::new();
/// values.put_string("display_name", "a.jpg");
/// values.put_int("media_type", 1);
/// assert_eq!(values.get_int("media_type"), Some(1));
/// assert_eq!(values.get("missing"), None::<&ValueObject>);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuesBucket {
    values: BTreeMap<String, ValueObject>,
}

impl ValuesBucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put any value.
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<ValueObject>) -> &mut Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Put a 32-bit integer.
    pub fn put_int(&mut self, column: impl Into<String>, value: i32) -> &mut Self {
        self.put(column, value)
    }

    /// Put a 64-bit integer.
    pub fn put_long(&mut self, column: impl Into<String>, value: i64) -> &mut Self {
        self.put(column, value)
    }

    /// Put a double.
    pub fn put_double(&mut self, column: impl Into<String>, value: f64) -> &mut Self {
        self.put(column, value)
    }

    /// Put a boolean.
    pub fn put_bool(&mut self, column: impl Into<String>, value: bool) -> &mut Self {
        self.put(column, value)
    }

    /// Put a string.
    pub fn put_string(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(column, ValueObject::String(value.into()))
    }

    /// Put NULL.
    pub fn put_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.values.insert(column.into(), ValueObject::Null);
        self
    }

    /// Raw value lookup.
    pub fn get(&self, column: &str) -> Option<&ValueObject> {
        self.values.get(column)
    }

    /// Integer lookup narrowed to `i32`.
    pub fn get_int(&self, column: &str) -> Option<i32> {
        self.get_long(column).and_then(|v| i32::try_from(v).ok())
    }

    /// Integer lookup.
    pub fn get_long(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(ValueObject::as_i64)
    }

    /// Float lookup.
    pub fn get_double(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(ValueObject::as_f64)
    }

    /// String lookup.
    pub fn get_string(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(ValueObject::as_str)
    }

    /// Whether the column is present (NULL counts as present).
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Remove a column.
    pub fn remove(&mut self, column: &str) -> Option<ValueObject> {
        self.values.remove(column)
    }

    /// Copy every column of `other` into this bucket, overwriting.
    pub fn merge(&mut self, other: &ValuesBucket) {
        for (k, v) in other.iter() {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Iterate columns in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueObject)> {
        self.values.iter()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep only the named columns. An empty selection keeps everything.
    pub fn project(&self, columns: &[String]) -> ValuesBucket {
        if columns.is_empty() {
            return self.clone();
        }
        let values = columns
            .iter()
            .filter_map(|c| self.values.get(c).map(|v| (c.clone(), v.clone())))
            .collect();
        ValuesBucket { values }
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.values).unwrap_or(serde_json::Value::Null)
    }
}

impl FromIterator<(String, ValueObject)> for ValuesBucket {
    fn from_iter<I: IntoIterator<Item = (String, ValueObject)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_mixes_numeric_widths() {
        assert_eq!(
            ValueObject::Int(3).compare(&ValueObject::Long(3)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            ValueObject::Double(0.5).compare(&ValueObject::Int(1)),
            Some(Ordering::Less)
        );
        assert_eq!(ValueObject::Null.compare(&ValueObject::Int(0)), None);
    }

    #[test]
    fn get_int_rejects_overflow() {
        let mut values = ValuesBucket::new();
        values.put_long("big", i64::MAX);
        assert_eq!(values.get_int("big"), None);
        assert_eq!(values.get_long("big"), Some(i64::MAX));
    }
}
