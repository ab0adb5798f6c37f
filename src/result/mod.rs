//! Typed result sets.
//!
//! A [`ResultSet`] is produced once per executed query and never mutated
//! afterwards. The classifier and the summary generator both read it through
//! shared references.

mod infer;

pub use infer::{infer_column_type, is_date_like};

use serde::Serialize;

use crate::schema::ColumnType;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    ///
    /// Text is not parsed: a column typed numeric by its declaration may
    /// still hold text in SQLite, and such cells are treated as absent.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text used when the value names a group or category.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A named, typed result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultColumn {
    pub name: String,
    pub column_type: ColumnType,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Error raised when rows do not line up with the declared columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {row} has {found} values but the result declares {expected} columns")]
pub struct ShapeError {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

/// Ordered columns and positionally aligned rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<ResultColumn>,
    rows: Vec<Vec<Value>>,
    truncated: bool,
}

impl ResultSet {
    /// Build a result set, checking that every row has one value per column.
    pub fn new(columns: Vec<ResultColumn>, rows: Vec<Vec<Value>>) -> Result<Self, ShapeError> {
        let expected = columns.len();
        if let Some((row, values)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(ShapeError {
                row,
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
            truncated: false,
        })
    }

    /// An empty result with the given columns.
    pub fn empty(columns: Vec<ResultColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            truncated: false,
        }
    }

    /// Mark the result as cut short by a row or time ceiling.
    pub(crate) fn into_truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rows were dropped because a ceiling was reached.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Position of the first column whose type satisfies `pred`.
    pub fn first_column_where(&self, pred: impl Fn(ColumnType) -> bool) -> Option<usize> {
        self.columns.iter().position(|c| pred(c.column_type))
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }
}
