//! Value-based type inference for result columns.
//!
//! Computed expressions (`SUM(...)`, `strftime(...)`) carry no declared type,
//! so their semantic type is read off the values they produced.

use std::sync::LazyLock;

use regex::Regex;

use super::Value;
use crate::schema::ColumnType;

/// ISO-8601 style dates, months, and timestamps as SQLite stores them.
static DATE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}(-\d{2}([ T]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?)?$")
        .unwrap()
});

/// Whether `text` looks like a date, a year-month, or a timestamp.
///
/// # Example
///
/// ```
/// use asksql::result::is_date_like;
///
/// assert!(is_date_like("2024-03"));
/// assert!(is_date_like("2024-03-18 00:00:00"));
/// assert!(!is_date_like("Widget A"));
/// ```
pub fn is_date_like(text: &str) -> bool {
    DATE_LIKE.is_match(text.trim())
}

/// Infer a column type from the values it holds.
///
/// Nulls are ignored. Integers alone give `Integer`; any float among numbers
/// gives `Float`; text that is entirely date-like gives `DateTime`. Mixed
/// storage classes fall back to `Text`, and an all-null column is `Unknown`.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let mut seen_int = false;
    let mut seen_float = false;
    let mut seen_bool = false;
    let mut seen_text = false;
    let mut all_text_date_like = true;

    for value in values {
        match value {
            Value::Null => {}
            Value::Integer(_) => seen_int = true,
            Value::Float(_) => seen_float = true,
            Value::Boolean(_) => seen_bool = true,
            Value::Text(s) => {
                seen_text = true;
                if !is_date_like(s) {
                    all_text_date_like = false;
                }
            }
        }
    }

    match (seen_text, seen_int || seen_float, seen_bool) {
        (false, false, false) => ColumnType::Unknown,
        (true, false, false) if all_text_date_like => ColumnType::DateTime,
        (true, _, _) => ColumnType::Text,
        (false, true, false) if seen_float => ColumnType::Float,
        (false, true, false) => ColumnType::Integer,
        (false, false, true) => ColumnType::Boolean,
        (false, true, true) => ColumnType::Text,
    }
}
