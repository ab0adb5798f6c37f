//! Plain-language result summaries.
//!
//! A [`Summary`] is computed from the result's shape alone: row count,
//! per-column numeric statistics, and the labels of the rows that hold the
//! extremes of the first numeric column. No second model call is made, and
//! the statistics travel with the text so the two can be checked against
//! each other.

use std::collections::HashSet;

use serde::Serialize;

use crate::result::{ResultSet, Value};
use crate::schema::ColumnType;

/// Statistics over the non-null numeric values of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub column_type: ColumnType,
    /// Number of non-null numeric values.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
}

/// A labelled row holding an extreme value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extreme {
    pub label: String,
    pub value: f64,
}

/// Everything a summary sentence is derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub row_count: usize,
    /// One entry per numeric column holding at least one value.
    pub numeric: Vec<ColumnStats>,
    /// Name of the categorical column used for labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
    /// Row with the largest value of the first numeric column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest: Option<Extreme>,
    /// Row with the smallest value of the first numeric column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest: Option<Extreme>,
    /// Distinct non-null labels in the label column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_labels: Option<usize>,
}

/// Summary text plus the statistics behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    pub stats: SummaryStats,
}

/// Summarize a result set. Never fails; empty input gives "0 rows returned".
pub fn summarize(result: &ResultSet) -> Summary {
    let stats = compute_stats(result);
    let text = render(&stats);
    Summary { text, stats }
}

fn compute_stats(result: &ResultSet) -> SummaryStats {
    let numeric: Vec<ColumnStats> = result
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.column_type.is_numeric())
        .filter_map(|(i, c)| column_stats(result, i, &c.name, c.column_type))
        .collect();

    let label_index = result.first_column_where(ColumnType::is_categorical);
    let label_column = label_index.map(|i| result.columns()[i].name.clone());
    let distinct_labels = label_index.map(|i| {
        result
            .column_values(i)
            .filter_map(Value::label)
            .collect::<HashSet<_>>()
            .len()
    });

    let (highest, lowest) = match (label_index, numeric.first()) {
        (Some(label), Some(first)) => {
            let value_index = result.column_index(&first.column);
            match value_index {
                Some(value) => extremes(result, label, value),
                None => (None, None),
            }
        }
        _ => (None, None),
    };

    SummaryStats {
        row_count: result.row_count(),
        numeric,
        label_column,
        highest,
        lowest,
        distinct_labels,
    }
}

fn column_stats(
    result: &ResultSet,
    index: usize,
    name: &str,
    column_type: ColumnType,
) -> Option<ColumnStats> {
    let values: Vec<f64> = result.column_values(index).filter_map(Value::as_f64).collect();
    if values.is_empty() {
        return None;
    }

    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(ColumnStats {
        column: name.to_string(),
        column_type,
        count: values.len(),
        min,
        max,
        mean: sum / values.len() as f64,
        sum,
    })
}

/// First labelled rows holding the max and the min of `value`.
fn extremes(result: &ResultSet, label: usize, value: usize) -> (Option<Extreme>, Option<Extreme>) {
    let mut highest: Option<Extreme> = None;
    let mut lowest: Option<Extreme> = None;

    for row in result.rows() {
        let (Some(name), Some(v)) = (row[label].label(), row[value].as_f64()) else {
            continue;
        };
        if highest.as_ref().map_or(true, |h| v > h.value) {
            highest = Some(Extreme {
                label: name.clone(),
                value: v,
            });
        }
        if lowest.as_ref().map_or(true, |l| v < l.value) {
            lowest = Some(Extreme { label: name, value: v });
        }
    }
    (highest, lowest)
}

fn render(stats: &SummaryStats) -> String {
    let n = stats.row_count;
    let rows = if n == 1 {
        "1 row returned".to_string()
    } else {
        format!("{} rows returned", n)
    };

    let Some(first) = stats.numeric.first() else {
        return rows;
    };
    let decimals = decimals_for(first.column_type);

    if n == 1 && stats.label_column.is_none() && stats.numeric.len() == 1 {
        return format!(
            "{}. The computed value of {} is {}.",
            rows,
            first.column,
            format_number(first.sum, decimals)
        );
    }

    let mut parts = vec![format!("{}.", rows)];
    match (&stats.highest, &stats.lowest) {
        (Some(high), Some(low)) => {
            parts.push(format!(
                "The highest {} is for {} with {}.",
                first.column,
                high.label,
                format_number(high.value, decimals)
            ));
            if high.label != low.label {
                parts.push(format!(
                    "The lowest is for {} with {}.",
                    low.label,
                    format_number(low.value, decimals)
                ));
            }
            if let (Some(distinct), Some(column)) = (stats.distinct_labels, &stats.label_column) {
                if n > 2 {
                    parts.push(format!(
                        "There are {} distinct {} values in total.",
                        distinct, column
                    ));
                }
            }
        }
        _ => {
            parts.push(format!(
                "The total {} is {}, ranging from {} to {} with a mean of {}.",
                first.column,
                format_number(first.sum, decimals),
                format_number(first.min, decimals),
                format_number(first.max, decimals),
                format_number(first.mean, 2)
            ));
        }
    }
    parts.join(" ")
}

fn decimals_for(column_type: ColumnType) -> usize {
    match column_type {
        ColumnType::Integer => 0,
        _ => 2,
    }
}

/// Format with thousands separators and a fixed number of decimals.
///
/// # Example
///
/// ```
/// use asksql::summary::format_number;
///
/// assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
/// assert_eq!(format_number(-950.0, 0), "-950");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // Rounding can turn a tiny negative into zero; no "-0".
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
