//! Result classification.
//!
//! [`classify`] looks only at column types and cardinality to choose a chart
//! shape. It never fails: a table-only display is an ordinary outcome.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::result::ResultSet;
use crate::schema::ColumnType;

/// Default ceiling on distinct categories in a bar chart.
pub const DEFAULT_MAX_CATEGORIES: usize = 50;

/// Tunables for chart selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPolicy {
    /// Largest number of distinct categories a bar chart may show.
    pub max_categories: usize,
}

impl Default for ChartPolicy {
    fn default() -> Self {
        Self {
            max_categories: DEFAULT_MAX_CATEGORIES,
        }
    }
}

/// The chart shape suited to a result set.
///
/// Column names refer to columns of the classified result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    None,
    TimeSeries { x: String, y: String },
    CategoricalBar { category: String, value: String },
}

impl ChartSpec {
    /// Variant name without column details.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartSpec::None => "none",
            ChartSpec::TimeSeries { .. } => "time_series",
            ChartSpec::CategoricalBar { .. } => "categorical_bar",
        }
    }
}

/// Decide how `result` should be charted.
///
/// Rules, first match wins:
/// 1. a date/time column, a numeric column and at least two rows give a
///    time series over the first of each;
/// 2. a categorical column whose distinct non-null values number between 2
///    and `policy.max_categories`, plus a numeric column, give a bar chart
///    over the first of each;
/// 3. anything else is [`ChartSpec::None`].
pub fn classify(result: &ResultSet, policy: &ChartPolicy) -> ChartSpec {
    let columns = result.columns();
    let Some(numeric) = result.first_column_where(ColumnType::is_numeric) else {
        return ChartSpec::None;
    };

    if let Some(time) = result.first_column_where(ColumnType::is_temporal) {
        if result.row_count() >= 2 {
            return ChartSpec::TimeSeries {
                x: columns[time].name.clone(),
                y: columns[numeric].name.clone(),
            };
        }
    }

    if let Some(category) = result.first_column_where(ColumnType::is_categorical) {
        let distinct = result
            .column_values(category)
            .filter_map(|v| v.label())
            .collect::<HashSet<_>>()
            .len();
        if (2..=policy.max_categories).contains(&distinct) {
            return ChartSpec::CategoricalBar {
                category: columns[category].name.clone(),
                value: columns[numeric].name.clone(),
            };
        }
    }

    ChartSpec::None
}
