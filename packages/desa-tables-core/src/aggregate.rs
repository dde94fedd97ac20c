//! Chart aggregation over the rows of one schema.
//!
//! - Category column (bar, pie): count rows per distinct value, highest count
//!   first, ties kept in first-seen order.
//! - Number column grouped by a category column: sum per group, first-seen order.
//! - Number column without grouping on a schema with row totals: a single
//!   `(column label, sum)` point.
//! - Number column without grouping otherwise: one point per row in creation
//!   order, labelled by 1-based row position.
//!
//! Null values are skipped in every mode.

use serde::Serialize;
use serde_json::Value;

use crate::error::TableError;
use crate::row::Row;
use crate::schema::validation::resolve_chart;
use crate::schema::{ChartDefinition, ColumnType, TableSchema};

/// One `(label, value)` pair of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatePoint {
    pub label: String,
    pub value: f64,
}

impl AggregatePoint {
    fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A stored chart together with its computed points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub chart: ChartDefinition,
    pub points: Vec<AggregatePoint>,
}

/// Accumulates values per label while remembering first-seen order.
#[derive(Default)]
struct Buckets {
    points: Vec<AggregatePoint>,
}

impl Buckets {
    fn add(&mut self, label: &str, value: f64) {
        match self.points.iter_mut().find(|p| p.label == label) {
            Some(point) => point.value += value,
            None => self.points.push(AggregatePoint::new(label, value)),
        }
    }
}

/// Renders a grouping key as a label.
fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Computes the series for `chart` over `rows`.
///
/// `rows` must be the rows of `schema` in creation order.
///
/// # Errors
/// - `InvalidChartReference` if the chart names an absent column
/// - `InvalidAggregation` if the chart type cannot be computed over the column type
pub fn compute<'a>(
    schema: &TableSchema,
    chart: &ChartDefinition,
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<Vec<AggregatePoint>, TableError> {
    let (column, group) = resolve_chart(&schema.columns, chart)?;

    let points = match (column.column_type, group) {
        (ColumnType::Category, _) => {
            let mut buckets = Buckets::default();
            for row in rows {
                if let Some(label) = row.data.get(&column.key).and_then(label_of) {
                    buckets.add(&label, 1.0);
                }
            }
            let mut points = buckets.points;
            // stable sort keeps first-seen order among equal counts
            points.sort_by(|a, b| b.value.total_cmp(&a.value));
            points
        }
        (_, Some(group)) => {
            let mut buckets = Buckets::default();
            for row in rows {
                let label = row.data.get(&group.key).and_then(label_of);
                let value = row.data.get(&column.key).and_then(Value::as_f64);
                if let (Some(label), Some(value)) = (label, value) {
                    buckets.add(&label, value);
                }
            }
            buckets.points
        }
        (_, None) if schema.has_row_total => {
            let sum = rows
                .into_iter()
                .filter_map(|row| row.data.get(&column.key).and_then(Value::as_f64))
                .sum();
            vec![AggregatePoint::new(column.label.clone(), sum)]
        }
        (_, None) => rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| {
                row.data
                    .get(&column.key)
                    .and_then(Value::as_f64)
                    .map(|value| AggregatePoint::new((index + 1).to_string(), value))
            })
            .collect(),
    };

    Ok(points)
}
