use std::{
    borrow::Cow,
    collections::{BTreeSet, HashSet},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::RawColumn,
    error::ExtractError,
    inference::{self, DataType},
    quality::QualityLevel,
    value::Value,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct TextStats {
    pub min_length: usize,
    pub max_length: usize,
    pub avg_length: f64,
}

/// Per-column statistics, inferred type and quality grade.
///
/// `description`, `tags` and `owner` are never filled by profiling; they are
/// layered on afterwards by [`crate::context::ContextOverlay`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnProfile {
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: usize,
    pub data_type: DataType,
    pub is_nullable: bool,
    pub total_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub unique_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_stats: Option<NumericStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_stats: Option<TextStats>,
    pub quality_level: QualityLevel,
    pub quality_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ColumnProfile {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table_name, self.column_name)
    }

    pub fn has_business_context(&self) -> bool {
        self.description.is_some() || self.owner.is_some() || !self.tags.is_empty()
    }
}

/// Infers the column type, then profiles and grades the column.
///
/// `total_rows` is the table's row count; columns shorter than the table are
/// treated as padded with nulls.
pub fn profile_column(column: &RawColumn, ordinal_position: usize, total_rows: usize) -> ColumnProfile {
    let data_type = inference::infer_data_type(&column.values);
    profile_column_as(column, ordinal_position, total_rows, data_type)
}

pub fn profile_column_as(
    column: &RawColumn,
    ordinal_position: usize,
    total_rows: usize,
    data_type: DataType,
) -> ColumnProfile {
    let total_rows = total_rows.max(column.len());
    let padding = total_rows - column.len();
    let null_count = column.values.iter().filter(|v| v.is_null()).count() + padding;
    let unique_count = column
        .values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| distinct_key(v, data_type))
        .collect::<HashSet<Cow<'_, Value>>>()
        .len();

    let null_ratio = ratio_percent(null_count, total_rows);
    let unique_ratio = ratio_percent(unique_count, total_rows);
    let null_percentage = round_to(null_ratio, 1);
    let unique_percentage = round_to(unique_ratio, 2);

    let numeric_stats = data_type
        .is_numeric()
        .then(|| numeric_stats(column));
    let text_stats = (data_type == DataType::Text).then(|| text_stats(&column.values));

    let quality_level = QualityLevel::classify(null_ratio, unique_ratio);
    debug!(
        "Profiled '{}.{}' as {} ({} null, {} unique, quality {})",
        column.table_name, column.name, data_type, null_count, unique_count, quality_level
    );

    ColumnProfile {
        table_name: column.table_name.clone(),
        column_name: column.name.clone(),
        ordinal_position,
        data_type,
        is_nullable: inference::is_nullable(&column.values, total_rows),
        total_count: total_rows,
        null_count,
        null_percentage,
        unique_count,
        unique_percentage,
        numeric_stats,
        text_stats,
        quality_level,
        quality_score: quality_level.score(),
        description: None,
        tags: BTreeSet::new(),
        owner: None,
    }
}

/// `part / whole * 100` rounded to one decimal place; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    round_to(ratio_percent(part, whole), 1)
}

/// Unrounded `part / whole * 100`; quality grading works on this value.
pub fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Numeric columns compare cells by number, so `1` and `1.0` count once.
fn distinct_key(value: &Value, data_type: DataType) -> Cow<'_, Value> {
    let numeric = match data_type {
        DataType::Integer => value.as_integer().map(Value::Integer),
        DataType::Float => value.as_float().map(Value::Float),
        _ => None,
    };
    numeric.map_or(Cow::Borrowed(value), Cow::Owned)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn numeric_stats(column: &RawColumn) -> NumericStats {
    let mut skipped = 0usize;
    let numbers = column
        .values
        .iter()
        .filter(|v| !v.is_null())
        .filter_map(|v| {
            let parsed = v.as_float();
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect::<Vec<f64>>();
    if skipped > 0 {
        let degraded = ExtractError::Computation {
            table: column.table_name.clone(),
            column: column.name.clone(),
            skipped,
        };
        warn!("{degraded}");
    }
    summarize(&numbers)
}

/// Min, max, mean and sample standard deviation; all zero for an empty slice.
///
/// Values near the limits of `f64` are rescaled by the largest magnitude so
/// the mean and deviation stay finite.
pub fn summarize(numbers: &[f64]) -> NumericStats {
    if numbers.is_empty() {
        return NumericStats::default();
    }
    let (min, max) = numbers
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &n| {
            (min.min(n), max.max(n))
        });
    let (mut mean, mut std) = moments(numbers, 1.0);
    if !(mean.is_finite() && std.is_finite()) {
        let scale = min.abs().max(max.abs());
        let (scaled_mean, scaled_std) = moments(numbers, scale);
        mean = scaled_mean * scale;
        std = scaled_std * scale;
    }
    NumericStats {
        min,
        max,
        mean,
        std,
    }
}

fn moments(numbers: &[f64], scale: f64) -> (f64, f64) {
    let count = numbers.len() as f64;
    let mean = numbers.iter().map(|n| n / scale).sum::<f64>() / count;
    if numbers.len() < 2 {
        return (mean, 0.0);
    }
    let squared = numbers
        .iter()
        .map(|n| (n / scale - mean).powi(2))
        .sum::<f64>();
    (mean, (squared / (count - 1.0)).sqrt())
}

fn text_stats(values: &[Value]) -> TextStats {
    let lengths = values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| v.as_display().chars().count())
        .collect::<Vec<_>>();
    if lengths.is_empty() {
        return TextStats::default();
    }
    let total = lengths.iter().sum::<usize>();
    TextStats {
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
        avg_length: round_to(total as f64 / lengths.len() as f64, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: Vec<Value>) -> RawColumn {
        RawColumn::new("Employees", name, values)
    }

    #[test]
    fn email_column_counts_nulls_and_distinct_values() {
        let col = column(
            "email",
            vec![
                Value::from("a@x.com"),
                Value::from("b@x.com"),
                Value::Null,
                Value::from("a@x.com"),
            ],
        );
        let profile = profile_column(&col, 1, 4);
        assert_eq!(profile.data_type, DataType::Text);
        assert!(profile.is_nullable);
        assert_eq!(profile.null_count, 1);
        assert_eq!(profile.null_percentage, 25.0);
        assert_eq!(profile.unique_count, 2);
        assert_eq!(profile.unique_percentage, 50.0);
        assert_eq!(profile.quality_level, QualityLevel::Medium);
        assert!(profile.numeric_stats.is_none());
        let text = profile.text_stats.expect("text stats");
        assert_eq!(text.min_length, 7);
        assert_eq!(text.max_length, 7);
    }

    #[test]
    fn integer_stats_ignore_nulls() {
        let col = column(
            "salary",
            vec![
                Value::Integer(10),
                Value::Integer(20),
                Value::Integer(30),
                Value::Null,
            ],
        );
        let profile = profile_column(&col, 2, 4);
        assert_eq!(profile.data_type, DataType::Integer);
        let stats = profile.numeric_stats.expect("numeric stats");
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.mean, 20.0);
        assert!((stats.std - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_column_yields_zeroes() {
        let col = column("empty", Vec::new());
        let profile = profile_column(&col, 1, 0);
        assert_eq!(profile.null_percentage, 0.0);
        assert_eq!(profile.unique_percentage, 0.0);
        assert!(!profile.is_nullable);
        assert_eq!(profile.data_type, DataType::Text);

        let forced = profile_column_as(&col, 1, 0, DataType::Float);
        assert_eq!(forced.numeric_stats, Some(NumericStats::default()));
    }

    #[test]
    fn mixed_values_degrade_to_partial_stats() {
        let col = column(
            "amount",
            vec![Value::from("5"), Value::from("oops"), Value::from("15")],
        );
        let profile = profile_column_as(&col, 1, 3, DataType::Float);
        let stats = profile.numeric_stats.expect("numeric stats");
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 15.0);
        assert_eq!(stats.mean, 10.0);
    }

    #[test]
    fn short_columns_count_padding_as_null() {
        let col = column("late", vec![Value::Integer(1)]);
        let profile = profile_column(&col, 1, 4);
        assert_eq!(profile.total_count, 4);
        assert_eq!(profile.null_count, 3);
        assert_eq!(profile.null_percentage, 75.0);
        assert_eq!(profile.quality_level, QualityLevel::Low);
        assert!(profile.is_nullable);
        assert!(!profile_column(&col, 1, 1).is_nullable);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 0), 0.0);
        assert!(ratio_percent(124, 2500) < 5.0);
    }

    #[test]
    fn grading_uses_the_unrounded_unique_ratio() {
        let values = (0..2500).map(|i| Value::Integer(i % 124)).collect::<Vec<_>>();
        let profile = profile_column(&column("bucket", values), 1, 2500);
        assert_eq!(profile.unique_count, 124);
        assert_eq!(profile.unique_percentage, 4.96);
        assert_eq!(profile.quality_level, QualityLevel::Low);
        assert_eq!(profile.quality_score, 30);
    }

    #[test]
    fn unique_percentage_keeps_two_decimals() {
        let col = column("code", vec![Value::from("a"), Value::from("b"), Value::from("b")]);
        let profile = profile_column(&col, 1, 3);
        assert_eq!(profile.unique_percentage, 66.67);
    }

    #[test]
    fn integer_and_float_cells_of_one_number_count_once() {
        let col = column(
            "qty",
            vec![Value::Integer(1), Value::Float(1.0), Value::Integer(2)],
        );
        let profile = profile_column(&col, 1, 3);
        assert_eq!(profile.data_type, DataType::Integer);
        assert_eq!(profile.unique_count, 2);
    }

    #[test]
    fn huge_values_keep_finite_statistics() {
        let stats = summarize(&[1e308, 1.5e308]);
        assert_eq!(stats.min, 1e308);
        assert_eq!(stats.max, 1.5e308);
        assert!(stats.mean.is_finite() && stats.std.is_finite());
        assert!((stats.mean / 1.25e308 - 1.0).abs() < 1e-12);
        assert!((stats.std / (0.5e308 / 2f64.sqrt()) - 1.0).abs() < 1e-12);

        let negative = summarize(&[-1e308, 1e308]);
        assert_eq!(negative.mean, 0.0);
        assert!(negative.std.is_finite());
    }

    #[test]
    fn single_value_has_zero_deviation() {
        let stats = summarize(&[4.0]);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.mean, 4.0);
    }
}
