use std::{collections::BTreeMap, sync::Arc};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    column_profile::{ColumnProfile, NumericStats},
    quality::{self, QualityLevel},
};

pub const NULL_COUNTS_TITLE: &str = "Null Counts by Column";
pub const QUALITY_DISTRIBUTION_TITLE: &str = "Quality Distribution";
pub const NUMERIC_STATISTICS_TITLE: &str = "Numeric Statistics";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChartType {
    #[serde(rename = "bar_chart")]
    Bar,
    #[serde(rename = "pie_chart")]
    Pie,
    #[serde(rename = "heatmap")]
    Heatmap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChartData {
    Bar {
        columns: Vec<String>,
        null_counts: Vec<usize>,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<usize>,
    },
    Heatmap {
        columns: Vec<String>,
        statistics: BTreeMap<String, NumericStats>,
    },
}

/// Chart-ready data; rendering is left to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visualization {
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: ChartData,
}

/// Builds the null-count bar, quality pie and numeric heatmap series.
///
/// Column labels are bare column names for single-table documents and
/// `table.column` otherwise, so same-named columns from different sheets
/// stay distinct.
pub fn aggregate(columns: &[Arc<ColumnProfile>]) -> Vec<Visualization> {
    let qualify = columns.iter().map(|c| c.table_name.as_str()).unique().count() > 1;

    let mut charts = vec![Visualization {
        title: NULL_COUNTS_TITLE.to_string(),
        chart_type: ChartType::Bar,
        data: ChartData::Bar {
            columns: columns.iter().map(|c| label(c, qualify)).collect(),
            null_counts: columns.iter().map(|c| c.null_count).collect(),
        },
    }];

    if !columns.is_empty() {
        let counts = quality::level_counts(columns.iter().map(|c| c.quality_level));
        charts.push(Visualization {
            title: QUALITY_DISTRIBUTION_TITLE.to_string(),
            chart_type: ChartType::Pie,
            data: ChartData::Pie {
                labels: QualityLevel::ALL.iter().map(|l| l.to_string()).collect(),
                values: counts.iter().map(|(_, count)| *count).collect(),
            },
        });
    }

    let numeric = columns
        .iter()
        .filter_map(|c| c.numeric_stats.map(|stats| (label(c, qualify), stats)))
        .collect::<Vec<_>>();
    if !numeric.is_empty() {
        charts.push(Visualization {
            title: NUMERIC_STATISTICS_TITLE.to_string(),
            chart_type: ChartType::Heatmap,
            data: ChartData::Heatmap {
                columns: numeric.iter().map(|(name, _)| name.clone()).collect(),
                statistics: numeric.into_iter().collect(),
            },
        });
    }

    charts
}

fn label(column: &ColumnProfile, qualify: bool) -> String {
    if qualify {
        column.qualified_name()
    } else {
        column.column_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::RawTable, table_profile::profile_table};

    fn columns_of(tables: &[RawTable]) -> Vec<Arc<ColumnProfile>> {
        tables
            .iter()
            .flat_map(|t| profile_table(t).columns)
            .collect()
    }

    #[test]
    fn single_table_uses_bare_labels() {
        let table = RawTable::new("Employees")
            .with_column("id", vec![1i64, 2, 3])
            .with_column("name", vec![Some("a"), None, Some("c")]);
        let charts = aggregate(&columns_of(&[table]));
        assert_eq!(charts.len(), 3);
        assert_eq!(charts[0].chart_type, ChartType::Bar);
        assert_eq!(
            charts[0].data,
            ChartData::Bar {
                columns: vec!["id".to_string(), "name".to_string()],
                null_counts: vec![0, 1],
            }
        );
        match &charts[1].data {
            ChartData::Pie { labels, values } => {
                assert_eq!(labels, &["HIGH", "MEDIUM", "LOW"]);
                assert_eq!(values.iter().sum::<usize>(), 2);
            }
            other => panic!("expected pie data, got {other:?}"),
        }
        match &charts[2].data {
            ChartData::Heatmap {
                columns,
                statistics,
            } => {
                assert_eq!(columns, &["id"]);
                assert_eq!(statistics["id"].max, 3.0);
            }
            other => panic!("expected heatmap data, got {other:?}"),
        }
    }

    #[test]
    fn heatmap_is_omitted_without_numeric_columns() {
        let table = RawTable::new("Notes").with_column("text", vec!["a", "b"]);
        let charts = aggregate(&columns_of(&[table]));
        assert_eq!(charts.len(), 2);
        assert!(charts.iter().all(|c| c.chart_type != ChartType::Heatmap));
    }

    #[test]
    fn pie_is_omitted_without_columns() {
        let charts = aggregate(&[]);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].chart_type, ChartType::Bar);
    }

    #[test]
    fn multi_table_labels_are_qualified() {
        let tables = vec![
            RawTable::new("A").with_column("id", vec![1i64]),
            RawTable::new("B").with_column("id", vec![2i64]),
        ];
        let charts = aggregate(&columns_of(&tables));
        match &charts[2].data {
            ChartData::Heatmap { columns, statistics } => {
                assert_eq!(columns, &["A.id", "B.id"]);
                assert_eq!(statistics.len(), 2);
            }
            other => panic!("expected heatmap data, got {other:?}"),
        }
    }

    #[test]
    fn chart_types_serialize_with_chart_suffix() {
        let json = serde_json::to_value(ChartType::Bar).unwrap();
        assert_eq!(json, "bar_chart");
        let json = serde_json::to_value(ChartType::Heatmap).unwrap();
        assert_eq!(json, "heatmap");
    }
}
