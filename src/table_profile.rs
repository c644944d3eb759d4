use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    column_profile::{self, ColumnProfile},
    dataset::RawTable,
    quality,
};

/// Row and column counts for one sheet, plus the profiles of its columns.
///
/// The column profiles are shared with the document's flattened column list,
/// so they are not serialized here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableProfile {
    pub table_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub completeness: f64,
    pub quality_score: u32,
    #[serde(skip)]
    pub columns: Vec<Arc<ColumnProfile>>,
}

impl TableProfile {
    /// Aggregates already-built column profiles; nothing is recomputed per column.
    pub fn from_columns(table: &RawTable, columns: Vec<Arc<ColumnProfile>>) -> Self {
        let row_count = table.row_count();
        let cells = row_count * columns.len();
        let nulls = columns.iter().map(|c| c.null_count).sum::<usize>();
        Self {
            table_name: table.name.clone(),
            row_count,
            column_count: table.column_count(),
            completeness: column_profile::percentage(cells.saturating_sub(nulls), cells),
            quality_score: quality::overall_score(columns.iter().map(|c| c.quality_level)),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Arc<ColumnProfile>> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

/// Profiles every column of `table` in order and wraps them in a [`TableProfile`].
pub fn profile_table(table: &RawTable) -> TableProfile {
    let total_rows = table.row_count();
    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| Arc::new(column_profile::profile_column(column, idx + 1, total_rows)))
        .collect();
    TableProfile::from_columns(table, columns)
}
