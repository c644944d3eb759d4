use chrono::{DateTime, Utc};

use crate::value::Value;

/// One named column of raw cells, tagged with the table it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub table_name: String,
    pub values: Vec<Value>,
}

impl RawColumn {
    pub fn new(table_name: impl Into<String>, name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A sheet or CSV file after parsing, ready for profiling.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column; convenient for building tables by hand.
    pub fn with_column<V>(mut self, name: impl Into<String>, values: Vec<V>) -> Self
    where
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.columns
            .push(RawColumn::new(self.name.clone(), name, values));
        self
    }

    /// Builds a column-major table from a header row and row-major cells.
    ///
    /// Short rows are padded with nulls and cells beyond the header are dropped.
    pub fn from_rows(name: impl Into<String>, headers: &[String], rows: Vec<Vec<Value>>) -> Self {
        let name = name.into();
        let mut columns = headers
            .iter()
            .map(|header| RawColumn::new(name.clone(), header.clone(), Vec::with_capacity(rows.len())))
            .collect::<Vec<_>>();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(Value::Null));
            }
        }
        Self { name, columns }
    }

    /// Number of data rows; the longest column wins when lengths disagree.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(RawColumn::len).max().unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// File-level facts gathered by the reader before profiling starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceInfo {
    pub database_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub modified: Option<DateTime<Utc>>,
    /// Sheets in the source workbook, including any not selected for loading.
    pub sheet_count: Option<usize>,
}

impl SourceInfo {
    pub fn named(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Self::default()
        }
    }
}
