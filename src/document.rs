//! The metadata document and the assembler that builds it.
//!
//! [`extract`] is the engine's entry point: it profiles every column of every
//! table, aggregates per-table summaries, detects cross-table relationships
//! once over the flattened column list and finally derives chart data from the
//! finished document. It is a pure function of its inputs.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path, sync::Arc};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    column_profile::ColumnProfile,
    dataset::{RawTable, SourceInfo},
    error::ExtractError,
    quality::{self, QualityLevel},
    relationships::{self, Relationship},
    table_profile::{self, TableProfile},
    visualization::{self, Visualization},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseInfo {
    pub database_name: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_type: String,
    /// Sheets in the source file. A `--sheet` selection does not lower it;
    /// `tables_info` lists only the tables that were profiled.
    pub sheet_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub total_tables: usize,
    pub total_columns: usize,
    pub total_rows: usize,
    pub overall_quality_score: u32,
    pub quality_counts: BTreeMap<QualityLevel, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataDocument {
    pub database_info: DatabaseInfo,
    pub tables_info: Vec<TableProfile>,
    pub columns_info: Vec<Arc<ColumnProfile>>,
    pub relationships: Vec<Relationship>,
    pub visualizations: Vec<Visualization>,
    pub summary: DocumentSummary,
}

/// Profiles `tables` and assembles the complete metadata document.
///
/// Fails with [`ExtractError::EmptyInput`] when there are no tables or any
/// table has no columns; no partial document is produced in that case.
pub fn extract(source: &SourceInfo, tables: &[RawTable]) -> Result<MetadataDocument, ExtractError> {
    if tables.is_empty() {
        return Err(ExtractError::empty_input("no tables were supplied"));
    }
    if let Some(table) = tables.iter().find(|t| t.columns.is_empty()) {
        return Err(ExtractError::empty_input(format!(
            "table '{}' has no columns",
            table.name
        )));
    }

    let tables_info = tables
        .iter()
        .map(table_profile::profile_table)
        .collect::<Vec<_>>();
    let columns_info = tables_info
        .iter()
        .flat_map(|t| t.columns.iter().cloned())
        .collect::<Vec<_>>();

    let relationships = relationships::detect_relationships(&columns_info);
    let visualizations = visualization::aggregate(&columns_info);
    let summary = summarize(&tables_info, &columns_info);

    info!(
        "Extracted metadata for '{}': {} table(s), {} column(s), {} relationship(s), quality score {}",
        source.database_name,
        tables_info.len(),
        columns_info.len(),
        relationships.len(),
        summary.overall_quality_score
    );

    Ok(MetadataDocument {
        database_info: DatabaseInfo {
            database_name: source.database_name.clone(),
            file_size: source.file_size,
            file_type: source.file_type.clone(),
            sheet_count: source.sheet_count.unwrap_or(tables.len()),
            modified_date: source.modified,
        },
        tables_info,
        columns_info,
        relationships,
        visualizations,
        summary,
    })
}

fn summarize(tables: &[TableProfile], columns: &[Arc<ColumnProfile>]) -> DocumentSummary {
    let levels = columns.iter().map(|c| c.quality_level);
    DocumentSummary {
        total_tables: tables.len(),
        total_columns: columns.len(),
        total_rows: tables.iter().map(|t| t.row_count).sum(),
        overall_quality_score: quality::overall_score(levels.clone()),
        quality_counts: quality::level_counts(levels).into_iter().collect(),
    }
}

impl MetadataDocument {
    pub fn column(&self, table_name: &str, column_name: &str) -> Option<&Arc<ColumnProfile>> {
        self.columns_info
            .iter()
            .find(|c| c.table_name == table_name && c.column_name == column_name)
    }

    pub fn table(&self, table_name: &str) -> Option<&TableProfile> {
        self.tables_info.iter().find(|t| t.table_name == table_name)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.context("Serializing metadata document")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut document: MetadataDocument =
            serde_json::from_str(json).context("Parsing metadata document JSON")?;
        document.relink_tables();
        Ok(document)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening metadata document {path:?}"))?;
        let mut document: MetadataDocument = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing metadata document {path:?}"))?;
        document.relink_tables();
        Ok(document)
    }

    /// Points every table at the shared column profiles that belong to it.
    pub fn relink_tables(&mut self) {
        for table in &mut self.tables_info {
            table.columns = self
                .columns_info
                .iter()
                .filter(|c| c.table_name == table.table_name)
                .cloned()
                .collect();
        }
    }
}
