use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;

use crate::{
    column_profile::{ColumnProfile, NumericStats},
    document::MetadataDocument,
    io_utils,
};

pub const CSV_HEADERS: &[&str] = &[
    "table_name",
    "column_name",
    "ordinal_position",
    "data_type",
    "is_nullable",
    "total_count",
    "null_count",
    "null_percentage",
    "unique_count",
    "unique_percentage",
    "quality_level",
    "quality_score",
    "min",
    "max",
    "mean",
    "std",
    "description",
    "tags",
    "owner",
];

/// Writes the whole document as JSON to `path`, or stdout.
pub fn write_json(document: &MetadataDocument, path: Option<&Path>, pretty: bool) -> Result<()> {
    let mut json = document.to_json_string(pretty)?;
    json.push('\n');
    let mut output = io_utils::open_output(path)?;
    output
        .write_all(json.as_bytes())
        .context("Writing metadata document")?;
    output.flush().context("Flushing metadata document")?;
    info!(
        "Wrote metadata document for '{}'",
        document.database_info.database_name
    );
    Ok(())
}

/// Writes one row per profiled column.
pub fn write_columns_csv(
    document: &MetadataDocument,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter, encoding)?;
    writer
        .write_record(CSV_HEADERS)
        .context("Writing column export header")?;
    for column in &document.columns_info {
        writer
            .write_record(column_record(column))
            .with_context(|| format!("Writing export row for {}", column.qualified_name()))?;
    }
    writer.flush().context("Flushing column export")?;
    info!("Exported {} column profile(s)", document.columns_info.len());
    Ok(())
}

/// Flattens a profile into the export column order.
pub fn column_record(column: &ColumnProfile) -> Vec<String> {
    let stat = |pick: fn(&NumericStats) -> f64| {
        column
            .numeric_stats
            .as_ref()
            .map(|stats| pick(stats).to_string())
            .unwrap_or_default()
    };
    vec![
        column.table_name.clone(),
        column.column_name.clone(),
        column.ordinal_position.to_string(),
        column.data_type.to_string(),
        column.is_nullable.to_string(),
        column.total_count.to_string(),
        column.null_count.to_string(),
        column.null_percentage.to_string(),
        column.unique_count.to_string(),
        column.unique_percentage.to_string(),
        column.quality_level.to_string(),
        column.quality_score.to_string(),
        stat(|s| s.min),
        stat(|s| s.max),
        stat(|s| s.mean),
        stat(|s| s.std),
        column.description.clone().unwrap_or_default(),
        column.tags.iter().cloned().collect::<Vec<_>>().join(";"),
        column.owner.clone().unwrap_or_default(),
    ]
}
