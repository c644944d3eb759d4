//! Readers that turn CSV files and spreadsheet workbooks into raw tables.
//!
//! A delimited text file becomes a single table named after the file stem.
//! A workbook becomes one table per sheet, in workbook order. In both cases
//! the first row is the header row.

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    dataset::{RawTable, SourceInfo},
    error::ExtractError,
    io_utils,
    value::Value,
};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Delimited,
    Workbook,
}

impl SourceKind {
    pub fn detect(path: &Path) -> Self {
        match io_utils::extension_of(path) {
            Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) => SourceKind::Workbook,
            _ => SourceKind::Delimited,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Workbook sheets to load; empty loads every sheet.
    pub sheets: Vec<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: encoding_rs::UTF_8,
            sheets: Vec::new(),
        }
    }
}

/// Reads `path` into raw tables along with the file-level facts about it.
pub fn load(path: &Path, options: &SourceOptions) -> Result<(SourceInfo, Vec<RawTable>)> {
    let mut source = source_info(path)?;
    let tables = match SourceKind::detect(path) {
        SourceKind::Delimited => vec![read_delimited(path, &source.database_name, options)?],
        SourceKind::Workbook => {
            let (sheet_count, tables) = read_workbook(path, options)?;
            source.sheet_count = Some(sheet_count);
            tables
        }
    };
    info!(
        "Loaded {} table(s) from {path:?} ({} bytes)",
        tables.len(),
        source.file_size
    );
    Ok((source, tables))
}

pub fn source_info(path: &Path) -> Result<SourceInfo> {
    let database_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("stdin")
        .to_string();
    let file_type = io_utils::extension_of(path).unwrap_or_default();
    if io_utils::is_dash(path) {
        return Ok(SourceInfo {
            database_name,
            file_type,
            ..SourceInfo::default()
        });
    }
    let metadata = fs::metadata(path).with_context(|| format!("Inspecting input file {path:?}"))?;
    Ok(SourceInfo {
        database_name,
        file_size: metadata.len(),
        file_type,
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        sheet_count: None,
    })
}

fn read_delimited(path: &Path, table_name: &str, options: &SourceOptions) -> Result<RawTable> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = normalize_headers(io_utils::reader_headers(&mut reader, options.encoding)?);

    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {path:?}", idx + 2))?;
        let cells = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", idx + 2))?;
        rows.push(cells.iter().map(|cell| Value::from_text(cell)).collect());
    }
    debug!("Read {} row(s) from {path:?}", rows.len());
    Ok(RawTable::from_rows(table_name, &headers, rows))
}

/// Reads the selected sheets, returning them with the workbook's total sheet count.
fn read_workbook(path: &Path, options: &SourceOptions) -> Result<(usize, Vec<RawTable>)> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_names = workbook.sheet_names().to_vec();
    for wanted in &options.sheets {
        if !sheet_names.contains(wanted) {
            return Err(anyhow!("Sheet '{wanted}' not found in {path:?}"));
        }
    }

    let sheet_count = sheet_names.len();
    let mut tables = Vec::new();
    for name in sheet_names {
        if !options.sheets.is_empty() && !options.sheets.contains(&name) {
            continue;
        }
        match workbook.worksheet_range(&name) {
            Ok(range) => {
                let rows = range.rows().map(|row| row.to_vec()).collect::<Vec<_>>();
                tables.push(sheet_to_table(&name, rows));
            }
            Err(err) => warn!("Skipping sheet '{name}': {err}"),
        }
    }
    Ok((sheet_count, tables))
}

/// Converts one sheet's cell grid into a table, header row first.
fn sheet_to_table(name: &str, rows: Vec<Vec<Data>>) -> RawTable {
    let mut rows = rows.into_iter();
    let headers = rows
        .next()
        .map(|header| header.iter().map(header_text).collect::<Vec<_>>())
        .unwrap_or_default();
    let headers = normalize_headers(headers);

    let data = rows
        .enumerate()
        .map(|(row_idx, row)| {
            row.iter()
                .enumerate()
                .map(|(col_idx, cell)| {
                    cell_value(cell).unwrap_or_else(|detail| {
                        let column = headers
                            .get(col_idx)
                            .cloned()
                            .unwrap_or_else(|| format!("column_{}", col_idx + 1));
                        let err = ExtractError::UnsupportedValue {
                            table: name.to_string(),
                            column,
                            row: row_idx + 1,
                            detail,
                        };
                        warn!("{err}; treating as null");
                        Value::Null
                    })
                })
                .collect()
        })
        .collect();
    RawTable::from_rows(name, &headers, data)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        other => cell_value(other)
            .map(|value| value.as_display())
            .unwrap_or_default(),
    }
}

/// Maps a typed workbook cell to a raw value; error cells report their code.
pub fn cell_value(cell: &Data) -> Result<Value, String> {
    Ok(match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::from_text(s),
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(parsed) => Value::DateTime(parsed),
            None => return Err(format!("unreadable date value {dt}")),
        },
        Data::DateTimeIso(s) => match Value::Text(s.clone()).as_datetime() {
            Some(parsed) => Value::DateTime(parsed),
            None => Value::from_text(s),
        },
        Data::DurationIso(s) => Value::from_text(s),
        Data::Error(code) => return Err(format!("cell error {code}")),
    })
}

/// Names blank headers `column_N` and suffixes repeats with `.1`, `.2`, ...
pub fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = match header.trim() {
                "" => format!("column_{}", idx + 1),
                trimmed => trimmed.to_string(),
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}.{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}
