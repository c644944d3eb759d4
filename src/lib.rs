pub mod cli;
pub mod column_profile;
pub mod context;
pub mod dataset;
pub mod document;
pub mod error;
pub mod export;
pub mod inference;
pub mod io_utils;
pub mod quality;
pub mod relationships;
pub mod source;
pub mod table;
pub mod table_profile;
pub mod value;
pub mod visualization;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ExportFormat, SourceArgs},
    context::ContextOverlay,
    document::MetadataDocument,
    source::SourceOptions,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_sense", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Columns(args) => handle_columns(&args.source),
        Commands::Relationships(args) => handle_relationships(&args.source),
        Commands::ContextTemplate(args) => handle_context_template(&args),
    }
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let document = obtain_document(&args.source)?;
    export::write_json(&document, args.output.as_deref(), args.pretty)
        .with_context(|| format!("Writing metadata for {:?}", args.source.input))
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let document = obtain_document(&args.source)?;
    match args.format {
        ExportFormat::Json => export::write_json(&document, args.output.as_deref(), args.pretty),
        ExportFormat::Csv => {
            let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
            let delimiter = args.output_delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
            debug!(
                "Exporting columns as CSV with delimiter '{}' and encoding {}",
                printable_delimiter(delimiter),
                encoding.name()
            );
            export::write_columns_csv(&document, args.output.as_deref(), delimiter, encoding)
        }
    }
}

fn handle_columns(args: &SourceArgs) -> Result<()> {
    let document = obtain_document(args)?;
    let headers = [
        "table", "column", "type", "nullable", "null %", "unique %", "quality", "score",
    ]
    .map(String::from);
    let rows = document
        .columns_info
        .iter()
        .map(|c| {
            vec![
                c.table_name.clone(),
                c.column_name.clone(),
                c.data_type.to_string(),
                c.is_nullable.to_string(),
                c.null_percentage.to_string(),
                c.unique_percentage.to_string(),
                c.quality_level.to_string(),
                c.quality_score.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    println!(
        "Overall quality score: {} across {} column(s)",
        document.summary.overall_quality_score, document.summary.total_columns
    );
    Ok(())
}

fn handle_relationships(args: &SourceArgs) -> Result<()> {
    let document = obtain_document(args)?;
    if document.relationships.is_empty() {
        println!("No relationships detected.");
        return Ok(());
    }
    let headers = ["from", "to", "type", "strength", "similarity"].map(String::from);
    let rows = document
        .relationships
        .iter()
        .map(|r| {
            vec![
                r.from.to_string(),
                r.to.to_string(),
                r.relationship_type.to_string(),
                r.strength.to_string(),
                r.similarity.map(|s| s.to_string()).unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_context_template(args: &cli::ContextTemplateArgs) -> Result<()> {
    let document = obtain_document(&args.source)?;
    let overlay = ContextOverlay::template(&document);
    overlay
        .save(&args.output)
        .with_context(|| format!("Writing context template to {:?}", args.output))?;
    info!(
        "Context template for {} column(s) written to {:?}",
        overlay.columns.len(),
        args.output
    );
    Ok(())
}

/// Profiles the input, or loads it when it is already a metadata document,
/// then layers on the business-context overlay if one was given.
fn obtain_document(args: &SourceArgs) -> Result<MetadataDocument> {
    let document = if is_metadata_document(&args.input) {
        info!("Loading metadata document {:?}", args.input);
        MetadataDocument::load(&args.input)?
    } else {
        let options = SourceOptions {
            delimiter: args.delimiter,
            encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
            sheets: args.sheets.clone(),
        };
        if let Some(delimiter) = options.delimiter {
            debug!("Using delimiter '{}'", printable_delimiter(delimiter));
        }
        let (source, tables) = source::load(&args.input, &options)
            .with_context(|| format!("Reading {:?}", args.input))?;
        document::extract(&source, &tables)
            .with_context(|| format!("Profiling {:?}", args.input))?
    };
    match &args.context {
        Some(path) => {
            let overlay = ContextOverlay::load(path)?;
            Ok(overlay.apply(&document))
        }
        None => Ok(document),
    }
}

fn is_metadata_document(path: &Path) -> bool {
    io_utils::extension_of(path).as_deref() == Some("json")
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
