//! Business-context overlay for column profiles.
//!
//! Descriptions, tags and owners are maintained outside the engine in a YAML
//! file keyed by table and column name. Applying an overlay yields a new
//! document; the profiled document itself is never edited in place.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::document::MetadataDocument;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ColumnContext {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ColumnContext {
    fn is_blank(&self) -> bool {
        self.description.is_none() && self.owner.is_none() && self.tags.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContextOverlay {
    #[serde(default)]
    pub columns: Vec<ColumnContext>,
}

impl ContextOverlay {
    /// An overlay listing every column of `document` with empty fields.
    pub fn template(document: &MetadataDocument) -> Self {
        let columns = document
            .columns_info
            .iter()
            .map(|c| ColumnContext {
                table: c.table_name.clone(),
                column: c.column_name.clone(),
                description: c.description.clone(),
                tags: c.tags.clone(),
                owner: c.owner.clone(),
            })
            .collect();
        Self { columns }
    }

    /// Returns the entry for a column, creating an empty one when missing.
    pub fn entry(&mut self, table: &str, column: &str) -> &mut ColumnContext {
        let position = self
            .columns
            .iter()
            .position(|c| c.table == table && c.column == column);
        let idx = match position {
            Some(idx) => idx,
            None => {
                self.columns.push(ColumnContext {
                    table: table.to_string(),
                    column: column.to_string(),
                    ..ColumnContext::default()
                });
                self.columns.len() - 1
            }
        };
        &mut self.columns[idx]
    }

    /// Produces a copy of `document` carrying the overlay's business context.
    pub fn apply(&self, document: &MetadataDocument) -> MetadataDocument {
        let mut lookup = BTreeMap::new();
        for entry in self.columns.iter().filter(|c| !c.is_blank()) {
            lookup.insert((entry.table.clone(), entry.column.clone()), entry);
        }

        let mut annotated = document.clone();
        let mut applied = 0usize;
        for profile in annotated.columns_info.iter_mut() {
            let key = (profile.table_name.clone(), profile.column_name.clone());
            let Some(entry) = lookup.remove(&key) else {
                continue;
            };
            let mut updated = profile.as_ref().clone();
            if entry.description.is_some() {
                updated.description = entry.description.clone();
            }
            if !entry.tags.is_empty() {
                updated.tags = entry.tags.clone();
            }
            if entry.owner.is_some() {
                updated.owner = entry.owner.clone();
            }
            *profile = Arc::new(updated);
            applied += 1;
        }
        for (table, column) in lookup.keys() {
            warn!("Business context for '{table}.{column}' matches no profiled column");
        }
        annotated.relink_tables();
        info!("Applied business context to {applied} column(s)");
        annotated
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening context file {path:?}"))?;
        let overlay = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing context YAML {path:?}"))?;
        Ok(overlay)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating context file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing context YAML")
    }
}
