//! Document-to-record extraction.
//!
//! [`extract_record`] runs the block classifier / key-value assembler and the
//! table extractor over the same page and merges their output into one
//! [`ExtractionRecord`].

pub mod blocks;
pub mod tables;

pub use blocks::{assemble_fields, classify, BlockRole};

use crate::document::{Page, TableSettings};
use crate::domain::{AddressTable, Degradation, ExtractionRecord};
use crate::error::{RedactorError, RedactorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Tunables for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Blocks whose bottom edge reaches this y coordinate (page units from
    /// the top) are outside the key/value section.
    pub header_cutoff: f32,
    /// Form title, never treated as a label.
    pub title: String,
    pub tables: TableSettings,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_cutoff: 200.0,
            title: "WORK ORDER".to_string(),
            tables: TableSettings::default(),
        }
    }
}

impl ExtractionConfig {
    /// Loads a JSON config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> RedactorResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&raw).map_err(|e| RedactorError::InvalidInput {
            parameter: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Extracts key/value fields, the address table and the line items from `page`.
pub fn extract_record<P: Page + ?Sized>(
    page: &P,
    config: &ExtractionConfig,
) -> RedactorResult<ExtractionRecord> {
    let blocks = page.text_blocks()?;
    debug!(blocks = blocks.len(), "Read text blocks");
    let fields = assemble_fields(&blocks, config);

    let found = page.find_tables(&config.tables)?;
    debug!(tables = found.len(), "Table detection finished");

    let mut notes = Vec::new();
    let address = match found.first() {
        Some(table) => tables::address_table(table),
        None => {
            notes.push(Degradation::MissingAddressTable);
            AddressTable::new()
        }
    };
    let line_items = match found.get(1) {
        Some(table) => tables::line_items(table)?,
        None => {
            notes.push(Degradation::MissingLineItemTable);
            Vec::new()
        }
    };

    for note in &notes {
        warn!(%note, "Degraded work order data");
    }

    Ok(ExtractionRecord::new(fields, address, line_items, notes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.header_cutoff, 200.0);
        assert_eq!(config.title, "WORK ORDER");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ExtractionConfig = serde_json::from_str(r#"{"header_cutoff": 250.0}"#).unwrap();
        assert_eq!(config.header_cutoff, 250.0);
        assert_eq!(config.title, "WORK ORDER");
        assert_eq!(config.tables, TableSettings::default());
    }
}
