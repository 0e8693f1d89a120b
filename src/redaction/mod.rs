//! Redaction of work order documents.
//!
//! [`engine`] locates and commits masks on a single page; [`RedactionService`]
//! runs the whole per-document pipeline: open, extract, redact, build the
//! downstream records, save.

pub mod engine;
pub mod target;

pub use engine::{commit_masks, locate_masks, redact_page, redact_targets};
pub use target::{work_order_targets, RedactionResult, RedactionTarget};

use crate::document::mupdf_backend::exclusive;
use crate::document::MuPdfDocument;
use crate::domain::{labels, transform, ExtractionRecord, TransformOutput};
use crate::error::{RedactorError, RedactorResult};
use crate::extraction::{extract_record, ExtractionConfig};
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Everything one processed document yields besides the redacted file.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub record: ExtractionRecord,
    #[serde(flatten)]
    pub output: TransformOutput,
    pub redaction: RedactionResult,
}

/// Per-document pipeline: extraction -> redaction -> record transformation.
///
/// Holds no state between documents.
#[derive(Debug, Clone)]
pub struct RedactionService {
    config: ExtractionConfig,
    fields: Vec<String>,
    literals: Vec<String>,
}

impl Default for RedactionService {
    fn default() -> Self {
        Self::new(ExtractionConfig::default(), vec![labels::PO_AMOUNT.to_string()])
    }
}

impl RedactionService {
    /// Creates a service redacting `fields` (plus line item amounts).
    pub fn new(config: ExtractionConfig, fields: Vec<String>) -> Self {
        Self {
            config,
            fields,
            literals: Vec::new(),
        }
    }

    /// Also redacts every occurrence of each of `literals`, verbatim.
    pub fn with_literals(mut self, literals: Vec<String>) -> Self {
        self.literals = literals;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    /// Everything one pass removes: the fields, the line item amounts and
    /// the literal strings.
    pub fn targets(&self) -> Vec<RedactionTarget> {
        let mut targets = work_order_targets(&self.fields);
        targets.extend(self.literals.iter().cloned().map(RedactionTarget::Literal));
        targets
    }

    /// Redacts `input` into `output` and returns the extracted records.
    ///
    /// `output` is only written when every step succeeds. Runs under the
    /// process-wide MuPDF lock.
    pub fn process(&self, input: &Path, output: &Path) -> RedactorResult<ProcessOutcome> {
        let _mupdf = exclusive();
        let doc = self.open(input)?;
        let mut page = doc.page(0)?;

        let record = extract_record(&page, &self.config)?;
        let redaction = redact_targets(&mut page, &record, &self.targets())?;
        let output_records = transform(&record, Local::now().date_naive());

        doc.save(output)?;
        info!(
            input = %input.display(),
            output = %output.display(),
            redacted = redaction.instances_redacted,
            line_items = record.line_items().len(),
            "Processed work order"
        );

        Ok(ProcessOutcome {
            record,
            output: output_records,
            redaction,
        })
    }

    /// Extracts the record from page 1 without modifying anything.
    pub fn extract(&self, input: &Path) -> RedactorResult<ExtractionRecord> {
        let _mupdf = exclusive();
        let doc = self.open(input)?;
        let page = doc.page(0)?;
        extract_record(&page, &self.config)
    }

    /// Extracts plain text from a PDF, e.g. to check that redacted values are gone.
    pub fn extract_text(&self, input: &Path) -> RedactorResult<String> {
        extract_text_from_pdf(input)
    }

    fn open(&self, input: &Path) -> RedactorResult<MuPdfDocument> {
        if !input.exists() {
            return Err(RedactorError::Io {
                path: input.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Input file does not exist",
                ),
            });
        }

        let doc = MuPdfDocument::open(input)?;
        if doc.page_count()? == 0 {
            return Err(RedactorError::PdfProcessing {
                message: "Document has no pages".to_string(),
                page: None,
                source: None,
            });
        }
        Ok(doc)
    }
}

/// Plain text of every page, via pdf-extract.
pub fn extract_text_from_pdf(input: &Path) -> RedactorResult<String> {
    let bytes = std::fs::read(input).map_err(|e| RedactorError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| RedactorError::TextExtraction {
        path: input.to_path_buf(),
        reason: e.to_string(),
    })
}
