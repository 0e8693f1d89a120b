//! Work order PDF extraction and secure field redaction.
//!
//! Reads page 1 of a work order form, reconstructs its key/value fields, the
//! address table and the line item table, redacts sensitive values by
//! physically removing their rendered text, and derives the normalized
//! header and units records the downstream import consumes.
//!
//! # Architecture
//!
//! - [`document`]: the page abstraction (text blocks, glyphs, ruling lines,
//!   search, redaction commit), ruled table detection and the MuPDF
//!   implementation
//! - [`extraction`]: block classification, key/value assembly, table reshaping
//! - [`domain`]: extraction record, header/units records and the record builder
//! - [`redaction`]: mask location/commit and the per-document service
//! - [`server`]: the HTTP upload endpoint
//! - [`error`]: error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use workorder_redactor::RedactionService;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Redacts "PO Amount" and every line item's Rate and Amount
//! let service = RedactionService::default();
//!
//! let outcome = service.process(Path::new("work_order.pdf"), Path::new("redacted.pdf"))?;
//! println!("{}", serde_json::to_string_pretty(&outcome.output.header)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Record Builder
//!
//! ```
//! use workorder_redactor::domain::{aggregate_units, LineItem};
//!
//! let item = |code: &str, qty: &str| LineItem {
//!     code: code.into(),
//!     quantity: qty.into(),
//!     ..Default::default()
//! };
//! let (units, notes) = aggregate_units(&[item("A", "2"), item("A", "bad"), item("A", "3.0")]);
//! assert_eq!(units["A"], 5);
//! assert_eq!(notes.len(), 1);
//! ```

pub mod document;
pub mod domain;
pub mod error;
pub mod extraction;
pub mod redaction;
pub mod server;

pub use document::{MuPdfDocument, Page};
pub use domain::{ExtractionRecord, HeaderRecord, TransformOutput, UnitsRecord};
pub use error::{RedactorError, RedactorResult};
pub use extraction::{extract_record, ExtractionConfig};
pub use redaction::{
    extract_text_from_pdf, redact_page, redact_targets, ProcessOutcome, RedactionResult,
    RedactionService, RedactionTarget,
};
