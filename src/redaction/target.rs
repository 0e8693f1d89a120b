//! What to redact, and what a redaction pass did.

use crate::domain::ExtractionRecord;
use serde::Serialize;

/// Something whose rendered text should be removed from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedactionTarget {
    /// A named form field: its value wherever it appears, plus the inline
    /// `"<field>: <value>"` rendering. Looked up in the key/value fields and
    /// in the address table.
    Field(String),

    /// Rate and Amount of every line item. Monetary line item figures are
    /// always sensitive.
    LineItemAmounts,

    /// Text removed wherever it is rendered, matched exactly.
    Literal(String),
}

impl RedactionTarget {
    /// Literal strings to search for on the page, in the order they should be tried.
    ///
    /// Fields absent from the record resolve to nothing, and empty values are
    /// never searched for (an empty needle would match the whole page).
    pub fn needles(&self, record: &ExtractionRecord) -> Vec<String> {
        let mut needles = Vec::new();
        match self {
            Self::Field(name) => {
                let sources = [record.field(name), record.address().get(name)];
                for value in sources.into_iter().flatten() {
                    if value.is_empty() {
                        continue;
                    }
                    needles.push(value.to_string());
                    needles.push(format!("{}: {}", name, value));
                }
            }
            Self::LineItemAmounts => {
                for item in record.line_items() {
                    for value in [&item.rate, &item.amount] {
                        if !value.is_empty() {
                            needles.push(value.clone());
                        }
                    }
                }
            }
            Self::Literal(text) => {
                if !text.is_empty() {
                    needles.push(text.clone());
                }
            }
        }
        needles
    }
}

/// Targets for one redaction pass over a work order: the caller's fields
/// plus the line item amounts, which are always included.
pub fn work_order_targets<S: AsRef<str>>(fields: &[S]) -> Vec<RedactionTarget> {
    fields
        .iter()
        .map(|f| RedactionTarget::Field(f.as_ref().to_string()))
        .chain(std::iter::once(RedactionTarget::LineItemAmounts))
        .collect()
}

/// Statistics about a redaction operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionResult {
    /// Number of instances redacted
    pub instances_redacted: usize,

    /// Pages processed
    pub pages_processed: usize,

    /// Pages with redactions
    pub pages_modified: usize,

    /// Whether text was physically removed (vs visually obscured)
    pub secure: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.instances_redacted > 0
    }
}
