//! Text-locating redaction engine.
//!
//! A pass has two phases. [`locate_masks`] searches the page for every
//! needle the targets resolve to and turns each hit into a
//! [`RedactionMask`]; nothing on the page changes yet. [`commit_masks`] then
//! hands all masks to the page in one call, which removes the text under them
//! and paints them over.

use super::target::{work_order_targets, RedactionResult, RedactionTarget};
use crate::document::{FillColor, Page, RedactionMask};
use crate::domain::ExtractionRecord;
use crate::error::RedactorResult;
use tracing::{debug, info};

/// Searches `page` for every needle the targets resolve to.
///
/// Needles are searched once each even when several targets produce the
/// same text.
pub fn locate_masks<P: Page + ?Sized>(
    page: &P,
    record: &ExtractionRecord,
    targets: &[RedactionTarget],
) -> RedactorResult<Vec<RedactionMask>> {
    let mut needles: Vec<String> = Vec::new();
    for target in targets {
        for needle in target.needles(record) {
            if !needles.contains(&needle) {
                needles.push(needle);
            }
        }
    }

    let mut masks = Vec::new();
    for needle in needles {
        let hits = page.search(&needle)?;
        debug!(needle = %needle, hits = hits.len(), "Located text");
        masks.extend(hits.into_iter().map(|rect| RedactionMask {
            rect,
            matched: needle.clone(),
        }));
    }

    Ok(masks)
}

/// Commits `masks` to the page in a single pass, filled with black.
pub fn commit_masks<P: Page + ?Sized>(
    page: &mut P,
    masks: &[RedactionMask],
) -> RedactorResult<usize> {
    if masks.is_empty() {
        return Ok(0);
    }
    page.apply_redactions(masks, FillColor::BLACK)
}

/// Redacts the named fields and every line item's Rate and Amount from `page`.
pub fn redact_page<P: Page + ?Sized>(
    page: &mut P,
    record: &ExtractionRecord,
    fields: &[String],
) -> RedactorResult<RedactionResult> {
    redact_targets(page, record, &work_order_targets(fields))
}

/// Locates and commits every target in one pass.
pub fn redact_targets<P: Page + ?Sized>(
    page: &mut P,
    record: &ExtractionRecord,
    targets: &[RedactionTarget],
) -> RedactorResult<RedactionResult> {
    let masks = locate_masks(page, record, targets)?;
    let committed = commit_masks(page, &masks)?;

    info!(
        targets = ?targets,
        masks = committed,
        "Redaction pass finished"
    );

    Ok(RedactionResult {
        instances_redacted: committed,
        pages_processed: 1,
        pages_modified: usize::from(committed > 0),
        secure: page.is_secure(),
    })
}
