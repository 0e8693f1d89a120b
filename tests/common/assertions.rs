//! Custom assertions for redaction testing.
//!
//! Text is read back with pdf-extract, independently of the MuPDF backend
//! that performed the redaction.

use std::path::Path;

/// Asserts that `pattern` no longer appears in the text of the PDF.
///
/// # Panics
/// Panics if the pattern is still found in the PDF text.
pub fn assert_redacted(pdf_path: &Path, pattern: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        !text.contains(pattern),
        "Pattern '{}' should be redacted but was found in output PDF at '{}'.\nExtracted text length: {} chars",
        pattern,
        pdf_path.display(),
        text.len()
    );
}

/// Asserts that `pattern` still appears in the text of the PDF.
///
/// # Panics
/// Panics if the pattern is not found in the PDF.
pub fn assert_preserved(pdf_path: &Path, pattern: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        text.contains(pattern),
        "Pattern '{}' should be preserved but was not found in PDF at '{}'",
        pattern,
        pdf_path.display()
    );
}

/// Asserts that the file exists, is non-empty and loads as a PDF.
pub fn assert_valid_pdf(pdf_path: &Path) {
    let size = std::fs::metadata(pdf_path)
        .map(|m| m.len())
        .unwrap_or_else(|e| panic!("PDF should exist at '{}': {}", pdf_path.display(), e));
    assert!(size > 0, "PDF should not be empty at '{}'", pdf_path.display());
    assert!(
        ::lopdf::Document::load(pdf_path).is_ok(),
        "PDF at '{}' should load",
        pdf_path.display()
    );
}

/// Asserts that the in-memory text no longer contains any of `patterns`.
pub fn assert_text_redacted(text: &str, patterns: &[&str]) {
    let found: Vec<&str> = patterns.iter().copied().filter(|p| text.contains(p)).collect();
    assert!(
        found.is_empty(),
        "The following patterns should be redacted but were found: {:?}",
        found
    );
}

fn extract_text_or_panic(pdf_path: &Path) -> String {
    workorder_redactor::extract_text_from_pdf(pdf_path)
        .unwrap_or_else(|e| panic!("Failed to extract text from PDF '{}': {}", pdf_path.display(), e))
}
