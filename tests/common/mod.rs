//! Common test utilities and helpers.
//!
//! - [`memory_page`]: an in-memory [`Page`](workorder_redactor::Page) with a
//!   fixed-width font, for exercising extraction and redaction without MuPDF
//! - [`fixtures`]: the standard work order layout and a printpdf builder
//! - [`assertions`]: redaction assertions over real PDFs

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod memory_page;

pub use assertions::*;
pub use fixtures::*;
pub use memory_page::*;

use std::sync::{Mutex, MutexGuard};

/// MuPDF has thread-safety issues with font loading; tests that open
/// documents hold this lock.
pub static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// Holds [`MUPDF_LOCK`] for the lifetime of the guard.
pub fn mupdf_guard() -> MutexGuard<'static, ()> {
    MUPDF_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
