//! MuPDF-backed document access.
//!
//! Text layout, ruling lines, literal search and redaction all go through
//! MuPDF, so the rectangles found by [`Page::search`] are exactly the ones MuPDF removes
//! text from when the masks are committed with `pdf_redact_page`.
//!
//! **Security**: committed masks physically remove the glyphs under them;
//! the redacted text cannot be extracted from the saved document.
//!
//! **Threading**: hold [`exclusive`] for as long as any document or page
//! from this module is alive. Redaction annotations are written through raw
//! MuPDF calls on a fresh base context.

use super::{
    sort_reading_order, FillColor, Glyph, Page, Rect, RedactionMask, Ruling, TextBlock,
};
use crate::error::{RedactorError, RedactorResult};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::{
    ColorParams, Colorspace, Device, Matrix, NativeDevice, Page as MuPage, Path as MuPath,
    PathWalker, Point, Quad, StrokeState, TextPage, TextPageFlags,
};

/// Maximum search hits per needle (MuPDF requires an upper bound).
const DEFAULT_MAX_HITS: u32 = 100;

/// Segments within this many units of level or plumb count as rulings.
const RULING_TOLERANCE: f32 = 1.0;

static MUPDF: Mutex<()> = Mutex::new(());

/// Process-wide MuPDF lock.
pub fn exclusive() -> MutexGuard<'static, ()> {
    MUPDF.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An open PDF document.
pub struct MuPdfDocument {
    inner: PdfDocument,
    max_hits: u32,
}

impl MuPdfDocument {
    /// Opens the PDF at `path`.
    pub fn open(path: &Path) -> RedactorResult<Self> {
        let path_str = path.to_str().ok_or_else(|| RedactorError::InvalidInput {
            parameter: "input".to_string(),
            reason: "Path contains invalid UTF-8".to_string(),
        })?;

        let inner = PdfDocument::open(path_str).map_err(|e| RedactorError::PdfProcessing {
            message: format!("Failed to open PDF '{}' with MuPDF", path.display()),
            page: None,
            source: Some(Box::new(e)),
        })?;

        Ok(Self {
            inner,
            max_hits: DEFAULT_MAX_HITS,
        })
    }

    /// Sets the maximum number of search hits per needle.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }

    pub fn page_count(&self) -> RedactorResult<usize> {
        self.inner
            .page_count()
            .map(|count| count.max(0) as usize)
            .map_err(|e| RedactorError::mupdf("Failed to get page count", e))
    }

    /// Loads the page at zero-based `index`.
    pub fn page(&self, index: usize) -> RedactorResult<MuPdfPage> {
        let page = self
            .inner
            .load_page(index as i32)
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to load page {}", index + 1),
                page: Some(index + 1),
                source: Some(Box::new(e)),
            })?;

        let pdf_page =
            PdfPage::try_from(page.clone()).map_err(|_| RedactorError::PdfProcessing {
                message: "Page is not a PDF page".to_string(),
                page: Some(index + 1),
                source: None,
            })?;

        Ok(MuPdfPage {
            page,
            pdf_page,
            number: index + 1,
            max_hits: self.max_hits,
        })
    }

    /// Writes the (possibly redacted) document to `path`.
    pub fn save(&self, path: &Path) -> RedactorResult<()> {
        let path_str = path.to_str().ok_or_else(|| RedactorError::InvalidInput {
            parameter: "output".to_string(),
            reason: "Path contains invalid UTF-8".to_string(),
        })?;

        self.inner
            .save(path_str)
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to save redacted PDF".to_string(),
                page: None,
                source: Some(Box::new(e)),
            })
    }
}

/// A loaded page of a [`MuPdfDocument`].
pub struct MuPdfPage {
    page: MuPage,
    pdf_page: PdfPage,
    number: usize,
    max_hits: u32,
}

impl MuPdfPage {
    /// One-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    fn text_page(&self) -> RedactorResult<TextPage> {
        self.page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| {
                RedactorError::mupdf(format!("Failed to lay out text on page {}", self.number), e)
            })
    }
}

impl Page for MuPdfPage {
    fn text_blocks(&self) -> RedactorResult<Vec<TextBlock>> {
        let text_page = self.text_page()?;
        let mut blocks = Vec::new();

        for block in text_page.blocks() {
            let mut text = String::new();
            for line in block.lines() {
                text.extend(line.chars().filter_map(|c| c.char()));
                text.push('\n');
            }
            // Image blocks carry no lines
            if text.trim().is_empty() {
                continue;
            }
            let b = block.bounds();
            blocks.push(TextBlock::new(Rect::new(b.x0, b.y0, b.x1, b.y1), text));
        }

        sort_reading_order(&mut blocks);
        Ok(blocks)
    }

    fn glyphs(&self) -> RedactorResult<Vec<Glyph>> {
        let text_page = self.text_page()?;
        let mut glyphs = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                for ch in line.chars() {
                    if let Some(c) = ch.char() {
                        glyphs.push(Glyph::new(quad_bounds(&ch.quad()), c));
                    }
                }
            }
        }
        Ok(glyphs)
    }

    fn rulings(&self) -> RedactorResult<Vec<Ruling>> {
        let rulings = Rc::new(RefCell::new(Vec::new()));
        let device = Device::from_native(RulingCollector {
            rulings: Rc::clone(&rulings),
        })
        .map_err(|e| RedactorError::mupdf("Failed to create drawing device", e))?;

        self.page.run(&device, &Matrix::IDENTITY).map_err(|e| {
            RedactorError::mupdf(format!("Failed to read drawings on page {}", self.number), e)
        })?;
        drop(device);

        let rulings = rulings.take();
        debug!(page = self.number, rulings = rulings.len(), "Collected rulings");
        Ok(rulings)
    }

    fn search(&self, needle: &str) -> RedactorResult<Vec<Rect>> {
        let quads = self
            .page
            .search(needle, self.max_hits)
            .map_err(|e| RedactorError::mupdf(format!("Search failed for '{}'", needle), e))?;

        if quads.len() == self.max_hits as usize {
            warn!(
                needle = %needle,
                max_hits = self.max_hits,
                page = self.number,
                "Search hit limit reached; further occurrences are not redacted"
            );
        }

        let hits: Vec<Rect> = quads.iter().map(quad_bounds).collect();
        if hits.is_empty() {
            return Ok(hits);
        }
        Ok(exact_hits(hits, &self.glyphs()?, needle))
    }

    fn apply_redactions(
        &mut self,
        masks: &[RedactionMask],
        fill: FillColor,
    ) -> RedactorResult<usize> {
        if masks.is_empty() {
            return Ok(0);
        }

        for mask in masks {
            let annot = self
                .pdf_page
                .create_annotation(PdfAnnotationType::Redact)
                .map_err(|e| RedactorError::PdfProcessing {
                    message: "Failed to create redaction annotation".to_string(),
                    page: Some(self.number),
                    source: Some(Box::new(e)),
                })?;

            // SAFETY: `annot` was just created on this page and is alive for
            // the duration of both calls.
            unsafe {
                ffi::set_annotation_rect(&annot, &mask.rect);
                ffi::set_annotation_fill(&annot, fill);
            }
        }

        self.pdf_page
            .redact()
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to apply redactions on page {}", self.number),
                page: Some(self.number),
                source: Some(Box::new(e)),
            })?;

        Ok(masks.len())
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// Keeps the hits whose glyphs spell `needle` exactly.
///
/// MuPDF matches case-insensitively and lets any whitespace run stand for a
/// space, so a hit is only trusted once the characters inside it compare
/// equal to the needle.
fn exact_hits(hits: Vec<Rect>, glyphs: &[Glyph], needle: &str) -> Vec<Rect> {
    hits.into_iter()
        .filter(|hit| {
            let found: String = glyphs
                .iter()
                .filter(|g| hit.contains_point(g.rect.center_x(), g.rect.center_y()))
                .map(|g| g.ch)
                .collect();
            found == needle
        })
        .collect()
}

/// Drawing device that records every straight horizontal or vertical
/// segment of stroked and filled paths.
struct RulingCollector {
    rulings: Rc<RefCell<Vec<Ruling>>>,
}

impl RulingCollector {
    fn collect(&self, path: &MuPath, ctm: Matrix) {
        let mut walker = SegmentWalker {
            ctm,
            start: None,
            current: None,
            segments: Vec::new(),
        };
        if let Err(e) = path.walk(&mut walker) {
            debug!(error = %e, "Skipping unreadable path");
            return;
        }
        self.rulings.borrow_mut().extend(
            walker
                .segments
                .iter()
                .filter_map(|(a, b)| Ruling::from_segment(a.x, a.y, b.x, b.y, RULING_TOLERANCE)),
        );
    }
}

impl NativeDevice for RulingCollector {
    fn fill_path(
        &mut self,
        path: &MuPath,
        _even_odd: bool,
        ctm: Matrix,
        _color_space: &Colorspace,
        _color: &[f32],
        _alpha: f32,
        _cp: ColorParams,
    ) {
        self.collect(path, ctm);
    }

    fn stroke_path(
        &mut self,
        path: &MuPath,
        _stroke_state: &StrokeState,
        ctm: Matrix,
        _color_space: &Colorspace,
        _color: &[f32],
        _alpha: f32,
        _cp: ColorParams,
    ) {
        self.collect(path, ctm);
    }
}

/// Flattens a path into straight segments in page space. Curves only move
/// the pen.
struct SegmentWalker {
    ctm: Matrix,
    start: Option<Point>,
    current: Option<Point>,
    segments: Vec<(Point, Point)>,
}

impl SegmentWalker {
    fn point(&self, x: f32, y: f32) -> Point {
        Point::new(x, y).transform(&self.ctm)
    }
}

impl PathWalker for SegmentWalker {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.start = Some(p);
        self.current = Some(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        if let Some(from) = self.current {
            self.segments.push((from, p));
        }
        self.current = Some(p);
    }

    fn curve_to(&mut self, _cx1: f32, _cy1: f32, _cx2: f32, _cy2: f32, ex: f32, ey: f32) {
        self.current = Some(self.point(ex, ey));
    }

    fn close(&mut self) {
        if let (Some(from), Some(to)) = (self.current, self.start) {
            self.segments.push((from, to));
        }
        self.current = self.start;
    }
}

/// Bounding rectangle of a (possibly rotated) quad.
fn quad_bounds(quad: &Quad) -> Rect {
    Rect {
        x0: quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
        y0: quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
        x1: quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
        y1: quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
    }
}

/// FFI helpers for MuPDF annotation operations not exposed by the safe API.
mod ffi {
    use crate::document::{FillColor, Rect};
    use mupdf::pdf::PdfAnnotation;

    #[repr(C)]
    struct PdfAnnotRaw {
        inner: *mut mupdf_sys::pdf_annot,
    }

    unsafe fn raw_annot(annot: &PdfAnnotation) -> *mut mupdf_sys::pdf_annot {
        std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot).inner
    }

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// The annotation must be valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: &Rect) {
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, raw_annot(annot), fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }

    /// Sets the interior colour MuPDF paints over the redacted area.
    ///
    /// # Safety
    /// Same requirements as [`set_annotation_rect`].
    pub unsafe fn set_annotation_fill(annot: &PdfAnnotation, fill: FillColor) {
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let color = [fill.r, fill.g, fill.b];
            mupdf_sys::pdf_set_annot_interior_color(ctx, raw_annot(annot), 3, color.as_ptr());
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
