//! Document access seam.
//!
//! Extraction and redaction never talk to a PDF library directly. They work
//! against the [`Page`] trait, which supplies the page's positioned text
//! blocks and glyphs, its ruling lines, literal text search and the
//! redaction commit primitive. [`MuPdfDocument`] is the production implementation.

pub mod mupdf_backend;
pub mod tables;

pub use mupdf_backend::{MuPdfDocument, MuPdfPage};
pub use tables::{detect_tables, TableSettings};

use crate::error::RedactorResult;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page units, origin at the top-left corner
/// (`y` grows downward, as MuPDF reports it).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn bottom(&self) -> f32 {
        self.y1
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Length of the vertical overlap with `other` (0 when disjoint).
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0)
    }
}

/// A rectangle plus the text the layout pass rendered inside it.
///
/// Text keeps the layout engine's line structure: every line ends with `'\n'`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub rect: Rect,
    pub text: String,
}

impl TextBlock {
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
        }
    }
}

/// Sorts blocks top-to-bottom by bottom edge, then left-to-right.
pub fn sort_reading_order(blocks: &mut [TextBlock]) {
    blocks.sort_by(|a, b| {
        a.rect
            .y1
            .total_cmp(&b.rect.y1)
            .then(a.rect.x0.total_cmp(&b.rect.x0))
    });
}

/// One rendered character and its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub rect: Rect,
    pub ch: char,
}

impl Glyph {
    pub fn new(rect: Rect, ch: char) -> Self {
        Self { rect, ch }
    }
}

/// A straight horizontal or vertical line drawn on the page: a table border
/// or cell divider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ruling {
    Horizontal { y: f32, x0: f32, x1: f32 },
    Vertical { x: f32, y0: f32, y1: f32 },
}

impl Ruling {
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Ruling::Horizontal {
            y,
            x0: x0.min(x1),
            x1: x0.max(x1),
        }
    }

    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Ruling::Vertical {
            x,
            y0: y0.min(y1),
            y1: y0.max(y1),
        }
    }

    /// Classifies the segment `(x0, y0)`-`(x1, y1)`. Slanted segments and
    /// dots are `None`.
    pub fn from_segment(x0: f32, y0: f32, x1: f32, y1: f32, tolerance: f32) -> Option<Self> {
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        if dy <= tolerance && dx > tolerance {
            Some(Ruling::horizontal((y0 + y1) / 2.0, x0, x1))
        } else if dx <= tolerance && dy > tolerance {
            Some(Ruling::vertical((x0 + x1) / 2.0, y0, y1))
        } else {
            None
        }
    }
}

/// A detected table: a header row followed by data rows, all as strings.
///
/// Rows are padded to the header width; multi-line cells keep their
/// line breaks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rect: Rect,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Opaque fill used when a mask is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl FillColor {
    pub const BLACK: FillColor = FillColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
}

/// A page rectangle scheduled for destructive redaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionMask {
    pub rect: Rect,
    /// What was searched for to produce this mask, for logging.
    pub matched: String,
}

/// One page of a document, as seen by extraction and redaction.
pub trait Page {
    /// Positioned text blocks in reading order (top-to-bottom, left-to-right).
    fn text_blocks(&self) -> RedactorResult<Vec<TextBlock>>;

    /// Every rendered character with its bounding box.
    fn glyphs(&self) -> RedactorResult<Vec<Glyph>>;

    /// Horizontal and vertical lines drawn on the page.
    fn rulings(&self) -> RedactorResult<Vec<Ruling>>;

    /// Every rectangle where `needle` is rendered, case-sensitive.
    fn search(&self, needle: &str) -> RedactorResult<Vec<Rect>>;

    /// Ruled tables found on the page, top to bottom.
    fn find_tables(&self, settings: &TableSettings) -> RedactorResult<Vec<Table>> {
        Ok(detect_tables(&self.glyphs()?, &self.rulings()?, settings))
    }

    /// Removes the text under every mask and paints the masks with `fill`.
    ///
    /// Returns the number of masks committed.
    fn apply_redactions(
        &mut self,
        masks: &[RedactionMask],
        fill: FillColor,
    ) -> RedactorResult<usize>;

    /// Whether [`Page::apply_redactions`] destroys the underlying text.
    fn is_secure(&self) -> bool;
}
