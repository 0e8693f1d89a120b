//! Fixed-width in-memory page.
//!
//! Every character is [`CHAR_WIDTH`] wide and every line [`LINE_HEIGHT`]
//! tall, so positions are easy to reason about. Redaction blanks every
//! character whose centre falls inside a mask, which makes it as destructive
//! as the real backend: blanked text can no longer be found or extracted.
//! Table borders are explicit rulings, added with [`MemoryPage::with_grid`].

use workorder_redactor::document::{FillColor, Glyph, Rect, RedactionMask, Ruling, TextBlock};
use workorder_redactor::{Page, RedactorResult};

pub const CHAR_WIDTH: f32 = 5.0;
pub const LINE_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone)]
struct Block {
    x: f32,
    y: f32,
    lines: Vec<String>,
}

impl Block {
    fn line_origin(&self, line: usize) -> (f32, f32) {
        (self.x, self.y + line as f32 * LINE_HEIGHT)
    }

    fn rect(&self) -> Rect {
        let widest = self.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Rect::new(
            self.x,
            self.y,
            self.x + widest as f32 * CHAR_WIDTH,
            self.y + self.lines.len() as f32 * LINE_HEIGHT,
        )
    }
}

/// A page made of text blocks placed at explicit positions.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    blocks: Vec<Block>,
    rulings: Vec<Ruling>,
    applied: Vec<(RedactionMask, FillColor)>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a block whose top-left corner is at (`x`, `y`). Lines split on `'\n'`.
    pub fn with_block(mut self, x: f32, y: f32, text: &str) -> Self {
        self.blocks.push(Block {
            x,
            y,
            lines: text.split('\n').map(str::to_string).collect(),
        });
        self
    }

    /// Places one block per cell, all on the line starting at `y`.
    pub fn with_row(mut self, y: f32, cells: &[(f32, &str)]) -> Self {
        for (x, text) in cells {
            self = self.with_block(*x, y, text);
        }
        self
    }

    /// Draws a full table grid: a vertical border at every x and a
    /// horizontal border at every y.
    pub fn with_grid(mut self, xs: &[f32], ys: &[f32]) -> Self {
        let (Some(&left), Some(&right)) = (xs.first(), xs.last()) else {
            return self;
        };
        let (Some(&top), Some(&bottom)) = (ys.first(), ys.last()) else {
            return self;
        };
        self.rulings
            .extend(ys.iter().map(|&y| Ruling::horizontal(y, left, right)));
        self.rulings
            .extend(xs.iter().map(|&x| Ruling::vertical(x, top, bottom)));
        self
    }

    /// All text on the page, blocks in insertion order.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .map(|l| format!("{}\n", l))
            .collect()
    }

    /// Masks committed so far, with their fill.
    pub fn applied(&self) -> &[(RedactionMask, FillColor)] {
        &self.applied
    }
}

impl Page for MemoryPage {
    fn text_blocks(&self) -> RedactorResult<Vec<TextBlock>> {
        let mut blocks: Vec<TextBlock> = self
            .blocks
            .iter()
            .map(|b| {
                let text: String = b.lines.iter().map(|l| format!("{}\n", l)).collect();
                TextBlock::new(b.rect(), text)
            })
            .filter(|b| !b.text.trim().is_empty())
            .collect();
        workorder_redactor::document::sort_reading_order(&mut blocks);
        Ok(blocks)
    }

    fn glyphs(&self) -> RedactorResult<Vec<Glyph>> {
        let mut glyphs = Vec::new();
        for block in &self.blocks {
            for (ln, line) in block.lines.iter().enumerate() {
                let (x, y) = block.line_origin(ln);
                for (idx, ch) in line.chars().enumerate() {
                    let x0 = x + idx as f32 * CHAR_WIDTH;
                    glyphs.push(Glyph::new(
                        Rect::new(x0, y, x0 + CHAR_WIDTH, y + LINE_HEIGHT),
                        ch,
                    ));
                }
            }
        }
        Ok(glyphs)
    }

    fn rulings(&self) -> RedactorResult<Vec<Ruling>> {
        Ok(self.rulings.clone())
    }

    fn search(&self, needle: &str) -> RedactorResult<Vec<Rect>> {
        let mut hits = Vec::new();
        if needle.is_empty() {
            return Ok(hits);
        }
        let width = needle.chars().count() as f32 * CHAR_WIDTH;
        for block in &self.blocks {
            for (ln, line) in block.lines.iter().enumerate() {
                let (x, y) = block.line_origin(ln);
                for (byte, _) in line.match_indices(needle) {
                    let col = line[..byte].chars().count() as f32;
                    let x0 = x + col * CHAR_WIDTH;
                    hits.push(Rect::new(x0, y, x0 + width, y + LINE_HEIGHT));
                }
            }
        }
        Ok(hits)
    }

    fn apply_redactions(
        &mut self,
        masks: &[RedactionMask],
        fill: FillColor,
    ) -> RedactorResult<usize> {
        for block in &mut self.blocks {
            let origin_x = block.x;
            let origin_y = block.y;
            for (ln, line) in block.lines.iter_mut().enumerate() {
                let cy = origin_y + ln as f32 * LINE_HEIGHT + LINE_HEIGHT / 2.0;
                *line = line
                    .chars()
                    .enumerate()
                    .map(|(idx, c)| {
                        let cx = origin_x + (idx as f32 + 0.5) * CHAR_WIDTH;
                        if masks.iter().any(|m| m.rect.contains_point(cx, cy)) {
                            ' '
                        } else {
                            c
                        }
                    })
                    .collect();
            }
        }
        self.applied
            .extend(masks.iter().cloned().map(|m| (m, fill)));
        Ok(masks.len())
    }

    fn is_secure(&self) -> bool {
        true
    }
}
