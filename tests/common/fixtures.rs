//! Test fixtures and PDF builders.

use super::memory_page::MemoryPage;
use anyhow::Result;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use workorder_redactor::ExtractionConfig;

/// A complete work order laid out the way the form prints it: title, the
/// key/value section above the header cutoff, then the address table and
/// the line item table.
pub fn standard_work_order() -> MemoryPage {
    MemoryPage::new()
        .with_block(36.0, 20.0, "WORK ORDER")
        .with_block(36.0, 50.0, "PRISM ID: PR-2231")
        .with_block(36.0, 65.0, "PO #: 4500012")
        .with_row(80.0, &[(36.0, "Const Coordinator:"), (200.0, "Dana Whitfield")])
        .with_block(36.0, 95.0, "Const Type: Underground")
        .with_row(110.0, &[(36.0, "PO Amount:"), (200.0, "$500.00")])
        .with_block(36.0, 125.0, "Vendor Name: Acme Fiber")
        // Address table
        .with_grid(&ADDRESS_BORDERS, &[218.0, 230.0, 256.0])
        .with_row(220.0, &[(36.0, "Job"), (200.0, "Job Address")])
        .with_row(232.0, &[(36.0, "Fiber North"), (200.0, "12 Main St")])
        .with_row(244.0, &[(200.0, "Springfield, IL 62701")])
        // Line item table
        .with_grid(&LINE_ITEM_BORDERS, &line_item_borders(3))
        .with_row(300.0, &line_item_row(["Code", "Description", "Quantity", "UOM", "Rate", "Amount"]))
        .with_row(312.0, &line_item_row(["FB-101", "Fiber splice", "2", "EA", "$10.00", "$20.00"]))
        .with_row(324.0, &line_item_row(["FB-101", "Splice repair", "3", "EA", "$12.00", "$36.00"]))
        .with_row(336.0, &line_item_row(["UG-200", "Bore", "1.5", "FT", "$4.00", "$6.00"]))
}

/// Column borders of the address table (text at x 36 and 200).
pub const ADDRESS_BORDERS: [f32; 3] = [30.0, 190.0, 330.0];

/// Column x positions of the line item table.
pub const LINE_ITEM_COLUMNS: [f32; 6] = [36.0, 90.0, 220.0, 290.0, 340.0, 400.0];

/// Column borders of the line item table.
pub const LINE_ITEM_BORDERS: [f32; 7] = [30.0, 86.0, 216.0, 286.0, 336.0, 396.0, 450.0];

/// Row borders of a line item table whose header line starts at y 300 and
/// whose rows follow every 12 units.
pub fn line_item_borders(rows: usize) -> Vec<f32> {
    (0..=rows + 1).map(|i| 298.0 + 12.0 * i as f32).collect()
}

pub fn line_item_row<'a>(cells: [&'a str; 6]) -> Vec<(f32, &'a str)> {
    LINE_ITEM_COLUMNS.into_iter().zip(cells).collect()
}

/// A ruled table in millimetres from the bottom-left corner of the page.
#[derive(Debug, Clone)]
struct PdfTable {
    top: f32,
    borders: Vec<f32>,
    rows: Vec<Vec<String>>,
}

/// Builder for single-page work order PDFs.
///
/// Every line is written as its own text object and lines are spaced far
/// apart, so the layout pass reports one block per line. Tables are drawn
/// with stroked borders around every cell.
#[derive(Debug, Clone)]
pub struct WorkOrderPdfBuilder {
    lines: Vec<String>,
    spacing: f32,
    tables: Vec<PdfTable>,
}

impl WorkOrderPdfBuilder {
    pub fn new() -> Self {
        Self {
            lines: vec!["WORK ORDER".to_string()],
            spacing: 25.0,
            tables: Vec::new(),
        }
    }

    /// Adds a ruled table whose top border is `top` mm above the bottom of
    /// the page. `borders` are the column edges, one more than the cells in
    /// a row. A cell may span several lines, split on `'\n'`.
    pub fn with_table(mut self, top: f32, borders: &[f32], rows: &[&[&str]]) -> Self {
        self.tables.push(PdfTable {
            top,
            borders: borders.to_vec(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        });
        self
    }

    /// Adds an inline `"label: value"` line.
    pub fn with_field(mut self, label: &str, value: &str) -> Self {
        self.lines.push(format!("{}: {}", label, value));
        self
    }

    /// Adds a free text line.
    pub fn with_line(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) = PdfDocument::new("Work Order", Mm(210.0), Mm(297.0), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let mut y = 280.0;
        for line in &self.lines {
            layer.use_text(line.as_str(), 11.0, Mm(20.0), Mm(y), &font);
            y -= self.spacing;
        }

        for table in &self.tables {
            let mut row_top = table.top;
            let mut row_borders = vec![row_top];
            for row in &table.rows {
                let height = row.iter().map(|c| c.split('\n').count()).max().unwrap_or(1);
                for (x, cell) in table.borders.iter().zip(row) {
                    for (k, text) in cell.split('\n').enumerate() {
                        let baseline = row_top - 4.5 - 5.0 * k as f32;
                        layer.use_text(text, 9.0, Mm(x + 1.5), Mm(baseline), &font);
                    }
                }
                row_top -= 3.0 + 5.0 * height as f32;
                row_borders.push(row_top);
            }

            let (Some(&left), Some(&right)) = (table.borders.first(), table.borders.last()) else {
                continue;
            };
            for &by in &row_borders {
                layer.add_line(rule((left, by), (right, by)));
            }
            for &x in &table.borders {
                layer.add_line(rule((x, table.top), (x, row_top)));
            }
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

fn rule(from: (f32, f32), to: (f32, f32)) -> Line {
    Line {
        points: vec![
            (Point::new(Mm(from.0), Mm(from.1)), false),
            (Point::new(Mm(to.0), Mm(to.1)), false),
        ],
        is_closed: false,
    }
}

impl Default for WorkOrderPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Config for [`WorkOrderPdfBuilder`] documents: every line is in the
/// key/value section.
pub fn whole_page_config() -> ExtractionConfig {
    ExtractionConfig {
        header_cutoff: 842.0,
        ..Default::default()
    }
}

/// A work order PDF with key/value lines, an address table and a line item
/// table. Use with [`tables_config`].
pub fn ruled_work_order_pdf(output_path: &Path) -> Result<PathBuf> {
    WorkOrderPdfBuilder::new()
        .with_field("PRISM ID", "PR-4410")
        .with_field("PO Amount", "$2,500.00")
        .with_field("Vendor Name", "Northline Contracting")
        .with_table(
            175.0,
            &[15.0, 75.0, 150.0],
            &[
                &["Job", "Job Address"],
                &["Fiber North", "12 Main St\nSpringfield, IL 62701"],
            ],
        )
        .with_table(
            140.0,
            &[15.0, 35.0, 85.0, 110.0, 130.0, 155.0, 185.0],
            &[
                &["Code", "Description", "Quantity", "UOM", "Rate", "Amount"],
                &["FB-101", "Note: splice", "2", "EA", "$10.00", "$20.00"],
                &["UG-200", "Bore", "3", "FT", "$4.50", "$13.50"],
            ],
        )
        .build(output_path)
}

/// Config for [`ruled_work_order_pdf`]: the key/value lines end above 300
/// points from the top, the tables start below it.
pub fn tables_config() -> ExtractionConfig {
    ExtractionConfig {
        header_cutoff: 300.0,
        ..Default::default()
    }
}
