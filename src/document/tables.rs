//! Ruling-based table detection.
//!
//! A table is a grid of cells bounded by the lines drawn on the page.
//! Rulings are snapped onto shared coordinates and joined into continuous
//! edges. Every crossing of a horizontal and a vertical edge is an
//! intersection, and a cell is the smallest rectangle whose four corners are
//! intersections connected by edges. Cells that share a corner belong to the
//! same table.
//!
//! Cell text is every glyph whose centre lies inside the cell, one visual
//! line per `'\n'`. Text never decides where a row or a table ends, so a
//! description like `Note: splice` or a line item with an empty first cell
//! stays in its own row.

use super::{Glyph, Rect, Ruling, Table};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tunables for [`detect_tables`], in page units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Parallel rulings closer than this are snapped onto one coordinate.
    pub snap_tolerance: f32,
    /// Collinear rulings separated by at most this gap are joined.
    pub join_tolerance: f32,
    /// How far an edge may stop short of a crossing edge and still meet it.
    pub intersection_tolerance: f32,
    /// Minimum number of columns for a grid to count as a table.
    pub min_columns: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            intersection_tolerance: 3.0,
            min_columns: 2,
        }
    }
}

/// A merged run of rulings along one axis. `pos` is the shared coordinate
/// (y for horizontal edges, x for vertical ones), `start..end` the extent.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    pos: f32,
    start: f32,
    end: f32,
}

impl Edge {
    fn covers(&self, a: f32, b: f32, tolerance: f32) -> bool {
        a.min(b) >= self.start - tolerance && a.max(b) <= self.end + tolerance
    }
}

type Point = (f32, f32);

const SAME: f32 = 0.01;

fn same(a: f32, b: f32) -> bool {
    (a - b).abs() < SAME
}

/// Detects ruled tables on a page, returned top to bottom.
pub fn detect_tables(glyphs: &[Glyph], rulings: &[Ruling], settings: &TableSettings) -> Vec<Table> {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for ruling in rulings {
        match *ruling {
            Ruling::Horizontal { y, x0, x1 } => horizontal.push(Edge {
                pos: y,
                start: x0,
                end: x1,
            }),
            Ruling::Vertical { x, y0, y1 } => vertical.push(Edge {
                pos: x,
                start: y0,
                end: y1,
            }),
        }
    }

    let horizontal = merge_edges(horizontal, settings);
    let vertical = merge_edges(vertical, settings);
    let tolerance = settings.intersection_tolerance;
    let points = intersections(&horizontal, &vertical, tolerance);
    let cells = find_cells(&points, &horizontal, &vertical, tolerance);

    let mut tables: Vec<Table> = group_cells(cells)
        .iter()
        .map(|group| build_table(group, glyphs))
        .filter(|table| table.header.len() >= settings.min_columns.max(1))
        .collect();
    tables.sort_by(|a, b| {
        a.rect
            .y0
            .total_cmp(&b.rect.y0)
            .then(a.rect.x0.total_cmp(&b.rect.x0))
    });

    for table in &tables {
        debug!(
            columns = table.header.len(),
            rows = table.rows.len(),
            top = table.rect.y0,
            "Detected table"
        );
    }
    tables
}

/// Snaps edges within `snap_tolerance` of each other onto their mean
/// position, then joins collinear edges that overlap or nearly touch.
fn merge_edges(mut edges: Vec<Edge>, settings: &TableSettings) -> Vec<Edge> {
    edges.sort_by(|a, b| a.pos.total_cmp(&b.pos));

    let mut clusters: Vec<Vec<Edge>> = Vec::new();
    for edge in edges {
        match clusters.last_mut() {
            Some(cluster)
                if cluster
                    .last()
                    .is_some_and(|last| edge.pos - last.pos <= settings.snap_tolerance) =>
            {
                cluster.push(edge)
            }
            _ => clusters.push(vec![edge]),
        }
    }

    let mut merged = Vec::new();
    for mut cluster in clusters {
        let pos = cluster.iter().map(|e| e.pos).sum::<f32>() / cluster.len() as f32;
        cluster.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut run: Option<Edge> = None;
        for edge in cluster {
            match run.as_mut() {
                Some(current) if edge.start <= current.end + settings.join_tolerance => {
                    current.end = current.end.max(edge.end);
                }
                _ => {
                    merged.extend(run.take());
                    run = Some(Edge {
                        pos,
                        start: edge.start,
                        end: edge.end,
                    });
                }
            }
        }
        merged.extend(run);
    }
    merged
}

/// Crossings of horizontal and vertical edges, sorted top-to-bottom then
/// left-to-right.
fn intersections(horizontal: &[Edge], vertical: &[Edge], tolerance: f32) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::new();
    for v in vertical {
        for h in horizontal {
            if v.covers(h.pos, h.pos, tolerance) && h.covers(v.pos, v.pos, tolerance) {
                points.push((v.pos, h.pos));
            }
        }
    }
    points.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));
    points.dedup_by(|a, b| same(a.0, b.0) && same(a.1, b.1));
    points
}

fn horizontally_joined(edges: &[Edge], y: f32, xa: f32, xb: f32, tolerance: f32) -> bool {
    edges
        .iter()
        .any(|e| same(e.pos, y) && e.covers(xa, xb, tolerance))
}

fn vertically_joined(edges: &[Edge], x: f32, ya: f32, yb: f32, tolerance: f32) -> bool {
    edges
        .iter()
        .any(|e| same(e.pos, x) && e.covers(ya, yb, tolerance))
}

/// For each intersection, the smallest cell it is the top-left corner of.
fn find_cells(points: &[Point], horizontal: &[Edge], vertical: &[Edge], tolerance: f32) -> Vec<Rect> {
    let has_point = |x: f32, y: f32| points.iter().any(|p| same(p.0, x) && same(p.1, y));
    let mut cells = Vec::new();

    for &(x, y) in points {
        let below: Vec<f32> = points
            .iter()
            .filter(|p| same(p.0, x) && p.1 > y)
            .map(|p| p.1)
            .collect();
        let right: Vec<f32> = points
            .iter()
            .filter(|p| same(p.1, y) && p.0 > x)
            .map(|p| p.0)
            .collect();

        'search: for &bottom in &below {
            if !vertically_joined(vertical, x, y, bottom, tolerance) {
                continue;
            }
            for &edge_x in &right {
                if !horizontally_joined(horizontal, y, x, edge_x, tolerance) {
                    continue;
                }
                if has_point(edge_x, bottom)
                    && horizontally_joined(horizontal, bottom, x, edge_x, tolerance)
                    && vertically_joined(vertical, edge_x, y, bottom, tolerance)
                {
                    cells.push(Rect::new(x, y, edge_x, bottom));
                    break 'search;
                }
            }
        }
    }
    cells
}

fn corners(r: &Rect) -> [Point; 4] {
    [(r.x0, r.y0), (r.x1, r.y0), (r.x0, r.y1), (r.x1, r.y1)]
}

fn shares_corner(a: &Rect, b: &Rect) -> bool {
    let theirs = corners(b);
    corners(a)
        .iter()
        .any(|p| theirs.iter().any(|q| same(p.0, q.0) && same(p.1, q.1)))
}

/// Partitions cells into tables: connected components under "shares a corner".
fn group_cells(mut remaining: Vec<Rect>) -> Vec<Vec<Rect>> {
    let mut groups = Vec::new();
    while let Some(seed) = remaining.pop() {
        let mut group = vec![seed];
        let mut i = 0;
        while i < group.len() {
            let cell = group[i];
            let (touching, rest): (Vec<Rect>, Vec<Rect>) = remaining
                .into_iter()
                .partition(|other| shares_corner(&cell, other));
            remaining = rest;
            group.extend(touching);
            i += 1;
        }
        groups.push(group);
    }
    groups
}

/// Lays a table's cells out on the grid of their distinct top and left
/// coordinates. A cell spanning several columns lands in its leftmost one.
fn build_table(cells: &[Rect], glyphs: &[Glyph]) -> Table {
    let mut tops: Vec<f32> = cells.iter().map(|c| c.y0).collect();
    tops.sort_by(f32::total_cmp);
    tops.dedup_by(|a, b| same(*a, *b));
    let mut lefts: Vec<f32> = cells.iter().map(|c| c.x0).collect();
    lefts.sort_by(f32::total_cmp);
    lefts.dedup_by(|a, b| same(*a, *b));

    let mut grid = vec![vec![String::new(); lefts.len()]; tops.len()];
    let mut rect = cells[0];
    for cell in cells {
        rect = rect.union(cell);
        let row = tops.iter().position(|t| same(*t, cell.y0));
        let col = lefts.iter().position(|l| same(*l, cell.x0));
        if let (Some(row), Some(col)) = (row, col) {
            grid[row][col] = cell_text(cell, glyphs);
        }
    }

    let mut rows = grid.into_iter();
    let header = rows.next().unwrap_or_default();
    Table {
        rect,
        header,
        rows: rows.collect(),
    }
}

/// Text of the glyphs centred inside `cell`, one line per visual line.
fn cell_text(cell: &Rect, glyphs: &[Glyph]) -> String {
    let mut inside: Vec<&Glyph> = glyphs
        .iter()
        .filter(|g| cell.contains_point(g.rect.center_x(), g.rect.center_y()))
        .collect();
    inside.sort_by(|a, b| {
        a.rect
            .center_y()
            .total_cmp(&b.rect.center_y())
            .then(a.rect.x0.total_cmp(&b.rect.x0))
    });

    let mut lines: Vec<(Rect, Vec<&Glyph>)> = Vec::new();
    for glyph in inside {
        match lines.last_mut() {
            Some((rect, members))
                if rect.vertical_overlap(&glyph.rect)
                    >= 0.5 * rect.height().min(glyph.rect.height()) =>
            {
                *rect = rect.union(&glyph.rect);
                members.push(glyph);
            }
            _ => lines.push((glyph.rect, vec![glyph])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.rect.x0.total_cmp(&b.rect.x0));
            let raw: String = members.iter().map(|g| g.ch).collect();
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
