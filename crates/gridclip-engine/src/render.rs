//! Plain-text previews of documents, grids and markers.
//!
//! Grid rows are printed one per line, slots separated by ` | `. A cell is
//! shown by its text at its anchor slot, with `[rows x cols]` appended when
//! it spans. Slots covered from the left show `<`, slots covered from above
//! show `^`, uncovered slots show `.`.

use std::fmt::Write;

use crate::error::Result;
use crate::grid::GridMap;
use crate::model::{Document, NodeId, NodeKind, Position, Tree};

const EMPTY_CELL: &str = "_";

pub fn render_grid(tree: &Tree, grid: NodeId) -> Result<String> {
    let map = GridMap::build(tree, grid)?;
    let dimensions = map.dimensions();
    let mut out = format!(
        "grid {}x{}, headings {}/{}\n",
        dimensions.height,
        dimensions.width,
        map.heading_rows(),
        map.heading_columns()
    );

    for row in 0..dimensions.height {
        let line: Vec<String> = (0..dimensions.width)
            .map(|column| match map.slot(row, column) {
                None => ".".to_string(),
                Some(cref) if cref.row == row && cref.column == column => {
                    let text = tree.text_content(cref.cell);
                    let text = if text.is_empty() { EMPTY_CELL } else { text.as_str() };
                    if cref.row_span > 1 || cref.col_span > 1 {
                        format!("{text}[{}x{}]", cref.row_span, cref.col_span)
                    } else {
                        text.to_string()
                    }
                }
                Some(cref) if cref.row == row => "<".to_string(),
                Some(_) => "^".to_string(),
            })
            .collect();
        out.push_str(&line.join(" | "));
        out.push('\n');
    }
    Ok(out)
}

/// Top-level blocks of a document, grids expanded, then its markers.
pub fn render_document(doc: &Document) -> Result<String> {
    let tree = doc.tree();
    let mut out = String::new();
    for &block in tree.children(doc.root()) {
        match tree.kind(block) {
            NodeKind::Grid { .. } => out.push_str(&render_grid(tree, block)?),
            _ => {
                out.push_str(&tree.text_content(block));
                out.push('\n');
            }
        }
    }
    if !doc.markers().is_empty() {
        out.push_str("markers:\n");
        out.push_str(&render_markers(doc));
    }
    Ok(out)
}

/// One line per marker, in name order, with root paths of both boundaries.
pub fn render_markers(doc: &Document) -> String {
    let tree = doc.tree();
    let mut out = String::new();
    for marker in doc.markers().iter() {
        let _ = writeln!(
            out,
            "  {} {}..{}",
            marker.name,
            describe(tree, marker.range.start),
            describe(tree, marker.range.end)
        );
    }
    out
}

fn describe(tree: &Tree, position: Position) -> String {
    if !tree.contains(position.parent) {
        return "<detached>".to_string();
    }
    format!("{:?}", tree.position_path(position))
}
