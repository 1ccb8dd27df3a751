// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use gridclip_engine::model::{CellSpec, Document, GridSpec, NodeId, cell};

#[allow(dead_code)]
pub fn labelled_grid(height: usize, width: usize) -> GridSpec {
    GridSpec::filled(height, width, |r, c| format!("r{r}c{c}"))
}

/// Grid whose every other row starts with a two-row, two-column span.
#[allow(dead_code)]
pub fn spanning_grid(height: usize, width: usize) -> GridSpec {
    let rows = (0..height)
        .map(|r| {
            let mut row: Vec<CellSpec> = Vec::new();
            let mut column = 0;
            if r % 2 == 0 && r + 1 < height && width >= 2 {
                row.push(cell(&format!("s{r}")).rows(2).cols(2));
                column = 2;
            } else if r % 2 == 1 && width >= 2 {
                column = 2;
            }
            row.extend((column..width).map(|c| cell(&format!("r{r}c{c}"))));
            row
        })
        .collect();
    GridSpec::new(rows)
}

/// A document holding one grid built from `spec`.
#[allow(dead_code)]
pub fn document_with(spec: &GridSpec) -> (Document, NodeId) {
    let mut doc = Document::new();
    let grid = spec.build(doc.tree_mut());
    doc.push(grid);
    (doc, grid)
}
