use anyhow::{Result, anyhow};
use gridclip_engine::grid::GridMap;
use gridclip_engine::model::{GridSpec, cell};
use gridclip_engine::{
    Clipboard, Document, Fragment, GridDimensions, GridWalker, NodeId, PassThrough, PasteOutcome,
    Range, SelectionRectangle, TransplantOptions,
};

/// Playground state: one document holding a single grid, a slot cursor with
/// a selection anchor, and whatever was last copied or cut.
pub struct App {
    pub doc: Document,
    pub grid: NodeId,
    pub held: Option<Fragment>,
    pub anchor: (usize, usize),
    pub cursor: (usize, usize),
    pub status: String,
    clipboard: Clipboard,
}

impl App {
    pub fn new(options: TransplantOptions) -> Result<Self> {
        let mut doc = Document::new();
        let intro = doc.tree_mut().create_paragraph("Quarterly figures");
        doc.push(intro);

        let grid = GridSpec::new(vec![
            vec![cell(""), cell("Q1"), cell("Q2"), cell("Q3"), cell("Q4")],
            vec![cell("North"), cell("12"), cell("15").cols(2), cell("9")],
            vec![cell("South").rows(2), cell("7"), cell("8"), cell("11"), cell("10")],
            vec![cell("5"), cell("6"), cell("4"), cell("3")],
            vec![cell("East"), cell("1"), cell("2"), cell("3"), cell("4")],
        ])
        .headings(1, 1)
        .build(doc.tree_mut());
        doc.push(grid);

        let outro = doc.tree_mut().create_paragraph("Figures in thousands");
        doc.push(outro);

        let reviewed = GridMap::build(doc.tree(), grid)?
            .slot(1, 1)
            .map(|cref| cref.cell)
            .ok_or_else(|| anyhow!("demo grid has no cell at (1, 1)"))?;
        let range = doc.tree().range_in(reviewed);
        doc.markers_mut().set("review", range);

        Ok(Self {
            doc,
            grid,
            held: None,
            anchor: (1, 1),
            cursor: (1, 1),
            status: "Ready".to_string(),
            clipboard: Clipboard::new(options),
        })
    }

    pub fn dimensions(&self) -> Result<GridDimensions> {
        Ok(GridMap::build(self.doc.tree(), self.grid)?.dimensions())
    }

    pub fn selection(&self) -> SelectionRectangle {
        SelectionRectangle::new(self.anchor.0, self.cursor.0, self.anchor.1, self.cursor.1)
    }

    /// Cells covering any slot of the selection, in walk order.
    pub fn selected_cells(&self) -> Result<Vec<NodeId>> {
        let walker = GridWalker::new(self.doc.tree(), self.grid)?
            .within(self.selection())?
            .include_all_slots(true);
        let mut cells = Vec::new();
        for slot in &walker {
            if !cells.contains(&slot.cell) {
                cells.push(slot.cell);
            }
        }
        Ok(cells)
    }

    pub fn move_cursor(&mut self, rows: isize, columns: isize, extend: bool) -> Result<()> {
        let dimensions = self.dimensions()?;
        if dimensions.is_empty() {
            return Ok(());
        }
        let step = |value: usize, by: isize, len: usize| {
            value.saturating_add_signed(by).min(len.saturating_sub(1))
        };
        self.cursor = (
            step(self.cursor.0, rows, dimensions.height),
            step(self.cursor.1, columns, dimensions.width),
        );
        if !extend {
            self.anchor = self.cursor;
        }
        Ok(())
    }

    pub fn copy(&mut self) -> Result<()> {
        let cells = self.selected_cells()?;
        match self.clipboard.copy(&mut self.doc, &cells)? {
            Some(fragment) => {
                self.status = format!("Copied {} cells", cells.len());
                self.held = Some(fragment);
            }
            None => self.status = "Nothing selected".to_string(),
        }
        Ok(())
    }

    pub fn cut(&mut self) -> Result<()> {
        let cells = self.selected_cells()?;
        match self.clipboard.cut(&mut self.doc, &cells)? {
            Some(outcome) => {
                self.status = format!(
                    "Cut {} cells (version {})",
                    cells.len(),
                    outcome.commit.version
                );
                self.held = Some(outcome.fragment);
            }
            None => self.status = "Nothing selected".to_string(),
        }
        Ok(())
    }

    pub fn paste(&mut self) -> Result<()> {
        let Some(fragment) = &self.held else {
            self.status = "Clipboard is empty".to_string();
            return Ok(());
        };
        let cells = self.selected_cells()?;
        let outcome = self
            .clipboard
            .paste(&mut self.doc, fragment, &cells, &mut PassThrough)?;
        self.status = match outcome {
            PasteOutcome::Pasted {
                rectangle, commit, ..
            } => {
                self.anchor = (rectangle.first_row, rectangle.first_column);
                self.cursor = (rectangle.last_row, rectangle.last_column);
                format!(
                    "Pasted {}x{} (version {})",
                    rectangle.height(),
                    rectangle.width(),
                    commit.version
                )
            }
            PasteOutcome::Fallback => "Clipboard does not hold a grid".to_string(),
            PasteOutcome::NothingToDo => "Nothing selected".to_string(),
        };
        Ok(())
    }

    /// Register a new marker from the start of the first selected cell to the
    /// end of the last.
    pub fn mark(&mut self) -> Result<()> {
        let cells = self.selected_cells()?;
        let (Some(&first), Some(&last)) = (cells.first(), cells.last()) else {
            self.status = "Nothing selected".to_string();
            return Ok(());
        };
        let tree = self.doc.tree();
        let range = Range::new(tree.range_in(first).start, tree.range_in(last).end);
        let name = self.doc.markers().unique_name("note", |_| false);
        self.doc.markers_mut().set(name.clone(), range);
        log::info!("added marker {name}");
        self.status = format!("Added marker {name}");
        Ok(())
    }
}
