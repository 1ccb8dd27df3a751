use std::collections::BTreeSet;

use crate::error::Result;
use crate::grid::{GridMap, SelectionRectangle, SelectionRectangularizer, locate_selection, structure};
use crate::model::{Commit, Document, Fragment, MarkerRegistry, NodeId, Tree};

use super::classify::ContentClassifier;
use super::options::{MarkerConflict, TransplantOptions};
use super::sentinel::{Coverage, DecodeMode, MarkerSentinelCodec, Region, SentinelMap};
use super::transplant::{GridTransplantEngine, SlotHook};

/// Result of a cut.
#[derive(Debug, Clone)]
pub struct CutOutcome {
    pub fragment: Fragment,
    pub commit: Commit,
}

/// Result of a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// The clipboard does not hold a lone grid; insert it as generic content.
    Fallback,
    /// No destination cells were selected.
    NothingToDo,
    Pasted {
        /// Cells to select afterwards, row-major
        selection: Vec<NodeId>,
        rectangle: SelectionRectangle,
        commit: Commit,
    },
}

/// Region copied out of a document, with the sentinels it was encoded with.
struct Extraction {
    fragment: Fragment,
    cells: Vec<NodeId>,
    sentinels: SentinelMap,
}

/// Copy, cut and paste of grid regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clipboard {
    engine: GridTransplantEngine,
}

impl Clipboard {
    pub fn new(options: TransplantOptions) -> Self {
        Self {
            engine: GridTransplantEngine::new(options),
        }
    }

    pub fn options(&self) -> &TransplantOptions {
        self.engine.options()
    }

    /// Copy the bounding rectangle of `cells` into a new fragment.
    ///
    /// The document is left exactly as it was. Markers overlapping the copied
    /// cells travel along, clamped to the fragment where they reach outside.
    pub fn copy(&self, doc: &mut Document, cells: &[NodeId]) -> Result<Option<Fragment>> {
        let mut tx = doc.transaction();
        let extraction = Self::extract(&mut tx, cells)?;
        tx.rollback();
        Ok(extraction.map(|e| e.fragment))
    }

    /// Copy `cells` into a fragment, then empty them.
    ///
    /// Markers lying entirely inside the cut go with the fragment and leave
    /// the document. A marker starting outside and ending in the cut runs
    /// from the document start to its former end; one starting in the cut
    /// and ending outside runs to the end of the last emptied cell.
    pub fn cut(&self, doc: &mut Document, cells: &[NodeId]) -> Result<Option<CutOutcome>> {
        let mut tx = doc.transaction();
        let Some(extraction) = Self::extract(&mut tx, cells)? else {
            return Ok(None);
        };

        for &cell in &extraction.cells {
            Self::clear(tx.tree_mut(), cell);
        }

        let in_place: SentinelMap = extraction
            .sentinels
            .iter()
            .map(|(name, encoded)| {
                let mut encoded = encoded.clone();
                encoded.mode = DecodeMode::InPlace;
                (name.clone(), encoded)
            })
            .collect();
        let root = tx.root();
        let last = extraction.cells.last().copied().unwrap_or(root);
        let decoding = MarkerSentinelCodec::decode(tx.tree_mut(), root, &in_place, last);
        for marker in decoding.markers {
            match marker.coverage {
                Coverage::Both => {
                    tx.markers_mut().remove(&marker.name);
                }
                _ => {
                    tx.markers_mut().set(marker.name, marker.range);
                }
            }
        }
        for name in decoding.lost {
            tx.markers_mut().remove(&name);
        }
        MarkerSentinelCodec::ensure_drained(tx.tree(), root)?;

        let commit = tx.commit();
        log::debug!("cut {} cells", extraction.cells.len());
        Ok(Some(CutOutcome {
            fragment: extraction.fragment,
            commit,
        }))
    }

    /// Paste `fragment` over the selected `cells`.
    ///
    /// Everything is validated before the document changes; on any error the
    /// document is left untouched.
    pub fn paste(
        &self,
        doc: &mut Document,
        fragment: &Fragment,
        cells: &[NodeId],
        hook: &mut dyn SlotHook,
    ) -> Result<PasteOutcome> {
        let Some(pasted_grid) = ContentClassifier::classify(fragment.tree(), fragment.root())
        else {
            log::debug!("clipboard content is not a lone grid");
            return Ok(PasteOutcome::Fallback);
        };
        if cells.is_empty() {
            return Ok(PasteOutcome::NothingToDo);
        }
        let (destination, _) = locate_selection(doc.tree(), cells)?;

        let (incoming, replaced) = self.resolve_names(doc.markers(), fragment.markers());
        let mut source = fragment.clone();
        let pasted_region = Region::grid(&GridMap::build(source.tree(), pasted_grid)?);
        let mut sentinels = MarkerSentinelCodec::encode(
            source.tree_mut(),
            &incoming,
            &pasted_region,
            DecodeMode::Fragment,
        );

        let mut tx = doc.transaction();
        for name in &replaced {
            tx.markers_mut().remove(name);
        }
        let (tree, markers) = tx.parts_mut();
        let mut own =
            MarkerSentinelCodec::encode(tree, markers, &Region::grid(&destination), DecodeMode::InPlace);
        own.append(&mut sentinels);

        let Some(transplanted) =
            self.engine
                .transplant(tx.tree_mut(), source.tree(), pasted_grid, cells, hook)?
        else {
            return Ok(PasteOutcome::NothingToDo);
        };

        let last = match transplanted.cells.last() {
            Some(&last) => last,
            None => GridMap::build(tx.tree(), transplanted.grid)?
                .cells()
                .last()
                .map_or(transplanted.grid, |cref| cref.cell),
        };
        let root = tx.root();
        let decoding = MarkerSentinelCodec::decode(tx.tree_mut(), root, &own, last);
        for marker in decoding.markers {
            tx.markers_mut().set(marker.name, marker.range);
        }
        for name in decoding.lost {
            tx.markers_mut().remove(&name);
        }
        MarkerSentinelCodec::ensure_drained(tx.tree(), root)?;

        let commit = tx.commit();
        Ok(PasteOutcome::Pasted {
            selection: transplanted.cells,
            rectangle: transplanted.rectangle,
            commit,
        })
    }

    /// Fragment markers under the names they get in the document, plus the
    /// document markers they replace.
    fn resolve_names(
        &self,
        existing: &MarkerRegistry,
        pasted: &MarkerRegistry,
    ) -> (MarkerRegistry, BTreeSet<String>) {
        let mut incoming = MarkerRegistry::new();
        let mut replaced = BTreeSet::new();
        for marker in pasted.iter() {
            if !existing.contains(&marker.name) {
                incoming.set(marker.name, marker.range);
                continue;
            }
            match self.options().marker_conflict {
                MarkerConflict::Rename => {
                    let name = existing.unique_name(&marker.name, |candidate| {
                        pasted.contains(candidate) || incoming.contains(candidate)
                    });
                    log::warn!("pasted marker `{}` renamed to `{name}`", marker.name);
                    incoming.set(name, marker.range);
                }
                MarkerConflict::Replace => {
                    replaced.insert(marker.name.clone());
                    incoming.set(marker.name, marker.range);
                }
                MarkerConflict::Skip => {
                    log::warn!("pasted marker `{}` skipped, name in use", marker.name);
                }
            }
        }
        (incoming, replaced)
    }

    fn extract(doc: &mut Document, cells: &[NodeId]) -> Result<Option<Extraction>> {
        let Some(bounds) = SelectionRectangularizer::new(false).bounds(doc.tree(), cells, None)?
        else {
            return Ok(None);
        };
        let map = GridMap::build(doc.tree(), bounds.grid)?;
        let region: Vec<NodeId> = map
            .cells()
            .iter()
            .filter(|c| bounds.rectangle.contains(c.row, c.column))
            .map(|c| c.cell)
            .collect();
        let region = Region::cells(doc.tree(), &region);

        let (tree, markers) = doc.parts_mut();
        let sentinels = MarkerSentinelCodec::encode(tree, markers, &region, DecodeMode::Fragment);

        let mut fragment = Fragment::new();
        let cropped =
            structure::crop_into(doc.tree(), bounds.grid, bounds.rectangle, fragment.tree_mut())?;
        fragment.push(cropped);

        let root = fragment.root();
        let decoding = MarkerSentinelCodec::decode(fragment.tree_mut(), root, &sentinels, root);
        for marker in decoding.markers {
            fragment.markers_mut().set(marker.name, marker.range);
        }
        MarkerSentinelCodec::ensure_drained(fragment.tree(), root)?;

        log::debug!("extracted {:?} from grid {:?}", bounds.rectangle, bounds.grid);
        Ok(Some(Extraction {
            fragment,
            cells: region.containers().to_vec(),
            sentinels,
        }))
    }

    /// Drop a cell's content and leave an empty paragraph behind. Sentinels
    /// found anywhere in the content stay in the cell.
    fn clear(tree: &mut Tree, cell: NodeId) {
        let sentinels = MarkerSentinelCodec::salvage(tree, cell);
        for child in tree.children(cell).to_vec() {
            tree.discard(child);
        }
        let paragraph = tree.create_paragraph("");
        tree.append(cell, paragraph);
        MarkerSentinelCodec::rehome(tree, cell, &sentinels);
    }
}
