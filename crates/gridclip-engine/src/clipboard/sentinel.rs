//! Marker ranges carried through structural edits as sentinel nodes.
//!
//! Marker boundaries are plain positions and go stale as soon as the nodes
//! around them move. Before an edit, every boundary falling inside the edited
//! region is swapped for a sentinel leaf that travels with its cell; after
//! the edit the ranges are rebuilt from wherever the sentinels ended up.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::error::{ClipboardError, Result};
use crate::grid::GridMap;
use crate::model::{Boundary, MarkerRegistry, NodeId, NodeKind, Position, Range, Tree};

/// The part of a tree whose marker boundaries get encoded.
///
/// Positions inside one of the containers are encoded where they are.
/// Positions inside the hull but between containers (row or grid level) snap
/// to the start of the next container, or the end of the last one.
#[derive(Debug, Clone, Default)]
pub struct Region {
    hull: Option<NodeId>,
    containers: Vec<NodeId>,
}

impl Region {
    /// Region made of the given cells only.
    pub fn cells(tree: &Tree, cells: &[NodeId]) -> Self {
        let mut containers = cells.to_vec();
        containers.sort_by_cached_key(|&cell| tree.path(cell));
        containers.dedup();
        Self {
            hull: None,
            containers,
        }
    }

    /// Region covering a whole grid, structural positions included.
    pub fn grid(map: &GridMap) -> Self {
        Self {
            hull: Some(map.grid()),
            containers: map.cells().iter().map(|cref| cref.cell).collect(),
        }
    }

    pub fn containers(&self) -> &[NodeId] {
        &self.containers
    }

    /// Where a sentinel for `position` goes, `None` when outside the region.
    fn locate(&self, tree: &Tree, position: Position) -> Option<Position> {
        if self
            .containers
            .iter()
            .any(|&c| tree.is_position_inside(position, c))
        {
            return Some(position);
        }
        let hull = self.hull?;
        if !tree.is_position_inside(position, hull) {
            return None;
        }
        self.containers
            .iter()
            .map(|&c| Position::at_start(c))
            .find(|&start| tree.compare(position, start) != Ordering::Greater)
            .or_else(|| self.containers.last().map(|&c| tree.at_end(c)))
    }

    /// Markers overlapping or touching any container or the hull, by name.
    fn candidates(&self, tree: &Tree, markers: &MarkerRegistry) -> BTreeMap<String, Range> {
        self.containers
            .iter()
            .chain(self.hull.iter())
            .flat_map(|&node| markers.intersecting(tree, &tree.range_in(node)))
            .map(|marker| (marker.name, marker.range))
            .collect()
    }
}

/// How a marker enclosing the whole region is rebuilt on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// The region became a standalone fragment: the marker covers all of it.
    Fragment,
    /// The region was edited in place: the marker keeps its original range.
    InPlace,
}

/// What was recorded for one marker at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMarker {
    pub original: Range,
    pub has_start: bool,
    pub has_end: bool,
    pub mode: DecodeMode,
}

impl EncodedMarker {
    /// Both boundaries lie outside the region.
    pub fn is_enclosing(&self) -> bool {
        !self.has_start && !self.has_end
    }
}

/// Encoded markers by name.
pub type SentinelMap = BTreeMap<String, EncodedMarker>;

/// How a decoded range was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Both,
    LoneStart,
    LoneEnd,
    Enclosing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMarker {
    pub name: String,
    pub range: Range,
    pub coverage: Coverage,
}

/// Result of a decode pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoding {
    pub markers: Vec<DecodedMarker>,
    /// Markers whose sentinels were all destroyed by the edit
    pub lost: Vec<String>,
}

/// Encoder and decoder of marker sentinels.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerSentinelCodec;

impl MarkerSentinelCodec {
    /// Insert a sentinel for every boundary of `markers` inside `region`.
    ///
    /// Markers intersecting the region without a boundary inside it are
    /// recorded as enclosing. Other markers are not recorded at all.
    pub fn encode(
        tree: &mut Tree,
        markers: &MarkerRegistry,
        region: &Region,
        mode: DecodeMode,
    ) -> SentinelMap {
        let mut map = SentinelMap::new();
        let mut pending = Vec::new();

        for (name, range) in region.candidates(tree, markers) {
            let start = region.locate(tree, range.start);
            let end = region.locate(tree, range.end);
            if let Some(position) = start {
                let path = tree.position_path(position);
                pending.push((path, position, Boundary::Start, name.clone()));
            }
            if let Some(position) = end {
                let path = tree.position_path(position);
                pending.push((path, position, Boundary::End, name.clone()));
            }
            map.insert(
                name,
                EncodedMarker {
                    original: range,
                    has_start: start.is_some(),
                    has_end: end.is_some(),
                    mode,
                },
            );
        }

        // Deepest and latest first, so earlier positions stay valid. At equal
        // positions ends go in first and end up after the starts.
        pending.sort_by(|a, b| {
            b.0.cmp(&a.0).then_with(|| match (a.2, b.2) {
                (Boundary::End, Boundary::Start) => Ordering::Less,
                (Boundary::Start, Boundary::End) => Ordering::Greater,
                _ => Ordering::Equal,
            })
        });
        for (_, position, boundary, marker) in pending {
            let sentinel = tree.create(NodeKind::Sentinel { marker, boundary });
            tree.insert_at(position, sentinel);
        }

        log::debug!("encoded {} markers as sentinels", map.len());
        map
    }

    /// Rebuild the ranges of every marker in `map` from the sentinels found
    /// under `scope`, then discard every sentinel under `scope`.
    ///
    /// The rebuilt region runs from the start of `scope` to the end of
    /// `last`, the last node the edit produced. A lone end sentinel reaches
    /// back to the region start, a lone start sentinel forward to its end.
    pub fn decode(tree: &mut Tree, scope: NodeId, map: &SentinelMap, last: NodeId) -> Decoding {
        let mut found: HashMap<(&str, Boundary), Position> = HashMap::new();
        let mut consumed = Vec::new();
        for node in tree.descendants(scope) {
            let NodeKind::Sentinel { marker, boundary } = tree.kind(node) else {
                continue;
            };
            match map.get_key_value(marker.as_str()) {
                Some((name, _)) => {
                    if let Some(position) = Self::effective_position(tree, node) {
                        found.entry((name.as_str(), *boundary)).or_insert(position);
                    }
                }
                None => log::warn!("discarding stray sentinel of marker `{marker}`"),
            }
            consumed.push(node);
        }

        let region_start = Position::at_start(scope);
        let region_end = Self::content_end(tree, last);
        let mut decoding = Decoding::default();

        for (name, encoded) in map {
            let start = found.get(&(name.as_str(), Boundary::Start)).copied();
            let end = found.get(&(name.as_str(), Boundary::End)).copied();

            let (range, coverage) = match (start, end) {
                (Some(start), Some(end)) => (Range::new(start, end), Coverage::Both),
                (Some(start), None) => (Range::new(start, region_end), Coverage::LoneStart),
                (None, Some(end)) => (Range::new(region_start, end), Coverage::LoneEnd),
                (None, None) if encoded.is_enclosing() => {
                    let range = match encoded.mode {
                        DecodeMode::Fragment => Range::new(region_start, region_end),
                        DecodeMode::InPlace => encoded.original,
                    };
                    (range, Coverage::Enclosing)
                }
                (None, None) => {
                    log::warn!("marker `{name}` lost all of its sentinels");
                    decoding.lost.push(name.clone());
                    continue;
                }
            };

            let range = match tree.compare(range.start, range.end) {
                Ordering::Greater => Range::new(range.end, range.start),
                _ => range,
            };
            decoding.markers.push(DecodedMarker {
                name: name.clone(),
                range,
                coverage,
            });
        }

        for sentinel in consumed {
            tree.discard(sentinel);
        }
        decoding
    }

    /// Position of a sentinel as if no sentinel existed in its parent.
    fn effective_position(tree: &Tree, sentinel: NodeId) -> Option<Position> {
        let parent = tree.parent(sentinel)?;
        let offset = tree
            .children(parent)
            .iter()
            .take_while(|&&child| child != sentinel)
            .filter(|&&child| !tree.kind(child).is_sentinel())
            .count();
        Some(Position::new(parent, offset))
    }

    /// End of `node`'s content, not counting sentinel children.
    fn content_end(tree: &Tree, node: NodeId) -> Position {
        let offset = tree
            .children(node)
            .iter()
            .filter(|&&child| !tree.kind(child).is_sentinel())
            .count();
        Position::new(node, offset)
    }

    /// Detach the sentinels of a cell about to be removed, in document order.
    pub fn salvage(tree: &mut Tree, cell: NodeId) -> Vec<NodeId> {
        let sentinels: Vec<NodeId> = tree
            .descendants(cell)
            .into_iter()
            .filter(|&node| tree.kind(node).is_sentinel())
            .collect();
        for &sentinel in &sentinels {
            tree.detach(sentinel);
        }
        sentinels
    }

    /// Put salvaged sentinels into `cell`: starts at its beginning, ends at
    /// its end, each group keeping its order.
    pub fn rehome(tree: &mut Tree, cell: NodeId, sentinels: &[NodeId]) {
        let mut offset = 0;
        for &sentinel in sentinels {
            match tree.kind(sentinel) {
                NodeKind::Sentinel {
                    boundary: Boundary::Start,
                    ..
                } => {
                    tree.insert(cell, offset, sentinel);
                    offset += 1;
                }
                _ => tree.append(cell, sentinel),
            }
        }
    }

    /// Fail when any sentinel is still attached under `scope`.
    pub fn ensure_drained(tree: &Tree, scope: NodeId) -> Result<()> {
        let leaked = tree
            .descendants(scope)
            .into_iter()
            .find_map(|node| match tree.kind(node) {
                NodeKind::Sentinel { marker, .. } => Some(marker.clone()),
                _ => None,
            });
        match leaked {
            Some(marker) => Err(ClipboardError::SentinelLeak { marker }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GridSpec, cell};
    use pretty_assertions::assert_eq;

    struct Fixture {
        tree: Tree,
        root: NodeId,
        grid: NodeId,
        cells: Vec<NodeId>,
    }

    /// `before` paragraph, a 1x3 grid, `after` paragraph.
    fn fixture() -> Fixture {
        let mut tree = Tree::new();
        let root = tree.create(NodeKind::Root);
        let before = tree.create_paragraph("before");
        let grid = GridSpec::new(vec![vec![cell("a"), cell("b"), cell("c")]]).build(&mut tree);
        let after = tree.create_paragraph("after");
        tree.append(root, before);
        tree.append(root, grid);
        tree.append(root, after);
        let cells = tree.children(tree.children(grid)[0]).to_vec();
        Fixture {
            tree,
            root,
            grid,
            cells,
        }
    }

    fn sentinel_count(tree: &Tree, scope: NodeId) -> usize {
        tree.descendants(scope)
            .into_iter()
            .filter(|&n| tree.kind(n).is_sentinel())
            .count()
    }

    #[test]
    fn test_roundtrip_without_edit_restores_ranges() {
        let Fixture {
            mut tree,
            root,
            cells,
            ..
        } = fixture();
        let mut markers = MarkerRegistry::new();
        let inside = Range::new(Position::new(cells[0], 0), Position::new(cells[1], 1));
        let collapsed = Range::collapsed(Position::new(cells[2], 1));
        markers.set("inside", inside);
        markers.set("collapsed", collapsed);

        let region = Region::cells(&tree, &cells);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::InPlace);
        assert_eq!(sentinel_count(&tree, root), 4);

        let decoding = MarkerSentinelCodec::decode(&mut tree, root, &map, cells[2]);

        assert_eq!(sentinel_count(&tree, root), 0);
        assert!(decoding.lost.is_empty());
        let ranges: BTreeMap<String, Range> = decoding
            .markers
            .into_iter()
            .map(|m| (m.name, m.range))
            .collect();
        assert_eq!(ranges["inside"], inside);
        assert_eq!(ranges["collapsed"], collapsed);
    }

    #[test]
    fn test_markers_outside_region_are_ignored() {
        let Fixture {
            mut tree,
            root,
            cells,
            ..
        } = fixture();
        let mut markers = MarkerRegistry::new();
        markers.set(
            "before",
            Range::new(Position::new(root, 0), Position::new(root, 1)),
        );

        let region = Region::cells(&tree, &cells);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::InPlace);

        assert!(map.is_empty());
        assert_eq!(sentinel_count(&tree, root), 0);
    }

    #[test]
    fn test_lone_end_reaches_back_to_scope_start() {
        let Fixture {
            mut tree,
            root,
            cells,
            ..
        } = fixture();
        let mut markers = MarkerRegistry::new();
        markers.set(
            "straddle",
            Range::new(Position::new(root, 1), Position::new(cells[1], 1)),
        );

        let region = Region::cells(&tree, &cells[1..2]);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::InPlace);
        let decoding = MarkerSentinelCodec::decode(&mut tree, root, &map, cells[1]);

        assert_eq!(
            decoding.markers,
            vec![DecodedMarker {
                name: "straddle".into(),
                range: Range::new(Position::at_start(root), Position::new(cells[1], 1)),
                coverage: Coverage::LoneEnd,
            }]
        );
    }

    #[test]
    fn test_lone_start_reaches_to_end_of_last_node() {
        let Fixture {
            mut tree,
            root,
            cells,
            ..
        } = fixture();
        let mut markers = MarkerRegistry::new();
        markers.set(
            "trailing",
            Range::new(Position::new(cells[0], 0), Position::new(root, 3)),
        );

        let region = Region::cells(&tree, &cells[..2]);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::InPlace);
        assert_eq!(sentinel_count(&tree, root), 1);
        let decoding = MarkerSentinelCodec::decode(&mut tree, root, &map, cells[1]);

        assert_eq!(sentinel_count(&tree, root), 0);
        assert_eq!(
            decoding.markers,
            vec![DecodedMarker {
                name: "trailing".into(),
                range: Range::new(Position::new(cells[0], 0), tree.at_end(cells[1])),
                coverage: Coverage::LoneStart,
            }]
        );
    }

    #[test]
    fn test_enclosing_marker_in_fragment_covers_whole_scope() {
        let Fixture {
            mut tree,
            root,
            cells,
            ..
        } = fixture();
        let mut markers = MarkerRegistry::new();
        markers.set("all", Range::new(Position::new(root, 0), Position::new(root, 3)));

        let region = Region::cells(&tree, &cells[1..2]);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::Fragment);
        let decoding = MarkerSentinelCodec::decode(&mut tree, cells[1], &map, cells[1]);

        assert_eq!(decoding.markers[0].coverage, Coverage::Enclosing);
        assert_eq!(decoding.markers[0].range, tree.range_in(cells[1]));
    }

    #[test]
    fn test_destroyed_sentinels_drop_the_marker() {
        let Fixture {
            mut tree,
            root,
            cells,
            ..
        } = fixture();
        let mut markers = MarkerRegistry::new();
        markers.set("doomed", tree.range_in(cells[0]));

        let region = Region::cells(&tree, &cells);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::InPlace);
        tree.discard(cells[0]);
        let decoding = MarkerSentinelCodec::decode(&mut tree, root, &map, cells[2]);

        assert!(decoding.markers.is_empty());
        assert_eq!(decoding.lost, vec!["doomed".to_string()]);
    }

    #[test]
    fn test_structural_positions_snap_into_cells() {
        let Fixture {
            mut tree,
            root,
            grid,
            cells,
        } = fixture();
        let row = tree.children(grid)[0];
        let mut markers = MarkerRegistry::new();
        markers.set(
            "between",
            Range::new(Position::new(row, 1), Position::new(row, 3)),
        );

        let map_of_grid = GridMap::build(&tree, grid).unwrap();
        let region = Region::grid(&map_of_grid);
        let map = MarkerSentinelCodec::encode(&mut tree, &markers, &region, DecodeMode::InPlace);
        let decoding = MarkerSentinelCodec::decode(&mut tree, root, &map, cells[2]);

        assert_eq!(
            decoding.markers[0].range,
            Range::new(Position::at_start(cells[1]), tree.at_end(cells[2]))
        );
    }

    #[test]
    fn test_salvage_and_rehome_move_sentinels() {
        let Fixture { mut tree, cells, .. } = fixture();
        let start = tree.create(NodeKind::Sentinel {
            marker: "m".into(),
            boundary: Boundary::Start,
        });
        let end = tree.create(NodeKind::Sentinel {
            marker: "m".into(),
            boundary: Boundary::End,
        });
        tree.insert(cells[0], 0, end);
        tree.append(cells[0], start);

        let salvaged = MarkerSentinelCodec::salvage(&mut tree, cells[0]);
        MarkerSentinelCodec::rehome(&mut tree, cells[2], &salvaged);

        assert_eq!(tree.children(cells[0]).len(), 1);
        let children = tree.children(cells[2]);
        assert_eq!(children.first(), Some(&start));
        assert_eq!(children.last(), Some(&end));
    }

    #[test]
    fn test_decode_discards_sentinels_of_unknown_markers() {
        let Fixture {
            mut tree, root, cells, ..
        } = fixture();
        let stray = tree.create(NodeKind::Sentinel {
            marker: "stray".into(),
            boundary: Boundary::Start,
        });
        tree.insert(cells[0], 0, stray);

        let decoding = MarkerSentinelCodec::decode(&mut tree, root, &SentinelMap::new(), cells[2]);

        assert_eq!(decoding, Decoding::default());
        assert_eq!(sentinel_count(&tree, root), 0);
        assert_eq!(MarkerSentinelCodec::ensure_drained(&tree, root), Ok(()));
    }

    #[test]
    fn test_leftover_sentinel_is_reported() {
        let Fixture {
            mut tree, root, cells, ..
        } = fixture();
        let stray = tree.create(NodeKind::Sentinel {
            marker: "stray".into(),
            boundary: Boundary::End,
        });
        tree.append(cells[1], stray);

        assert_eq!(
            MarkerSentinelCodec::ensure_drained(&tree, root),
            Err(ClipboardError::SentinelLeak {
                marker: "stray".into()
            })
        );
    }
}
