use std::collections::BTreeMap;

use super::position::Range;
use super::tree::Tree;

/// A named annotation over a document range (comment anchors and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    pub range: Range,
}

/// Markers of one document, unique by name.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: BTreeMap<String, Range>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or move a marker. Returns the previous range when the name existed.
    pub fn set(&mut self, name: impl Into<String>, range: Range) -> Option<Range> {
        self.markers.insert(name.into(), range)
    }

    pub fn remove(&mut self, name: &str) -> Option<Range> {
        self.markers.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Range> {
        self.markers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in name order.
    pub fn iter(&self) -> impl Iterator<Item = Marker> + '_ {
        self.markers.iter().map(|(name, range)| Marker {
            name: name.clone(),
            range: *range,
        })
    }

    /// Markers whose range overlaps or touches `range`.
    pub fn intersecting(&self, tree: &Tree, range: &Range) -> Vec<Marker> {
        self.iter()
            .filter(|marker| tree.intersects(&marker.range, range))
            .collect()
    }

    /// First of `base`, `base:1`, `base:2`, ... not taken by this registry
    /// nor rejected by `taken`.
    pub fn unique_name(&self, base: &str, taken: impl Fn(&str) -> bool) -> String {
        let free = |name: &str| !self.contains(name) && !taken(name);
        if free(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}:{n}"))
            .find(|name| free(name))
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Position};

    #[test]
    fn test_unique_name_skips_taken_names() {
        let mut tree = Tree::new();
        let root = tree.create(NodeKind::Root);
        let mut registry = MarkerRegistry::new();
        registry.set("comment", Range::collapsed(Position::at_start(root)));
        registry.set("comment:1", Range::collapsed(Position::at_start(root)));

        assert_eq!(registry.unique_name("comment", |_| false), "comment:2");
        assert_eq!(registry.unique_name("comment", |n| n == "comment:2"), "comment:3");
        assert_eq!(registry.unique_name("other", |_| false), "other");
    }

    #[test]
    fn test_intersecting_filters_by_range() {
        let mut tree = Tree::new();
        let root = tree.create(NodeKind::Root);
        for text in ["a", "b", "c"] {
            let p = tree.create_paragraph(text);
            tree.append(root, p);
        }
        let mut registry = MarkerRegistry::new();
        registry.set(
            "early",
            Range::new(Position::new(root, 0), Position::new(root, 1)),
        );
        registry.set(
            "late",
            Range::new(Position::new(root, 2), Position::new(root, 3)),
        );

        let hits = registry.intersecting(
            &tree,
            &Range::new(Position::new(root, 0), Position::new(root, 1)),
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "early");
    }
}
