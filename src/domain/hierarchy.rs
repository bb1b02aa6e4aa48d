//! Hierarchy index over a flat item list.
//!
//! Built in one pass; positions refer back into the item slice the map was
//! built from, so the map is only meaningful next to that slice.

use std::collections::{BTreeMap, HashMap};

use tracing::instrument;

use crate::domain::entities::DimensionItem;

/// Lookup structures for one dimension: id, depth, parent and child edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyMap {
    by_id: HashMap<String, usize>,
    by_depth: BTreeMap<u32, Vec<usize>>,
    parents: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

impl HierarchyMap {
    /// Index `items`.
    ///
    /// Dangling `parent_id`/`children_ids` are recorded as-is; lookups through
    /// them answer `None` later. Duplicate ids resolve to the last occurrence.
    #[instrument(level = "debug", skip(items), fields(items = items.len()))]
    pub fn build(items: &[DimensionItem]) -> Self {
        let mut map = Self::default();

        for (position, item) in items.iter().enumerate() {
            map.by_id.insert(item.id.clone(), position);
            map.by_depth.entry(item.depth).or_default().push(position);

            if let Some(parent) = &item.parent_id {
                map.parents.insert(item.id.clone(), parent.clone());
            }
            if !item.children_ids.is_empty() {
                map.children
                    .insert(item.id.clone(), item.children_ids.clone());
            }
        }

        map
    }

    /// Position of `id` in the indexed slice.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Positions at `depth`, in input order.
    pub fn at_depth(&self, depth: u32) -> &[usize] {
        self.by_depth.get(&depth).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct depths, ascending.
    pub fn depths(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_depth.keys().copied()
    }

    pub fn parent_id(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    pub fn child_ids(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
