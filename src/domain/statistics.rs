//! Structural statistics of a dimension.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::entities::DimensionItem;

/// Counts derived from a flat item list. Pure function of the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_items: usize,
    pub items_by_depth: BTreeMap<u32, usize>,
    pub leaf_nodes: usize,
    pub max_children: usize,
    /// One decimal place; "0.0" when no item has children
    pub average_children_per_parent: String,
}

impl Statistics {
    pub fn calculate(items: &[DimensionItem]) -> Self {
        let mut items_by_depth = BTreeMap::new();
        let mut leaf_nodes = 0;
        let mut max_children = 0;
        let mut parents = 0;
        let mut total_children = 0;

        for item in items {
            *items_by_depth.entry(item.depth).or_insert(0) += 1;

            let children = item.children_ids.len();
            if children == 0 {
                leaf_nodes += 1;
            } else {
                parents += 1;
                total_children += children;
            }
            max_children = max_children.max(children);
        }

        Self {
            total_items: items.len(),
            items_by_depth,
            leaf_nodes,
            max_children,
            average_children_per_parent: ratio_one_decimal(total_children, parents),
        }
    }

    pub fn parent_nodes(&self) -> usize {
        self.total_items - self.leaf_nodes
    }

    /// Share of all items sitting at `depth`, as a percentage with one decimal.
    pub fn depth_percentage(&self, depth: u32) -> String {
        let count = self.items_by_depth.get(&depth).copied().unwrap_or(0);
        ratio_one_decimal(count * 100, self.total_items)
    }
}

/// `numerator / denominator` with one decimal, rounding half away from zero.
///
/// Integer arithmetic keeps ties exact (9/4 is "2.3", not "2.2").
fn ratio_one_decimal(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    let tenths = (numerator * 20 + denominator) / (denominator * 2);
    format!("{}.{}", tenths / 10, tenths % 10)
}
