//! Tree builder: resolves the hierarchy index into a renderable forest.

use tracing::{instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::DimensionItem;
use crate::domain::hierarchy::HierarchyMap;

/// A child edge the builder could not follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedEdge {
    /// `children_ids` names an id that is not in the document
    Dangling { parent: String, child: String },
    /// Following the edge would revisit an ancestor
    Cycle { parent: String, child: String },
}

/// Constructs the tree forest shown by the hierarchy view.
///
/// Roots are the depth-0 items in input order. Children follow
/// `children_ids`; ids that do not resolve are skipped, not rejected.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    skipped: Vec<SkippedEdge>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edges skipped by the last `build`.
    pub fn skipped(&self) -> &[SkippedEdge] {
        &self.skipped
    }

    #[instrument(level = "debug", skip_all, fields(items = items.len()))]
    pub fn build(&mut self, items: &[DimensionItem], hierarchy: &HierarchyMap) -> TreeArena {
        self.skipped.clear();
        let mut tree = TreeArena::new();

        let mut stack: Vec<(usize, Option<generational_arena::Index>)> = hierarchy
            .at_depth(0)
            .iter()
            .rev()
            .map(|&position| (position, None))
            .collect();

        while let Some((position, parent_idx)) = stack.pop() {
            let item = &items[position];
            let node_data = NodeData {
                item_id: item.id.clone(),
                position,
                depth: item.depth,
            };
            let current_idx = tree.insert_node(node_data, parent_idx);

            // Reverse so the first child is inserted first
            for child_id in item.children_ids.iter().rev() {
                let Some(child_position) = hierarchy.position(child_id) else {
                    warn!(parent = %item.id, child = %child_id, "skipping unresolved child");
                    self.skipped.push(SkippedEdge::Dangling {
                        parent: item.id.clone(),
                        child: child_id.clone(),
                    });
                    continue;
                };

                let revisits_ancestor = child_id == &item.id
                    || tree.ancestors(current_idx).iter().any(|&a| {
                        tree.get_node(a)
                            .map(|n| &n.data.item_id == child_id)
                            .unwrap_or(false)
                    });
                if revisits_ancestor {
                    warn!(parent = %item.id, child = %child_id, "skipping cyclic child");
                    self.skipped.push(SkippedEdge::Cycle {
                        parent: item.id.clone(),
                        child: child_id.clone(),
                    });
                    continue;
                }

                stack.push((child_position, Some(current_idx)));
            }
        }

        // Children were pushed in reverse, so skips were recorded back to front
        self.skipped.reverse();
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::item;

    fn build(items: &[DimensionItem]) -> (TreeArena, Vec<SkippedEdge>) {
        let hierarchy = HierarchyMap::build(items);
        let mut builder = TreeBuilder::new();
        let tree = builder.build(items, &hierarchy);
        (tree, builder.skipped().to_vec())
    }

    #[test]
    fn given_chain_when_building_then_single_tree_of_depth_three() {
        let items = vec![
            item("a", 0, None, &["b"]),
            item("b", 1, Some("a"), &["c"]),
            item("c", 2, Some("b"), &[]),
        ];

        let (tree, skipped) = build(&items);

        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.depth(), 3);
        assert!(skipped.is_empty());
    }

    #[test]
    fn given_children_order_when_building_then_order_preserved() {
        let items = vec![
            item("root", 0, None, &["z", "m", "a"]),
            item("a", 1, Some("root"), &[]),
            item("m", 1, Some("root"), &[]),
            item("z", 1, Some("root"), &[]),
        ];

        let (tree, _) = build(&items);

        let ids: Vec<_> = tree.iter().map(|(_, n)| n.data.item_id.clone()).collect();
        assert_eq!(ids, vec!["root", "z", "m", "a"]);
    }

    #[test]
    fn given_dangling_child_when_building_then_skipped_and_recorded() {
        let items = vec![item("a", 0, None, &["ghost", "b"]), item("b", 1, Some("a"), &[])];

        let (tree, skipped) = build(&items);

        assert_eq!(tree.len(), 2);
        assert_eq!(
            skipped,
            vec![SkippedEdge::Dangling {
                parent: "a".into(),
                child: "ghost".into()
            }]
        );
    }

    #[test]
    fn given_cycle_when_building_then_edge_skipped() {
        let items = vec![item("a", 0, None, &["b"]), item("b", 1, Some("a"), &["a"])];

        let (tree, skipped) = build(&items);

        assert_eq!(tree.len(), 2);
        assert!(matches!(skipped[0], SkippedEdge::Cycle { .. }));
    }

    #[test]
    fn given_item_without_root_when_building_then_not_shown() {
        // depth 1 with a parent that does not exist: no root reaches it
        let items = vec![item("a", 0, None, &[]), item("stray", 1, Some("nowhere"), &[])];

        let (tree, _) = build(&items);

        assert_eq!(tree.len(), 1);
        assert!(tree.find("stray").is_none());
    }
}
