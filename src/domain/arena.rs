use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

/// Data payload for tree nodes: which item the node shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub item_id: String,
    /// Position of the item in its document's item list
    pub position: usize,
    pub depth: u32,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.item_id)
    }
}

/// Expansion state of a tree node. Every node starts collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Collapsed,
    Expanded,
}

impl NodeState {
    pub fn toggled(self) -> Self {
        match self {
            NodeState::Collapsed => NodeState::Expanded,
            NodeState::Expanded => NodeState::Collapsed,
        }
    }

    pub fn is_expanded(self) -> bool {
        self == NodeState::Expanded
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in `children_ids` order
    pub children: Vec<Index>,
    pub state: NodeState,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Forest of resolved tree nodes, one tree per root item.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
            state: NodeState::Collapsed,
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// All nodes in document order (pre-order, roots left to right).
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, false)
    }

    /// Nodes a reader can see: children of collapsed nodes are skipped.
    pub fn iter_visible(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, true)
    }

    /// First node showing `item_id`, in document order.
    pub fn find(&self, item_id: &str) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.data.item_id == item_id)
            .map(|(idx, _)| idx)
    }

    /// Ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut chain = Vec::new();
        let mut current = self.get_node(idx).and_then(|n| n.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get_node(parent).and_then(|n| n.parent);
        }
        chain
    }

    /// Number of levels in the tallest tree; 0 when empty.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Item ids of all nodes without resolved children, in document order.
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.item_id.clone())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
    visible_only: bool,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, visible_only: bool) -> Self {
        // Roots in reverse so the first root pops first
        let stack = arena.roots.iter().rev().copied().collect();
        Self {
            arena,
            stack,
            visible_only,
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !self.visible_only || node.state.is_expanded() {
                    // Push children in reverse order for left-to-right traversal
                    for &child in node.children.iter().rev() {
                        self.stack.push(child);
                    }
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
