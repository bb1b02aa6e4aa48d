//! Hierarchy view: collapsible tree with keyboard navigation.

use std::str::FromStr;
use std::sync::Arc;

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::LoadedDimension;
use crate::domain::{DomainError, NodeState, SkippedEdge, TreeArena, TreeBuilder};
use crate::render::html::Element;
use crate::render::view::{
    header_text, metadata_html, metadata_text, node_icon, reference_chips, RenderOptions,
};

const GLYPH_COLLAPSED: &str = "▶";
const GLYPH_EXPANDED: &str = "▼";
const GLYPH_LEAF: &str = "•";

/// Keys a focused tree node reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKey {
    Enter,
    Space,
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,
}

impl FromStr for TreeKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Enter" | "enter" => Ok(TreeKey::Enter),
            " " | "Space" | "space" => Ok(TreeKey::Space),
            "ArrowRight" | "right" => Ok(TreeKey::ArrowRight),
            "ArrowLeft" | "left" => Ok(TreeKey::ArrowLeft),
            "ArrowDown" | "down" => Ok(TreeKey::ArrowDown),
            "ArrowUp" | "up" => Ok(TreeKey::ArrowUp),
            other => Err(DomainError::UnknownTreeKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    Click,
    Key(TreeKey),
}

/// Tree of one dimension plus its local UI state (expansion and focus).
#[derive(Debug)]
pub struct TreeView {
    loaded: Arc<LoadedDimension>,
    arena: TreeArena,
    skipped: Vec<SkippedEdge>,
    focus: Option<Index>,
}

impl TreeView {
    /// All nodes start collapsed; nothing is focused.
    pub fn new(loaded: Arc<LoadedDimension>) -> Self {
        let mut builder = TreeBuilder::new();
        let arena = builder.build(loaded.items(), &loaded.hierarchy);
        let skipped = builder.skipped().to_vec();
        Self {
            loaded,
            arena,
            skipped,
            focus: None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Child edges left out because they did not resolve.
    pub fn skipped(&self) -> &[SkippedEdge] {
        &self.skipped
    }

    pub fn state(&self, id: &str) -> Option<NodeState> {
        self.arena
            .find(id)
            .and_then(|idx| self.arena.get_node(idx))
            .map(|node| node.state)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.state(id).is_some_and(NodeState::is_expanded)
    }

    fn index_of(&self, id: &str) -> Result<Index, DomainError> {
        self.arena.find(id).ok_or_else(|| DomainError::UnknownItem {
            dimension: self.loaded.name.clone(),
            id: id.to_string(),
        })
    }

    /// Sets `idx` to `state`. Leaves have no state to change.
    fn set_state(&mut self, idx: Index, state: NodeState) {
        if let Some(node) = self.arena.get_node_mut(idx) {
            if node.has_children() {
                node.state = state;
            }
        }
    }

    pub fn expand(&mut self, id: &str) -> Result<(), DomainError> {
        let idx = self.index_of(id)?;
        self.set_state(idx, NodeState::Expanded);
        Ok(())
    }

    pub fn collapse(&mut self, id: &str) -> Result<(), DomainError> {
        let idx = self.index_of(id)?;
        self.set_state(idx, NodeState::Collapsed);
        Ok(())
    }

    pub fn toggle(&mut self, id: &str) -> Result<(), DomainError> {
        let idx = self.index_of(id)?;
        let next = self
            .arena
            .get_node(idx)
            .map(|node| node.state.toggled())
            .unwrap_or_default();
        self.set_state(idx, next);
        Ok(())
    }

    /// Expand every ancestor of `id` so it becomes visible.
    pub fn reveal(&mut self, id: &str) -> Result<(), DomainError> {
        let idx = self.index_of(id)?;
        for ancestor in self.arena.ancestors(idx) {
            self.set_state(ancestor, NodeState::Expanded);
        }
        Ok(())
    }

    pub fn expand_all(&mut self) {
        let all: Vec<Index> = self.arena.iter().map(|(idx, _)| idx).collect();
        for idx in all {
            self.set_state(idx, NodeState::Expanded);
        }
    }

    pub fn focus(&mut self, id: &str) -> Result<(), DomainError> {
        self.focus = Some(self.index_of(id)?);
        Ok(())
    }

    pub fn focused(&self) -> Option<&str> {
        self.focus
            .and_then(|idx| self.arena.get_node(idx))
            .map(|node| node.data.item_id.as_str())
    }

    /// Apply a click or key press on node `id`.
    ///
    /// ArrowDown/ArrowUp walk every node in document order, hidden ones included,
    /// and stop at either end.
    #[instrument(level = "debug", skip(self))]
    pub fn handle(&mut self, id: &str, event: NodeEvent) -> Result<(), DomainError> {
        let idx = self.index_of(id)?;
        self.focus = Some(idx);

        match event {
            NodeEvent::Click | NodeEvent::Key(TreeKey::Enter) | NodeEvent::Key(TreeKey::Space) => {
                self.toggle(id)?
            }
            NodeEvent::Key(TreeKey::ArrowRight) => self.set_state(idx, NodeState::Expanded),
            NodeEvent::Key(TreeKey::ArrowLeft) => self.set_state(idx, NodeState::Collapsed),
            NodeEvent::Key(TreeKey::ArrowDown) | NodeEvent::Key(TreeKey::ArrowUp) => {
                let order: Vec<Index> = self.arena.iter().map(|(i, _)| i).collect();
                if let Some(pos) = order.iter().position(|&i| i == idx) {
                    let next = match event {
                        NodeEvent::Key(TreeKey::ArrowDown) => order.get(pos + 1),
                        _ => pos.checked_sub(1).and_then(|p| order.get(p)),
                    };
                    if let Some(&next) = next {
                        self.focus = Some(next);
                    }
                }
            }
        }
        debug!("handle: focus={:?}", self.focused());
        Ok(())
    }

    /// Item ids a reader currently sees, in document order.
    pub fn visible_ids(&self) -> Vec<String> {
        self.arena
            .iter_visible()
            .map(|(_, node)| node.data.item_id.clone())
            .collect()
    }

    pub fn to_html(&self, options: &RenderOptions) -> Element {
        let stats = &self.loaded.statistics;
        let header = Element::div("hierarchy-header")
            .child(Element::new("h4").text(&self.loaded.document.description))
            .child(
                Element::div("hierarchy-stats")
                    .child(Element::text_el(
                        "span",
                        "stat-chip",
                        format!("Items: {}", stats.total_items),
                    ))
                    .child(Element::text_el(
                        "span",
                        "stat-chip",
                        format!("Max Depth: {}", self.loaded.max_depth),
                    ))
                    .child(Element::text_el(
                        "span",
                        "stat-chip",
                        format!("Leaf Nodes: {}", stats.leaf_nodes),
                    ))
                    .children(reference_chips(&self.loaded, options)),
            );

        let container = Element::div("tree-container").children(
            self.arena
                .roots()
                .iter()
                .filter_map(|&root| self.node_html(root, options)),
        );

        Element::div("hierarchy-view")
            .attr("data-dimension", &self.loaded.document.dimension)
            .child(header)
            .child(container)
    }

    fn node_html(&self, idx: Index, options: &RenderOptions) -> Option<Element> {
        let node = self.arena.get_node(idx)?;
        let item = &self.loaded.items()[node.data.position];
        let has_children = node.has_children();
        let expanded = node.state.is_expanded();

        let toggle = Element::div("node-toggle")
            .class(if has_children { "expandable" } else { "leaf" })
            .class_if(expanded, "expanded")
            .text(match (has_children, expanded) {
                (false, _) => GLYPH_LEAF,
                (true, false) => GLYPH_COLLAPSED,
                (true, true) => GLYPH_EXPANDED,
            });

        let mut content = Element::div("node-content")
            .child(Element::text_el("div", "node-title", &item.name))
            .child(Element::text_el("div", "node-description", item.description_or_empty()));
        if let Some(metadata) = metadata_html(item, options) {
            content = content.child(metadata);
        }

        let mut header = Element::div("node-header")
            .attr("tabindex", "0")
            .attr("data-id", &item.id)
            .class_if(self.focus == Some(idx), "focused")
            .child(toggle)
            .child(Element::text_el("div", "node-icon", node_icon(&self.loaded.name, item.depth)))
            .child(content)
            .child(Element::text_el(
                "div",
                "node-badge",
                if has_children {
                    node.children.len().to_string()
                } else {
                    String::new()
                },
            ));
        if has_children {
            header = header.attr("aria-expanded", expanded.to_string());
        }

        let mut node_div = Element::div("tree-node")
            .class(&format!("depth-{}", item.depth))
            .child(header);
        if has_children {
            node_div = node_div.child(
                Element::div("node-children")
                    .class_if(!expanded, "collapsed")
                    .children(node.children.iter().filter_map(|&c| self.node_html(c, options))),
            );
        }
        Some(node_div)
    }

    pub fn to_text(&self, options: &RenderOptions) -> String {
        let stats = &self.loaded.statistics;
        let counts = format!(
            "Items: {}  Max Depth: {}  Leaf Nodes: {}",
            stats.total_items, self.loaded.max_depth, stats.leaf_nodes
        );
        let mut out = header_text(&self.loaded, options, &counts);
        for &root in self.arena.roots() {
            if let Some(tree) = self.node_tree(root, options) {
                out.push_str(&tree.to_string());
            }
        }
        out
    }

    fn node_tree(&self, idx: Index, options: &RenderOptions) -> Option<Tree<String>> {
        let node = self.arena.get_node(idx)?;
        let item = &self.loaded.items()[node.data.position];
        let expanded = node.state.is_expanded();

        let glyph = match (node.has_children(), expanded) {
            (false, _) => GLYPH_LEAF,
            (true, false) => GLYPH_COLLAPSED,
            (true, true) => GLYPH_EXPANDED,
        };
        let icon = node_icon(&self.loaded.name, item.depth);
        let mut label = format!("{} {} {}", glyph, icon, item.name.bold());
        if node.has_children() {
            label.push_str(&format!(" [{}]", node.children.len()));
        }
        if self.focus == Some(idx) {
            label = format!("{} {}", label, "<".yellow());
        }
        if let Some(metadata) = metadata_text(item, options) {
            label.push_str(&format!("  {}", metadata.dimmed()));
        }

        let leaves: Vec<Tree<String>> = if expanded {
            node.children
                .iter()
                .filter_map(|&c| self.node_tree(c, options))
                .collect()
        } else {
            Vec::new()
        };
        Some(Tree::new(label).with_leaves(leaves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DimensionDocument;

    fn view() -> TreeView {
        let doc = DimensionDocument::from_json(
            r#"{"dimension":"task","description":"Tasks","items":[
                {"id":"a","name":"Alpha","depth":0,"children_ids":["a/b","a/c"]},
                {"id":"a/b","name":"Beta","depth":1,"parent_id":"a","children_ids":["a/b/d"]},
                {"id":"a/c","name":"Gamma","depth":1,"parent_id":"a"},
                {"id":"a/b/d","name":"Delta","depth":2,"parent_id":"a/b"},
                {"id":"e","name":"Epsilon","depth":0}
            ]}"#,
        )
        .unwrap();
        TreeView::new(Arc::new(LoadedDimension::process("task", doc)))
    }

    #[test]
    fn given_new_view_when_inspecting_then_all_collapsed() {
        let tree = view();
        assert_eq!(tree.visible_ids(), vec!["a", "e"]);
        assert_eq!(tree.state("a"), Some(NodeState::Collapsed));
    }

    #[test]
    fn given_collapsed_node_when_clicked_twice_then_back_to_collapsed() {
        let mut tree = view();

        tree.handle("a", NodeEvent::Click).unwrap();
        assert!(tree.is_expanded("a"));
        assert_eq!(tree.visible_ids(), vec!["a", "a/b", "a/c", "e"]);

        tree.handle("a", NodeEvent::Click).unwrap();
        assert!(!tree.is_expanded("a"));
    }

    #[test]
    fn given_keys_when_handling_then_right_expands_left_collapses() {
        let mut tree = view();

        tree.handle("a", NodeEvent::Key(TreeKey::ArrowRight)).unwrap();
        tree.handle("a", NodeEvent::Key(TreeKey::ArrowRight)).unwrap();
        assert!(tree.is_expanded("a"));

        tree.handle("a", NodeEvent::Key(TreeKey::ArrowLeft)).unwrap();
        assert!(!tree.is_expanded("a"));

        tree.handle("a", NodeEvent::Key(TreeKey::Space)).unwrap();
        assert!(tree.is_expanded("a"));
    }

    #[test]
    fn given_leaf_when_toggled_then_state_unchanged() {
        let mut tree = view();
        tree.handle("e", NodeEvent::Key(TreeKey::Enter)).unwrap();
        assert_eq!(tree.state("e"), Some(NodeState::Collapsed));
    }

    #[test]
    fn given_focus_when_arrowing_then_moves_in_document_order_and_stops_at_ends() {
        let mut tree = view();

        tree.handle("a", NodeEvent::Key(TreeKey::ArrowDown)).unwrap();
        assert_eq!(tree.focused(), Some("a/b"));

        tree.handle("e", NodeEvent::Key(TreeKey::ArrowDown)).unwrap();
        assert_eq!(tree.focused(), Some("e"));

        tree.handle("a", NodeEvent::Key(TreeKey::ArrowUp)).unwrap();
        assert_eq!(tree.focused(), Some("a"));
    }

    #[test]
    fn given_deep_item_when_revealed_then_ancestors_expanded() {
        let mut tree = view();
        tree.reveal("a/b/d").unwrap();
        assert!(tree.visible_ids().contains(&"a/b/d".to_string()));
    }

    #[test]
    fn given_unknown_id_when_expanding_then_error() {
        let mut tree = view();
        assert!(matches!(tree.expand("zzz"), Err(DomainError::UnknownItem { .. })));
        assert!("Tab".parse::<TreeKey>().is_err());
    }

    #[test]
    fn given_view_when_rendering_html_then_collapsed_children_and_glyphs() {
        let mut tree = view();
        tree.expand("a").unwrap();

        let html = tree.to_html(&RenderOptions::default()).render();

        assert!(html.contains("<div class=\"hierarchy-view\" data-dimension=\"task\">"));
        assert!(html.contains("Items: 5"));
        assert!(html.contains("Max Depth: 2"));
        assert!(html.contains("Leaf Nodes: 3"));
        assert!(html.contains("<div class=\"node-toggle expandable expanded\">▼</div>"));
        assert!(html.contains("<div class=\"node-children collapsed\">"));
        assert!(html.contains("<div class=\"node-toggle leaf\">•</div>"));
    }

    #[test]
    fn given_expanded_tree_when_rendering_text_then_children_listed() {
        colored::control::set_override(false);
        let mut tree = view();
        tree.expand_all();

        let text = tree.to_text(&RenderOptions::default());

        assert!(text.contains("▼ 🎯 Alpha [2]"));
        assert!(text.contains("Delta"));
    }
}
