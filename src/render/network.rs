//! Network view placeholder: node and edge counts only.

use colored::Colorize;

use crate::application::services::LoadedDimension;
use crate::render::html::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkView {
    pub nodes: usize,
    /// Items with at least one child
    pub edges: usize,
}

impl NetworkView {
    pub fn new(loaded: &LoadedDimension) -> Self {
        Self {
            nodes: loaded.statistics.total_items,
            edges: loaded.items().iter().filter(|i| i.has_children()).count(),
        }
    }

    pub fn to_html(&self) -> Element {
        let stat = |number: usize, label: &str| {
            Element::div("stat")
                .child(Element::text_el("span", "stat-number", number.to_string()))
                .child(Element::text_el("span", "stat-label", label))
        };

        Element::div("network-view").child(
            Element::div("network-placeholder")
                .child(Element::text_el("div", "placeholder-icon", "🔗"))
                .child(Element::new("h4").text("Network Visualization"))
                .child(
                    Element::new("p")
                        .text("Network view will show relationships between dimension items."),
                )
                .child(
                    Element::div("network-stats")
                        .child(stat(self.nodes, "Nodes"))
                        .child(stat(self.edges, "Edges")),
                ),
        )
    }

    pub fn to_text(&self) -> String {
        format!(
            "{}\n  Nodes: {}\n  Edges: {}\n",
            "Network Visualization".cyan().bold(),
            self.nodes,
            self.edges
        )
    }
}
