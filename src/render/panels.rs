//! Overview, statistics and reference panels.
//!
//! Each panel is a pure function of the loaded dimension; none reads another.

use std::fmt;

use colored::Colorize;
use serde_json::Value;

use crate::application::services::LoadedDimension;
use crate::render::html::Element;
use crate::render::view::{display_name, title_case_key, RenderOptions};

/// Which panel(s) to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PanelKind {
    Overview,
    Statistics,
    Reference,
    #[default]
    All,
}

impl PanelKind {
    pub fn includes(self, other: PanelKind) -> bool {
        self == PanelKind::All || self == other
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelKind::Overview => "overview",
            PanelKind::Statistics => "statistics",
            PanelKind::Reference => "reference",
            PanelKind::All => "all",
        };
        f.write_str(name)
    }
}

/// The three panels for the active dimension, refreshed together.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoPanels {
    pub overview: Element,
    pub statistics: Element,
    pub reference: Element,
}

impl InfoPanels {
    pub fn render(loaded: &LoadedDimension, options: &RenderOptions) -> Self {
        Self {
            overview: overview_html(loaded),
            statistics: statistics_html(loaded),
            reference: reference_html(loaded, options),
        }
    }
}

fn level_label(loaded: &LoadedDimension, depth: u32) -> &str {
    loaded
        .document
        .hierarchy
        .levels
        .label(depth)
        .unwrap_or("Unknown")
}

pub fn overview_html(loaded: &LoadedDimension) -> Element {
    let stats = &loaded.statistics;
    let card = |number: String, label: &str| {
        Element::div("metric-card")
            .child(Element::text_el("span", "metric-number", number))
            .child(Element::text_el("span", "metric-label", label))
    };

    let breakdown = stats.items_by_depth.iter().map(|(&depth, &count)| {
        Element::div("depth-stat")
            .child(Element::text_el(
                "span",
                "depth-label",
                format!("Level {} ({}):", depth, level_label(loaded, depth)),
            ))
            .child(Element::text_el("span", "depth-count", format!("{count} items")))
    });

    Element::div("info-panel")
        .attr("id", "info-overview")
        .child(Element::new("h4").text(display_name(&loaded.name)))
        .child(Element::new("p").text(&loaded.document.description))
        .child(
            Element::div("overview-metrics").child(
                Element::div("metric-grid")
                    .child(card(stats.total_items.to_string(), "Total Items"))
                    .child(card(hierarchy_levels(loaded).to_string(), "Hierarchy Levels"))
                    .child(card(stats.leaf_nodes.to_string(), "Leaf Nodes"))
                    .child(card(stats.average_children_per_parent.clone(), "Avg Children")),
            ),
        )
        .child(
            Element::div("hierarchy-breakdown")
                .child(Element::new("h5").text("Hierarchy Breakdown"))
                .children(breakdown),
        )
}

pub fn statistics_html(loaded: &LoadedDimension) -> Element {
    let stats = &loaded.statistics;

    let bars = stats.items_by_depth.iter().map(|(&depth, &count)| {
        let percentage = stats.depth_percentage(depth);
        Element::div("distribution-bar")
            .child(Element::text_el("span", "bar-label", format!("Level {depth}")))
            .child(
                Element::div("bar-container").child(
                    Element::div("bar-fill").attr("style", format!("width: {percentage}%")),
                ),
            )
            .child(Element::text_el(
                "span",
                "bar-value",
                format!("{count} ({percentage}%)"),
            ))
    });

    let rows = structural_metrics(loaded).into_iter().map(|(name, value)| {
        Element::div("metric-row")
            .child(Element::text_el("span", "metric-name", name))
            .child(Element::text_el("span", "metric-value", value))
    });

    Element::div("info-panel")
        .attr("id", "info-statistics")
        .child(Element::new("h4").text("Statistical Analysis"))
        .child(
            Element::div("stats-section")
                .child(Element::new("h5").text("Distribution"))
                .child(Element::div("distribution-chart").children(bars)),
        )
        .child(
            Element::div("stats-section")
                .child(Element::new("h5").text("Structural Metrics"))
                .child(Element::div("metrics-table").children(rows)),
        )
}

fn structural_metrics(loaded: &LoadedDimension) -> Vec<(&'static str, String)> {
    let stats = &loaded.statistics;
    vec![
        ("Total Items", stats.total_items.to_string()),
        ("Maximum Depth", loaded.max_depth.to_string()),
        ("Leaf Nodes", stats.leaf_nodes.to_string()),
        ("Parent Nodes", stats.parent_nodes().to_string()),
        ("Max Children per Node", stats.max_children.to_string()),
        ("Avg Children per Parent", stats.average_children_per_parent.clone()),
    ]
}

/// (title, body) sections for the fields the reference actually has.
fn reference_sections(loaded: &LoadedDimension) -> Vec<(&'static str, Vec<String>)> {
    let mut sections = Vec::new();
    if let Some(reference) = &loaded.document.reference {
        let single = [
            ("Classification System", &reference.classification),
            ("Burden Metric", &reference.burden_metric),
            ("Data Source", &reference.data_source),
        ];
        for (title, value) in single {
            if let Some(value) = value {
                sections.push((title, vec![value.clone()]));
            }
        }
        if !reference.sources.is_empty() {
            sections.push(("Sources", reference.sources.clone()));
        }
        if let Some(updated) = &reference.last_updated {
            sections.push(("Last Updated", vec![updated.clone()]));
        }
    }
    sections
}

fn dimension_metadata(loaded: &LoadedDimension, limit: usize) -> Vec<(String, String)> {
    loaded
        .document
        .dimension_metadata
        .iter()
        .take(limit)
        .map(|(key, value)| {
            let shown = match value {
                Value::Object(_) | Value::Array(_) => {
                    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
                }
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (title_case_key(key), shown)
        })
        .collect()
}

pub fn reference_html(loaded: &LoadedDimension, options: &RenderOptions) -> Element {
    let sections = reference_sections(loaded).into_iter().map(|(title, body)| {
        let section = Element::div("reference-section").child(Element::new("h5").text(title));
        match title {
            "Sources" => section.child(
                Element::new("ul")
                    .class("sources-list")
                    .children(body.iter().map(|s| Element::new("li").text(s))),
            ),
            "Last Updated" => section.child(Element::text_el("p", "last-updated", &body[0])),
            _ => section.child(Element::new("p").text(&body[0])),
        }
    });

    let mut panel = Element::div("info-panel")
        .attr("id", "info-reference")
        .child(Element::new("h4").text("Evidence Base & References"))
        .children(sections);

    let metadata = dimension_metadata(loaded, options.dimension_metadata_limit);
    if !metadata.is_empty() {
        panel = panel.child(
            Element::div("reference-section")
                .child(Element::new("h5").text("Dimension Metadata"))
                .child(Element::div("metadata-grid").children(metadata.into_iter().map(
                    |(key, value)| {
                        Element::div("metadata-row")
                            .child(Element::text_el("span", "metadata-key", key))
                            .child(Element::text_el("span", "metadata-value", value))
                    },
                ))),
        );
    }
    panel
}

/// Levels spanned by the document, counted from depth 0.
fn hierarchy_levels(loaded: &LoadedDimension) -> u64 {
    u64::from(loaded.max_depth) + 1
}

pub fn overview_text(loaded: &LoadedDimension) -> String {
    let stats = &loaded.statistics;
    let mut out = format!(
        "{}\n{}\n\n  Total Items: {}\n  Hierarchy Levels: {}\n  Leaf Nodes: {}\n  \
         Avg Children: {}\n\n{}\n",
        display_name(&loaded.name).cyan().bold(),
        loaded.document.description,
        stats.total_items,
        hierarchy_levels(loaded),
        stats.leaf_nodes,
        stats.average_children_per_parent,
        "Hierarchy Breakdown".bold()
    );
    for (&depth, &count) in &stats.items_by_depth {
        out.push_str(&format!(
            "  Level {} ({}): {} items\n",
            depth,
            level_label(loaded, depth),
            count
        ));
    }
    out
}

pub fn statistics_text(loaded: &LoadedDimension) -> String {
    let stats = &loaded.statistics;
    let mut out = format!("{}\n{}\n", "Statistical Analysis".cyan().bold(), "Distribution".bold());
    for (&depth, &count) in &stats.items_by_depth {
        out.push_str(&format!(
            "  Level {}: {} ({}%)\n",
            depth,
            count,
            stats.depth_percentage(depth)
        ));
    }
    out.push_str(&format!("{}\n", "Structural Metrics".bold()));
    for (name, value) in structural_metrics(loaded) {
        out.push_str(&format!("  {name}: {value}\n"));
    }
    out
}

pub fn reference_text(loaded: &LoadedDimension, options: &RenderOptions) -> String {
    let mut out = format!("{}\n", "Evidence Base & References".cyan().bold());
    for (title, body) in reference_sections(loaded) {
        out.push_str(&format!("{}\n", title.bold()));
        for line in body {
            out.push_str(&format!("  {line}\n"));
        }
    }
    let metadata = dimension_metadata(loaded, options.dimension_metadata_limit);
    if !metadata.is_empty() {
        out.push_str(&format!("{}\n", "Dimension Metadata".bold()));
        for (key, value) in metadata {
            out.push_str(&format!("  {key}: {value}\n"));
        }
    }
    out
}
