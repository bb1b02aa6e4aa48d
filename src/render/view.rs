//! View selection and the pieces every view shares.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use colored::Colorize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::application::services::LoadedDimension;
use crate::domain::{display_value, DimensionItem};
use crate::render::html::Element;
use crate::render::list::ListView;
use crate::render::network::NetworkView;
use crate::render::tree::TreeView;

/// How the active dimension is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Hierarchy,
    List,
    Network,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Hierarchy => "hierarchy",
            ViewMode::List => "list",
            ViewMode::Network => "network",
        }
    }
}

/// Never fails: anything unrecognized selects the hierarchy view.
impl FromStr for ViewMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "list" => ViewMode::List,
            "network" => ViewMode::Network,
            "hierarchy" => ViewMode::Hierarchy,
            other => {
                debug!("unknown view mode '{}', using hierarchy", other);
                ViewMode::Hierarchy
            }
        })
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display toggles shared by all views and panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub view_mode: ViewMode,
    pub show_metadata: bool,
    pub show_references: bool,
    /// Metadata entries shown per item
    pub metadata_limit: usize,
    /// Entries shown in the reference panel's dimension metadata section
    pub dimension_metadata_limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Hierarchy,
            show_metadata: true,
            show_references: false,
            metadata_limit: 3,
            dimension_metadata_limit: 5,
        }
    }
}

/// A rendered dimension, one variant per view mode.
#[derive(Debug)]
pub enum View {
    Tree(TreeView),
    List(ListView),
    Network(NetworkView),
}

impl View {
    pub fn build(loaded: &Arc<LoadedDimension>, mode: ViewMode) -> Self {
        debug!("View::build: dimension={} mode={}", loaded.name, mode);
        match mode {
            ViewMode::Hierarchy => View::Tree(TreeView::new(Arc::clone(loaded))),
            ViewMode::List => View::List(ListView::new(Arc::clone(loaded))),
            ViewMode::Network => View::Network(NetworkView::new(loaded)),
        }
    }

    pub fn mode(&self) -> ViewMode {
        match self {
            View::Tree(_) => ViewMode::Hierarchy,
            View::List(_) => ViewMode::List,
            View::Network(_) => ViewMode::Network,
        }
    }

    pub fn to_html(&self, options: &RenderOptions) -> Element {
        match self {
            View::Tree(tree) => tree.to_html(options),
            View::List(list) => list.to_html(options),
            View::Network(network) => network.to_html(),
        }
    }

    pub fn to_text(&self, options: &RenderOptions) -> String {
        match self {
            View::Tree(tree) => tree.to_text(options),
            View::List(list) => list.to_text(options),
            View::Network(network) => network.to_text(),
        }
    }
}

/// Human name of a dimension identifier.
pub fn display_name(dimension: &str) -> String {
    match dimension {
        "task" => "Task".to_string(),
        "persona" => "Persona".to_string(),
        "disease" => "Disease".to_string(),
        "stage" => "Stage".to_string(),
        "location" => "Location".to_string(),
        other => other.to_string(),
    }
}

/// Icon for an item of `dimension` at `depth`.
pub fn node_icon(dimension: &str, depth: u32) -> &'static str {
    match (dimension, depth) {
        ("task", 0) => "🎯",
        ("task", 1) => "⚡",
        ("persona", 0) => "👤",
        ("persona", 1) => "📋",
        ("disease", 0) => "📚",
        ("disease", 1) => "🔬",
        ("stage", 0) => "⏰",
        ("stage", 1) => "➡️",
        ("location", 0) => "🏥",
        ("location", 1) => "⚙️",
        _ => "📄",
    }
}

/// `care_setting_type` becomes `Care Setting Type`.
pub fn title_case_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// First `limit` metadata entries as display pairs.
pub fn metadata_entries(metadata: &Map<String, Value>, limit: usize) -> Vec<(String, String)> {
    metadata
        .iter()
        .take(limit)
        .map(|(key, value)| (title_case_key(key), display_value(value)))
        .collect()
}

/// `<div class="node-metadata">`, or None when there is nothing to show.
pub fn metadata_html(item: &DimensionItem, options: &RenderOptions) -> Option<Element> {
    if !options.show_metadata || item.metadata.is_empty() {
        return None;
    }
    let entries = metadata_entries(&item.metadata, options.metadata_limit);
    Some(
        Element::div("node-metadata").children(entries.into_iter().map(|(key, value)| {
            Element::new("span")
                .class("metadata-item")
                .child(Element::new("strong").text(format!("{key}:")))
                .text(format!(" {value}"))
        })),
    )
}

/// One-line metadata summary for terminal output.
pub fn metadata_text(item: &DimensionItem, options: &RenderOptions) -> Option<String> {
    if !options.show_metadata || item.metadata.is_empty() {
        return None;
    }
    let joined = metadata_entries(&item.metadata, options.metadata_limit)
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

/// Reference chips appended to view headers when references are shown.
pub fn reference_chips(loaded: &LoadedDimension, options: &RenderOptions) -> Vec<Element> {
    let mut chips = Vec::new();
    let Some(reference) = loaded.document.reference.as_ref() else {
        return chips;
    };
    if let Some(classification) = &reference.classification {
        chips.push(
            Element::new("span")
                .class("stat-chip framework-chip")
                .text(format!("Grounded Framework: {classification}")),
        );
    }
    if options.show_references {
        if let Some(source) = &reference.data_source {
            chips.push(
                Element::new("span")
                    .class("stat-chip reference-chip")
                    .text(format!("Source: {source}")),
            );
        }
    }
    chips
}

/// Terminal form of the header chips.
pub fn header_text(loaded: &LoadedDimension, options: &RenderOptions, counts: &str) -> String {
    let mut out = format!(
        "{}\n{}\n",
        display_name(&loaded.name).cyan().bold(),
        loaded.document.description
    );
    out.push_str(counts);
    if let Some(reference) = &loaded.document.reference {
        if let Some(classification) = &reference.classification {
            out.push_str(&format!("  Grounded Framework: {classification}"));
        }
        if options.show_references {
            if let Some(source) = &reference.data_source {
                out.push_str(&format!("  Source: {source}"));
            }
        }
    }
    out.push('\n');
    out
}

/// Replaces the visualization when a load fails; Retry reloads the page.
pub fn error_panel_html(message: &str) -> Element {
    Element::div("error-state")
        .child(Element::div("error-icon").text("⚠️"))
        .child(Element::new("p").text(message))
        .child(
            Element::new("button")
                .class("btn btn-outline")
                .attr("onclick", "location.reload()")
                .text("Retry"),
        )
}

pub fn error_panel_text(message: &str) -> String {
    format!(
        "{}: {}\n  {}",
        "error".red().bold(),
        message,
        "retry by running the command again".dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("list", ViewMode::List)]
    #[case("network", ViewMode::Network)]
    #[case("hierarchy", ViewMode::Hierarchy)]
    #[case("LIST", ViewMode::List)]
    #[case("sunburst", ViewMode::Hierarchy)]
    #[case("", ViewMode::Hierarchy)]
    fn given_mode_string_when_parsing_then_unknown_defaults_to_hierarchy(
        #[case] input: &str,
        #[case] expected: ViewMode,
    ) {
        let parsed: ViewMode = input.parse().unwrap();
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case("care_setting_type", "Care Setting Type")]
    #[case("icd10_code", "Icd10 Code")]
    #[case("already Fine", "Already Fine")]
    fn given_key_when_title_casing_then_words_capitalized(
        #[case] key: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(title_case_key(key), expected);
    }

    #[test]
    fn given_five_entries_when_taking_metadata_then_first_three_in_order() {
        let value = json!({"z_last": "1", "a_first": ["x", "y"], "m": 3, "n": "4", "o": "5"});
        let map = value.as_object().unwrap();

        let entries = metadata_entries(map, 3);

        assert_eq!(
            entries,
            vec![
                ("Z Last".to_string(), "1".to_string()),
                ("A First".to_string(), "x, y".to_string()),
                ("M".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn given_known_and_unknown_dimensions_when_naming_then_fallback_to_identifier() {
        assert_eq!(display_name("disease"), "Disease");
        assert_eq!(display_name("care_phase"), "care_phase");
        assert_eq!(node_icon("task", 0), "🎯");
        assert_eq!(node_icon("task", 2), "📄");
    }

    #[test]
    fn given_message_when_rendering_error_panel_then_retry_button_present() {
        let html = error_panel_html("Failed to load task dimension: HTTP 404").render();
        assert!(html.starts_with("<div class=\"error-state\">"));
        assert!(html.contains("location.reload()"));
        assert!(html.contains(">Retry</button>"));
    }
}
