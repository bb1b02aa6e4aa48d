//! Flat list view with search and depth filter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use colored::Colorize;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::application::services::LoadedDimension;
use crate::domain::{DimensionItem, DomainError};
use crate::render::html::{escape, Element};
use crate::render::view::{
    header_text, metadata_html, metadata_text, node_icon, reference_chips, RenderOptions,
};

const PATH_SEPARATOR: &str = " › ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFilter {
    #[default]
    All,
    Depth(u32),
}

impl DepthFilter {
    pub fn matches(self, depth: u32) -> bool {
        match self {
            DepthFilter::All => true,
            DepthFilter::Depth(d) => d == depth,
        }
    }
}

impl FromStr for DepthFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(DepthFilter::All);
        }
        s.parse::<u32>()
            .map(DepthFilter::Depth)
            .map_err(|_| DomainError::InvalidDepthFilter(s.to_string()))
    }
}

impl fmt::Display for DepthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthFilter::All => f.write_str("all"),
            DepthFilter::Depth(d) => write!(f, "{d}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListRow {
    position: usize,
    visible: bool,
}

/// Every item as a row, sorted by (depth, name); ties keep input order.
///
/// Filtering only flips row visibility, the row set never changes.
#[derive(Debug)]
pub struct ListView {
    loaded: Arc<LoadedDimension>,
    rows: Vec<ListRow>,
    search: String,
    depth_filter: DepthFilter,
}

impl ListView {
    pub fn new(loaded: Arc<LoadedDimension>) -> Self {
        let items = loaded.items();
        let rows = (0..items.len())
            .sorted_by(|&a, &b| {
                items[a]
                    .depth
                    .cmp(&items[b].depth)
                    .then_with(|| items[a].cmp_by_name(&items[b]))
            })
            .map(|position| ListRow {
                position,
                visible: true,
            })
            .collect();
        Self {
            loaded,
            rows,
            search: String::new(),
            depth_filter: DepthFilter::All,
        }
    }

    /// Show rows whose name or description contains `search`
    /// (case-insensitive) and whose depth passes `depth`.
    pub fn apply_filter(&mut self, search: &str, depth: DepthFilter) -> usize {
        self.search = search.to_string();
        self.depth_filter = depth;
        let needle = search.to_lowercase();
        let items = self.loaded.items();

        for row in &mut self.rows {
            let item = &items[row.position];
            let matches_search = needle.is_empty()
                || item.name.to_lowercase().contains(&needle)
                || item.description_or_empty().to_lowercase().contains(&needle);
            row.visible = matches_search && depth.matches(item.depth);
        }

        let visible = self.visible_count();
        debug!(
            "apply_filter: search='{}' depth={} visible={}/{}",
            search,
            depth,
            visible,
            self.rows.len()
        );
        visible
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|r| r.visible).count()
    }

    /// Rows in display order with their visibility.
    pub fn rows(&self) -> impl Iterator<Item = (&DimensionItem, bool)> + '_ {
        let items = self.loaded.items();
        self.rows.iter().map(move |r| (&items[r.position], r.visible))
    }

    pub fn visible_ids(&self) -> Vec<&str> {
        self.rows()
            .filter(|(_, visible)| *visible)
            .map(|(item, _)| item.id.as_str())
            .collect()
    }

    /// `all` followed by the distinct depths, ascending.
    pub fn depth_options(&self) -> Vec<DepthFilter> {
        std::iter::once(DepthFilter::All)
            .chain(
                self.loaded
                    .hierarchy
                    .depths()
                    .map(DepthFilter::Depth),
            )
            .collect()
    }

    fn highlighter(&self) -> Option<Regex> {
        if self.search.is_empty() {
            return None;
        }
        RegexBuilder::new(&regex::escape(&self.search))
            .case_insensitive(true)
            .build()
            .ok()
    }

    pub fn to_html(&self, options: &RenderOptions) -> Element {
        let highlighter = self.highlighter();

        let depth_select = Element::new("select").class("depth-filter").children(
            self.depth_options().into_iter().map(|option| {
                let label = match option {
                    DepthFilter::All => "All Depths".to_string(),
                    DepthFilter::Depth(d) => format!("Depth {d}"),
                };
                let mut el = Element::new("option").attr("value", option.to_string());
                if option == self.depth_filter {
                    el = el.attr("selected", "selected");
                }
                el.text(label)
            }),
        );

        let header = Element::div("list-header")
            .child(Element::new("h4").text(&self.loaded.document.description))
            .child(
                Element::div("list-controls")
                    .child(
                        Element::new("input")
                            .attr("type", "search")
                            .attr("placeholder", "Search items...")
                            .class("search-input")
                            .attr("value", &self.search),
                    )
                    .child(depth_select),
            )
            .children(reference_chips(&self.loaded, options));

        let container = Element::div("list-container").children(
            self.rows()
                .map(|(item, visible)| self.row_html(item, visible, highlighter.as_ref(), options)),
        );

        Element::div("list-view")
            .attr("data-dimension", &self.loaded.document.dimension)
            .child(header)
            .child(container)
    }

    fn row_html(
        &self,
        item: &DimensionItem,
        visible: bool,
        highlighter: Option<&Regex>,
        options: &RenderOptions,
    ) -> Element {
        let mut content = Element::div("list-item-content")
            .child(Element::div("list-item-title").raw(highlight(&item.name, highlighter)))
            .child(Element::text_el(
                "div",
                "list-item-path",
                item.path_components.join(PATH_SEPARATOR),
            ))
            .child(
                Element::div("list-item-description")
                    .raw(highlight(item.description_or_empty(), highlighter)),
            );
        if let Some(metadata) = metadata_html(item, options) {
            content = content.child(metadata);
        }

        let badge = Element::div("list-item-badge")
            .child(Element::text_el("span", "depth-badge", format!("D{}", item.depth)))
            .child(if item.has_children() {
                Element::text_el(
                    "span",
                    "children-badge",
                    format!("{} children", item.children_ids.len()),
                )
            } else {
                Element::text_el("span", "leaf-badge", "Leaf")
            });

        Element::div("list-item")
            .class(&format!("depth-{}", item.depth))
            .attr("data-id", &item.id)
            .hidden(!visible)
            .child(Element::text_el(
                "div",
                "list-item-icon",
                node_icon(&self.loaded.name, item.depth),
            ))
            .child(content)
            .child(badge)
    }

    /// Visible rows only, one per line.
    pub fn to_text(&self, options: &RenderOptions) -> String {
        let counts = format!(
            "Showing {} of {} items (search: '{}', depth: {})",
            self.visible_count(),
            self.row_count(),
            self.search,
            self.depth_filter
        );
        let mut out = header_text(&self.loaded, options, &counts);

        for (item, _) in self.rows().filter(|(_, visible)| *visible) {
            let badge = if item.has_children() {
                format!("{} children", item.children_ids.len())
            } else {
                "Leaf".to_string()
            };
            out.push_str(&format!(
                "{} {} {}  {}  {}\n",
                format!("D{}", item.depth).blue(),
                node_icon(&self.loaded.name, item.depth),
                item.name.bold(),
                item.path_components.join(PATH_SEPARATOR).dimmed(),
                badge
            ));
            if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
                out.push_str(&format!("      {description}\n"));
            }
            if let Some(metadata) = metadata_text(item, options) {
                out.push_str(&format!("      {}\n", metadata.dimmed()));
            }
        }
        out
    }
}

/// Escape `text`, wrapping matches in `<mark class="search-highlight">`.
fn highlight(text: &str, highlighter: Option<&Regex>) -> String {
    let Some(re) = highlighter else {
        return escape(text);
    };
    let mut out = String::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape(&text[last..m.start()]));
        out.push_str("<mark class=\"search-highlight\">");
        out.push_str(&escape(m.as_str()));
        out.push_str("</mark>");
        last = m.end();
    }
    out.push_str(&escape(&text[last..]));
    out
}
