//! Domain entities: the dimension document and its items

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of a dimension taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionItem {
    /// Unique within its dimension file, usually the `/`-joined path
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hierarchy level, 0 for roots
    pub depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children_ids: Vec<String>,
    /// Breadcrumb segments, root first
    #[serde(default)]
    pub path_components: Vec<String>,
    /// Free-form key/value pairs, in file order
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Fields the explorer does not interpret (e.g. `level_info`), kept for export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DimensionItem {
    pub fn has_children(&self) -> bool {
        !self.children_ids.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Alphabetical by name ignoring case; names differing only in case
    /// fall back to a byte comparison.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Evidence base of a dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burden_metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Human labels for hierarchy levels.
///
/// Generated files carry a list indexed by depth; hand-written ones sometimes
/// use an object keyed by the depth number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HierarchyLevels {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Default for HierarchyLevels {
    fn default() -> Self {
        HierarchyLevels::List(Vec::new())
    }
}

impl HierarchyLevels {
    /// Label for `depth`, if the document names it.
    pub fn label(&self, depth: u32) -> Option<&str> {
        match self {
            HierarchyLevels::List(levels) => levels.get(depth as usize).map(String::as_str),
            HierarchyLevels::Map(levels) => levels.get(&depth.to_string()).map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            HierarchyLevels::List(levels) => levels.is_empty(),
            HierarchyLevels::Map(levels) => levels.is_empty(),
        }
    }

    /// Labels ordered by depth.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            HierarchyLevels::List(levels) => levels.iter().map(String::as_str).collect(),
            HierarchyLevels::Map(levels) => {
                let mut pairs: Vec<(u32, &str)> = levels
                    .iter()
                    .filter_map(|(k, v)| k.parse::<u32>().ok().map(|d| (d, v.as_str())))
                    .collect();
                pairs.sort_by_key(|(d, _)| *d);
                pairs.into_iter().map(|(_, v)| v).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HierarchyInfo {
    #[serde(default)]
    pub levels: HierarchyLevels,
    /// `structure`, `max_depth` and anything else the generator wrote
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A whole dimension file as published next to the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDocument {
    pub dimension: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<DimensionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default)]
    pub hierarchy: HierarchyInfo,
    #[serde(default)]
    pub dimension_metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DimensionDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Pretty JSON, the format used for exports.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deepest item level; 0 for an empty document.
    pub fn max_depth(&self) -> u32 {
        self.items.iter().map(|i| i.depth).max().unwrap_or(0)
    }
}

/// Render a metadata value the way panels show it.
///
/// Strings are shown bare, arrays are joined with ", ".
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(values) => values
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
