//! Item fixtures for unit tests.

use serde_json::Map;

use crate::domain::entities::DimensionItem;

pub(crate) fn item(id: &str, depth: u32, parent: Option<&str>, children: &[&str]) -> DimensionItem {
    DimensionItem {
        id: id.to_string(),
        name: id.to_uppercase(),
        description: None,
        depth,
        parent_id: parent.map(str::to_string),
        children_ids: children.iter().map(|c| c.to_string()).collect(),
        path_components: id.split('/').map(str::to_string).collect(),
        metadata: Map::new(),
        extra: Map::new(),
    }
}

pub(crate) fn named(id: &str, name: &str, depth: u32, description: Option<&str>) -> DimensionItem {
    DimensionItem {
        name: name.to_string(),
        description: description.map(str::to_string),
        ..item(id, depth, None, &[])
    }
}
