//! Consistency checks for a dimension document.
//!
//! Loading never rejects a document; this report is what `validate` prints.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::entities::DimensionDocument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    DuplicateId { id: String },
    DanglingParent { id: String, parent_id: String },
    DanglingChild { id: String, child_id: String },
    RootDepth { id: String, depth: u32 },
    DepthMismatch { id: String, depth: u32, parent_depth: u32 },
    /// `children_ids` of `parent` lists `child`, but `child` names another parent
    ChildParentMismatch { parent: String, child: String },
    PathLength { id: String, components: usize, depth: u32 },
    InvalidLastUpdated { value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateId { id } => write!(f, "duplicate id '{id}'"),
            ValidationIssue::DanglingParent { id, parent_id } => {
                write!(f, "'{id}' references missing parent '{parent_id}'")
            }
            ValidationIssue::DanglingChild { id, child_id } => {
                write!(f, "'{id}' references missing child '{child_id}'")
            }
            ValidationIssue::RootDepth { id, depth } => {
                write!(f, "'{id}' has no parent but depth {depth}")
            }
            ValidationIssue::DepthMismatch {
                id,
                depth,
                parent_depth,
            } => write!(
                f,
                "'{id}' has depth {depth}, expected {} (parent depth {parent_depth})",
                u64::from(*parent_depth) + 1
            ),
            ValidationIssue::ChildParentMismatch { parent, child } => {
                write!(f, "'{parent}' lists child '{child}' whose parent_id differs")
            }
            ValidationIssue::PathLength {
                id,
                components,
                depth,
            } => write!(
                f,
                "'{id}' has {components} path components, expected {}",
                u64::from(*depth) + 1
            ),
            ValidationIssue::InvalidLastUpdated { value } => {
                write!(f, "reference.last_updated '{value}' is not YYYY-MM-DD")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub dimension: String,
    pub items_checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check referential integrity and depth invariants of `doc`.
pub fn validate(doc: &DimensionDocument) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut depth_of: HashMap<&str, u32> = HashMap::new();
    let mut parent_of: HashMap<&str, Option<&str>> = HashMap::new();

    for item in &doc.items {
        if !seen.insert(item.id.as_str()) {
            issues.push(ValidationIssue::DuplicateId {
                id: item.id.clone(),
            });
        }
        depth_of.insert(&item.id, item.depth);
        parent_of.insert(&item.id, item.parent_id.as_deref());
    }

    for item in &doc.items {
        match &item.parent_id {
            None if item.depth != 0 => issues.push(ValidationIssue::RootDepth {
                id: item.id.clone(),
                depth: item.depth,
            }),
            None => {}
            Some(parent_id) => match depth_of.get(parent_id.as_str()) {
                None => issues.push(ValidationIssue::DanglingParent {
                    id: item.id.clone(),
                    parent_id: parent_id.clone(),
                }),
                Some(&parent_depth) if parent_depth.checked_add(1) != Some(item.depth) => {
                    issues.push(ValidationIssue::DepthMismatch {
                        id: item.id.clone(),
                        depth: item.depth,
                        parent_depth,
                    })
                }
                Some(_) => {}
            },
        }

        for child_id in &item.children_ids {
            match parent_of.get(child_id.as_str()) {
                None => issues.push(ValidationIssue::DanglingChild {
                    id: item.id.clone(),
                    child_id: child_id.clone(),
                }),
                Some(parent) if *parent != Some(item.id.as_str()) => {
                    issues.push(ValidationIssue::ChildParentMismatch {
                        parent: item.id.clone(),
                        child: child_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        // hand-written files often leave the breadcrumb out entirely
        if !item.path_components.is_empty()
            && item.path_components.len() as u64 != u64::from(item.depth) + 1
        {
            issues.push(ValidationIssue::PathLength {
                id: item.id.clone(),
                components: item.path_components.len(),
                depth: item.depth,
            });
        }
    }

    if let Some(value) = doc.reference.as_ref().and_then(|r| r.last_updated.as_ref()) {
        if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            issues.push(ValidationIssue::InvalidLastUpdated {
                value: value.clone(),
            });
        }
    }

    ValidationReport {
        dimension: doc.dimension.clone(),
        items_checked: doc.items.len(),
        issues,
    }
}
