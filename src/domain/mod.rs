//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod hierarchy;
pub mod statistics;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use arena::{NodeData, NodeState, TreeArena, TreeNode};
pub use builder::{SkippedEdge, TreeBuilder};
pub use entities::*;
pub use error::DomainError;
pub use hierarchy::HierarchyMap;
pub use statistics::Statistics;
pub use validation::{validate, ValidationIssue, ValidationReport};
