//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (DocumentSource, FileSystem, Selector)
//! but are themselves concrete structs, not traits.

pub mod census;
pub mod cube;
mod explorer;
mod loader;

pub use census::{Census, DimensionCount};
pub use cube::{CubeExplorer, CubeVocabulary, Framework, Scenario};
pub use explorer::{DimensionExplorer, Visualization};
pub use loader::{DimensionLoader, LoadedDimension};
