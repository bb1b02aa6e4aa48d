//! Item counts across all cube dimensions.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::application::services::cube::{CubeDimension, CubeVocabulary, Framework};
use crate::application::services::{DimensionLoader, LoadedDimension};
use crate::application::ApplicationResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepthCount {
    pub depth: u32,
    /// Level name from the document, when it has one
    pub label: Option<String>,
    pub count: usize,
}

/// Counts for one dimension, or why it could not be counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionCount {
    pub key: String,
    pub file: String,
    pub framework: Framework,
    pub total: usize,
    pub by_depth: Vec<DepthCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DimensionCount {
    fn counted(dimension: &CubeDimension, loaded: &LoadedDimension) -> Self {
        let levels = &loaded.document.hierarchy.levels;
        let by_depth = loaded
            .statistics
            .items_by_depth
            .iter()
            .map(|(&depth, &count)| DepthCount {
                depth,
                label: levels.label(depth).map(str::to_string),
                count,
            })
            .collect();
        Self {
            key: dimension.key.clone(),
            file: dimension.file.clone(),
            framework: dimension.framework,
            total: loaded.statistics.total_items,
            by_depth,
            error: None,
        }
    }

    fn failed(dimension: &CubeDimension, error: String) -> Self {
        Self {
            key: dimension.key.clone(),
            file: dimension.file.clone(),
            framework: dimension.framework,
            total: 0,
            by_depth: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Census {
    pub dimensions: Vec<DimensionCount>,
}

impl Census {
    /// Count every vocabulary dimension, loading them in parallel.
    #[instrument(level = "debug", skip_all)]
    pub fn take(loader: &DimensionLoader, vocabulary: &CubeVocabulary) -> Self {
        let results: Vec<ApplicationResult<Arc<LoadedDimension>>> = vocabulary
            .dimensions
            .par_iter()
            .map(|d| loader.load(&d.file))
            .collect();

        let dimensions = vocabulary
            .dimensions
            .iter()
            .zip(results)
            .map(|(dimension, result)| match result {
                Ok(loaded) => DimensionCount::counted(dimension, &loaded),
                Err(e) => {
                    warn!(dimension = %dimension.key, error = %e, "dimension not counted");
                    DimensionCount::failed(dimension, e.to_string())
                }
            })
            .collect();
        Self { dimensions }
    }

    pub fn framework(&self, framework: Framework) -> impl Iterator<Item = &DimensionCount> {
        self.dimensions
            .iter()
            .filter(move |d| d.framework == framework)
    }

    pub fn framework_total(&self, framework: Framework) -> usize {
        self.framework(framework).map(|d| d.total).sum()
    }

    pub fn grand_total(&self) -> usize {
        self.dimensions.iter().map(|d| d.total).sum()
    }

    pub fn failures(&self) -> usize {
        self.dimensions.iter().filter(|d| d.error.is_some()).count()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for framework in Framework::ALL {
            out.push_str(&format!("{}\n", framework.title()));
            for dimension in self.framework(framework) {
                match &dimension.error {
                    Some(error) => {
                        out.push_str(&format!("  {:<20} not loaded: {}\n", dimension.key, error));
                    }
                    None => {
                        out.push_str(&format!("  {:<20} {:>6}\n", dimension.key, dimension.total));
                        for level in &dimension.by_depth {
                            let label = level.label.as_deref().unwrap_or("Unknown");
                            out.push_str(&format!(
                                "    Level {} ({}): {}\n",
                                level.depth, label, level.count
                            ));
                        }
                    }
                }
            }
            out.push_str(&format!(
                "  {:<20} {:>6}\n\n",
                format!("{} total", framework.code()),
                self.framework_total(framework)
            ));
        }
        out.push_str(&format!("Total items: {}\n", self.grand_total()));
        out
    }
}
