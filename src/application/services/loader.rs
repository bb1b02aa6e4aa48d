//! Dimension loading: fetch, parse, index, cache.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::cache::DimensionCache;
use crate::application::error::LoadFailure;
use crate::application::{ApplicationError, ApplicationResult, OperationContext};
use crate::domain::{
    DimensionDocument, DimensionItem, DomainError, HierarchyMap, Statistics,
};
use crate::infrastructure::traits::{DocumentSource, FileSystem};

/// A document together with everything derived from it on load.
///
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDimension {
    /// Name the dimension was requested under
    pub name: String,
    pub document: DimensionDocument,
    pub hierarchy: HierarchyMap,
    pub statistics: Statistics,
    pub max_depth: u32,
}

impl LoadedDimension {
    /// Run the indexer and statistics over `document`.
    pub fn process(name: &str, document: DimensionDocument) -> Self {
        let hierarchy = HierarchyMap::build(&document.items);
        let statistics = Statistics::calculate(&document.items);
        let max_depth = document.max_depth();
        Self {
            name: name.to_string(),
            document,
            hierarchy,
            statistics,
            max_depth,
        }
    }

    pub fn items(&self) -> &[DimensionItem] {
        &self.document.items
    }

    pub fn item(&self, id: &str) -> Option<&DimensionItem> {
        self.hierarchy
            .position(id)
            .map(|position| &self.document.items[position])
    }

    /// Resolvable children of `id`, in `children_ids` order.
    pub fn children(&self, id: &str) -> Vec<&DimensionItem> {
        self.hierarchy
            .child_ids(id)
            .iter()
            .filter_map(|child| self.item(child))
            .collect()
    }

    pub fn parent(&self, id: &str) -> Option<&DimensionItem> {
        self.hierarchy
            .parent_id(id)
            .and_then(|parent| self.item(parent))
    }

    /// Depth-0 items in input order.
    pub fn roots(&self) -> Vec<&DimensionItem> {
        self.hierarchy
            .at_depth(0)
            .iter()
            .map(|&position| &self.document.items[position])
            .collect()
    }

    /// File name used when exporting this dimension.
    pub fn export_file_name(&self) -> String {
        format!("{}-dimension.json", self.name)
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        self.document.to_json_pretty()
    }
}

/// Fetches dimension documents and keeps the processed result.
pub struct DimensionLoader {
    source: Arc<dyn DocumentSource>,
    category: String,
    cache: DimensionCache,
}

impl DimensionLoader {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        category: impl Into<String>,
        cache_capacity: u64,
    ) -> Self {
        Self {
            source,
            category: category.into(),
            cache: DimensionCache::new(cache_capacity),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn cache(&self) -> &DimensionCache {
        &self.cache
    }

    /// Relative location of `name`: `<category>/<name>.json`.
    pub fn location(&self, name: &str) -> String {
        format!("{}/{}.json", self.category, name)
    }

    /// Load `name`, from cache when present.
    ///
    /// Concurrent calls for the same name run one fetch between them.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, name: &str) -> ApplicationResult<Arc<LoadedDimension>> {
        validate_name(name)?;

        if let Some(hit) = self.cache.get(name) {
            debug!("load: cache hit name={}", name);
            return Ok(hit);
        }

        debug!("load: cache miss name={}", name);
        self.cache
            .get_or_load(name, || self.fetch_and_process(name))
            .map_err(|reason| {
                warn!(dimension = name, %reason, "load failed");
                ApplicationError::LoadFailed {
                    dimension: name.to_string(),
                    reason,
                }
            })
    }

    fn fetch_and_process(&self, name: &str) -> Result<Arc<LoadedDimension>, LoadFailure> {
        let location = self.location(name);
        let described = self.source.describe(&location);

        let text = self.source.fetch(&location).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadFailure::NotFound {
                location: described.clone(),
            },
            io::ErrorKind::TimedOut => LoadFailure::Timeout {
                location: described.clone(),
            },
            _ => LoadFailure::Fetch {
                location: described.clone(),
                message: e.to_string(),
            },
        })?;

        let document = DimensionDocument::from_json(&text).map_err(|e| LoadFailure::Parse {
            location: described.clone(),
            message: e.to_string(),
        })?;

        let loaded = LoadedDimension::process(name, document);
        debug!(
            "fetch_and_process: name={} items={} max_depth={}",
            name, loaded.statistics.total_items, loaded.max_depth
        );
        Ok(Arc::new(loaded))
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    /// Drop `name` so the next load fetches again.
    pub fn invalidate(&self, name: &str) {
        self.cache.invalidate(name);
    }

    /// Dimension names the source offers for the configured category.
    pub fn available(&self) -> ApplicationResult<Vec<String>> {
        self.source
            .list(&self.category)
            .during("list dimensions in", &self.category)
    }

    /// Write `<dimension>-dimension.json` into `dir`, returning the path written.
    #[instrument(level = "debug", skip(self, fs, loaded))]
    pub fn export(
        &self,
        fs: &dyn FileSystem,
        loaded: &LoadedDimension,
        dir: &Path,
    ) -> ApplicationResult<PathBuf> {
        let target = dir.join(loaded.export_file_name());
        let json = loaded
            .export_json()
            .during("serialize dimension", &loaded.name)?;

        fs.ensure_parent(&target)
            .during("create export directory", target.display())?;
        fs.write(&target, &json)
            .during("write export", target.display())?;

        debug!("export: wrote {}", target.display());
        Ok(target)
    }
}

impl std::fmt::Debug for DimensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionLoader")
            .field("category", &self.category)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Names become part of a path or URL, so only a safe alphabet is accepted.
fn validate_name(name: &str) -> Result<(), DomainError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidDimensionName(name.to_string()))
    }
}
