//! Bounded cache of processed dimensions, keyed by dimension name.

use std::sync::Arc;

use moka::sync::Cache;

use crate::application::error::LoadFailure;
use crate::application::services::LoadedDimension;

/// Entry count snapshot for `config show`/debug output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: u64,
    pub max_capacity: u64,
}

/// Processed dimensions, bounded by `max_capacity`.
///
/// Eviction and admission follow moka's TinyLFU policy, so near capacity a
/// fresh entry may be rejected rather than displacing a hotter one.
///
/// Concurrent misses for the same name share one load: the first caller runs
/// the loader, the others wait and receive its result. Failures are handed
/// to every waiter but never stored, so the next call fetches again.
#[derive(Clone)]
pub struct DimensionCache {
    inner: Cache<String, Arc<LoadedDimension>>,
    max_capacity: u64,
}

impl DimensionCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            max_capacity,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoadedDimension>> {
        self.inner.get(name)
    }

    /// Cached value for `name`, or the result of running `load` once.
    pub fn get_or_load<F>(
        &self,
        name: &str,
        load: F,
    ) -> Result<Arc<LoadedDimension>, Arc<LoadFailure>>
    where
        F: FnOnce() -> Result<Arc<LoadedDimension>, LoadFailure>,
    {
        self.inner.try_get_with(name.to_string(), load)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn invalidate(&self, name: &str) {
        self.inner.invalidate(name);
    }

    /// Approximate until pending maintenance has run.
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
            max_capacity: self.max_capacity,
        }
    }
}

impl std::fmt::Debug for DimensionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionCache")
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DimensionDocument;

    fn loaded(name: &str) -> Arc<LoadedDimension> {
        let doc = DimensionDocument::from_json(&format!(r#"{{"dimension":"{name}","items":[]}}"#))
            .unwrap();
        Arc::new(LoadedDimension::process(name, doc))
    }

    #[test]
    fn given_cached_entry_when_loading_again_then_loader_not_called() {
        let cache = DimensionCache::new(4);
        cache.get_or_load("task", || Ok(loaded("task"))).unwrap();

        let again = cache
            .get_or_load("task", || panic!("loader must not run on a hit"))
            .unwrap();

        assert_eq!(again.name, "task");
        assert!(cache.contains("task"));
    }

    #[test]
    fn given_failed_load_when_loading_again_then_retried() {
        let cache = DimensionCache::new(4);
        let failure = LoadFailure::NotFound {
            location: "x/task.json".into(),
        };

        let err = cache.get_or_load("task", || Err(failure.clone())).unwrap_err();
        assert_eq!(*err, failure);
        assert!(!cache.contains("task"));

        assert!(cache.get_or_load("task", || Ok(loaded("task"))).is_ok());
    }

    #[test]
    fn given_entry_when_invalidating_then_gone() {
        let cache = DimensionCache::new(4);
        cache.get_or_load("task", || Ok(loaded("task"))).unwrap();

        cache.invalidate("task");

        assert!(cache.get("task").is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }
}
