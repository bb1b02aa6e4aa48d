//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{
    CubeExplorer, CubeVocabulary, DimensionExplorer, DimensionLoader,
};
use crate::config::Settings;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{
    DirectorySource, DocumentSource, FileSystem, HttpSource, RealFileSystem, Selector,
    SkimSelector,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction (exports)
    pub fs: Arc<dyn FileSystem>,

    /// Interactive selector (cube explorer)
    pub selector: Arc<dyn Selector>,

    /// Shared loader; its cache serves every explorer built from this container
    pub loader: Arc<DimensionLoader>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// Documents come over HTTP when `base_url` is set, else from `data_dir`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let source: Arc<dyn DocumentSource> = match &settings.base_url {
            Some(url) => {
                debug!("ServiceContainer: http source {}", url);
                let http = HttpSource::new(url.as_str(), settings.fetch_timeout())
                    .map_err(|e| InfraError::io(format!("create HTTP client for {url}"), e))?;
                Arc::new(http)
            }
            None => {
                debug!("ServiceContainer: directory source {}", settings.data_dir.display());
                Arc::new(DirectorySource::new(settings.data_dir.clone()))
            }
        };
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            source,
            Arc::new(SkimSelector),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn DocumentSource>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        let loader = Arc::new(DimensionLoader::new(
            source,
            settings.category.clone(),
            settings.cache_capacity,
        ));
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            selector,
            loader,
        }
    }

    pub fn explorer(&self) -> DimensionExplorer {
        DimensionExplorer::new(Arc::clone(&self.loader), self.settings.render_options())
    }

    /// Cube explorer over the bundled vocabulary with config overrides applied.
    pub fn cube_explorer(&self) -> InfraResult<CubeExplorer> {
        let vocabulary = self.vocabulary()?;
        Ok(CubeExplorer::new(vocabulary)?)
    }

    pub fn vocabulary(&self) -> InfraResult<CubeVocabulary> {
        Ok(CubeVocabulary::bundled()?.with_overrides(&self.settings.cube))
    }
}
