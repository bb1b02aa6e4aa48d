//! Dimension explorer: the active dimension and how it is shown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::{DimensionLoader, LoadedDimension};
use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::FileSystem;
use crate::render::view::{error_panel_html, error_panel_text};
use crate::render::{InfoPanels, ListView, RenderOptions, TreeView, View, ViewMode};

/// What the visualization container currently holds.
#[derive(Debug)]
pub enum Visualization {
    Empty,
    Rendered(View),
    /// A load failed; the message replaces the visualization
    Failed { dimension: String, message: String },
}

/// Explorer state: loader, display options, active dimension and its view.
///
/// A failed load only replaces the visualization; the previously active
/// dimension stays current.
#[derive(Debug)]
pub struct DimensionExplorer {
    loader: Arc<DimensionLoader>,
    options: RenderOptions,
    current: Option<Arc<LoadedDimension>>,
    visualization: Visualization,
}

impl DimensionExplorer {
    pub fn new(loader: Arc<DimensionLoader>, options: RenderOptions) -> Self {
        Self {
            loader,
            options,
            current: None,
            visualization: Visualization::Empty,
        }
    }

    /// Load `name` and make it current. Failures render the error panel and yield None.
    pub fn select_dimension(&mut self, name: &str) -> Option<Arc<LoadedDimension>> {
        self.try_select_dimension(name).ok()
    }

    /// Like `select_dimension`, but hands the load error back to the caller.
    #[instrument(level = "debug", skip(self))]
    pub fn try_select_dimension(&mut self, name: &str) -> ApplicationResult<Arc<LoadedDimension>> {
        match self.loader.load(name) {
            Ok(loaded) => {
                info!("Loaded dimension: {} ({} items)", name, loaded.statistics.total_items);
                self.visualization =
                    Visualization::Rendered(View::build(&loaded, self.options.view_mode));
                self.current = Some(Arc::clone(&loaded));
                Ok(loaded)
            }
            Err(e) => {
                let message = match &e {
                    ApplicationError::LoadFailed { reason, .. } => {
                        format!("Failed to load {name} dimension: {reason}")
                    }
                    other => format!("Failed to load {name} dimension: {other}"),
                };
                self.visualization = Visualization::Failed {
                    dimension: name.to_string(),
                    message,
                };
                Err(e)
            }
        }
    }

    pub fn current(&self) -> Option<&Arc<LoadedDimension>> {
        self.current.as_ref()
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn visualization(&self) -> &Visualization {
        &self.visualization
    }

    /// Re-render the current dimension in `mode`.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        debug!("set_view_mode: {}", mode);
        self.options.view_mode = mode;
        if let (Some(loaded), Visualization::Rendered(_)) = (&self.current, &self.visualization) {
            self.visualization = Visualization::Rendered(View::build(loaded, mode));
        }
    }

    pub fn set_show_metadata(&mut self, show: bool) {
        self.options.show_metadata = show;
    }

    pub fn set_show_references(&mut self, show: bool) {
        self.options.show_references = show;
    }

    pub fn tree_mut(&mut self) -> Option<&mut TreeView> {
        match &mut self.visualization {
            Visualization::Rendered(View::Tree(tree)) => Some(tree),
            _ => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut ListView> {
        match &mut self.visualization {
            Visualization::Rendered(View::List(list)) => Some(list),
            _ => None,
        }
    }

    pub fn render_html(&self) -> String {
        match &self.visualization {
            Visualization::Empty => String::new(),
            Visualization::Rendered(view) => view.to_html(&self.options).render(),
            Visualization::Failed { message, .. } => error_panel_html(message).render(),
        }
    }

    pub fn render_text(&self) -> String {
        match &self.visualization {
            Visualization::Empty => String::new(),
            Visualization::Rendered(view) => view.to_text(&self.options),
            Visualization::Failed { message, .. } => error_panel_text(message),
        }
    }

    /// Panels of the current dimension.
    pub fn panels(&self) -> Option<InfoPanels> {
        self.current
            .as_ref()
            .map(|loaded| InfoPanels::render(loaded, &self.options))
    }

    /// Export the current dimension to `dir`.
    pub fn export(&self, fs: &dyn FileSystem, dir: &Path) -> ApplicationResult<PathBuf> {
        let loaded = self.current.as_ref().ok_or(ApplicationError::NothingLoaded)?;
        self.loader.export(fs, loaded, dir)
    }
}
