//! Render layer: view models with terminal and HTML output
//!
//! HTML output follows the element ids and classes the published site's
//! stylesheet and scripts expect.

pub mod html;
pub mod list;
pub mod network;
pub mod panels;
pub mod tree;
pub mod view;

pub use list::{DepthFilter, ListView};
pub use network::NetworkView;
pub use panels::{InfoPanels, PanelKind};
pub use tree::{NodeEvent, TreeKey, TreeView};
pub use view::{RenderOptions, View, ViewMode};
