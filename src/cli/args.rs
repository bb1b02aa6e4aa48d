//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::render::{DepthFilter, PanelKind};

/// Clinical skill-mix dimension explorer: hierarchy views, info panels and the cube explorer
#[derive(Parser, Debug)]
#[command(name = "skillmix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Data directory holding the category folder (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a dimension as hierarchy, list or network view
    Show {
        /// Dimension name, e.g. task or care_phases
        dimension: String,

        /// hierarchy | list | network (unknown values show the hierarchy)
        #[arg(long)]
        view: Option<String>,

        /// Expand the node with this id (repeatable)
        #[arg(long = "expand", value_name = "ID")]
        expand: Vec<String>,

        /// Expand every node
        #[arg(long)]
        expand_all: bool,

        /// Send key events to the focused node, e.g. ArrowDown or Enter (repeatable)
        #[arg(long = "key", value_name = "KEY")]
        keys: Vec<String>,

        /// List view: case-insensitive search in name and description
        #[arg(long)]
        search: Option<String>,

        /// List view: `all` or a depth number
        #[arg(long, default_value = "all")]
        depth: DepthFilter,

        /// Show item metadata (overrides config)
        #[arg(long)]
        metadata: Option<bool>,

        /// Show reference chips in the header
        #[arg(long)]
        references: bool,

        /// Emit an HTML fragment instead of terminal text
        #[arg(long)]
        html: bool,
    },

    /// Render the overview, statistics and reference panels
    Panels {
        dimension: String,

        #[arg(long, value_enum, default_value_t = PanelKind::All)]
        panel: PanelKind,

        /// Emit HTML fragments instead of terminal text
        #[arg(long)]
        html: bool,
    },

    /// Write <dimension>-dimension.json
    Export {
        dimension: String,

        /// Output directory (default: cwd)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: Option<PathBuf>,
    },

    /// Check a dimension for inconsistent references and depths
    Validate { dimension: String },

    /// Count items in every cube dimension
    Count,

    /// Build the competency sentence from the cube dimensions
    Cube {
        /// Select an item: key=id, e.g. care_phase=diagnosis (repeatable)
        #[arg(long = "select", value_name = "KEY=ID")]
        select: Vec<String>,

        /// Do not pre-select the default items
        #[arg(long)]
        no_defaults: bool,

        /// Pick every dimension with the fuzzy selector
        #[arg(short, long)]
        interactive: bool,

        /// Emit the dropdowns and scenario box as HTML
        #[arg(long)]
        html: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
