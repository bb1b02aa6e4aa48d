//! Clinical skill-mix dimension explorer.
//!
//! Loads dimension documents (one JSON file per taxonomy), indexes their
//! hierarchy, derives statistics and renders tree, list and network views
//! plus the overview, statistics and reference panels as terminal text or
//! HTML fragments. The cube explorer combines eight dimensions into a single
//! competency sentence.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod render;
pub mod util;
