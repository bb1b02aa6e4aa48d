//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/skillmix/skillmix.toml`
//! 3. Local config: `<data_dir>/.skillmix.toml`
//! 4. Environment variables: `SKILLMIX_*` prefix

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::render::{RenderOptions, ViewMode};

/// Cube explorer overrides merged over the bundled vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CubeConfig {
    /// Extra role name → plural person form conversions
    pub person_forms: BTreeMap<String, String>,
    /// Dimension key → default item id
    pub defaults: BTreeMap<String, String>,
}

/// Raw cube config for intermediate parsing (maps are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCubeConfig {
    pub person_forms: Option<BTreeMap<String, String>>,
    pub defaults: Option<BTreeMap<String, String>>,
}

impl CubeConfig {
    /// Merge map entries: overlay wins per key, a `!key` entry removes `key`.
    ///
    /// # Examples
    /// ```ignore
    /// merge_map({a: 1}, {b: 2})        // → {a: 1, b: 2}
    /// merge_map({a: 1, b: 2}, {"!a": ""}) // → {b: 2}
    /// ```
    pub fn merge_map(
        base: &BTreeMap<String, String>,
        overlay: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut result = base.clone();
        for (key, value) in overlay {
            if let Some(negated) = key.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(key.clone(), value.clone());
            }
        }
        result
    }

    pub fn merge(&self, overlay: &RawCubeConfig) -> Self {
        Self {
            person_forms: overlay
                .person_forms
                .as_ref()
                .map(|o| Self::merge_map(&self.person_forms, o))
                .unwrap_or_else(|| self.person_forms.clone()),
            defaults: overlay
                .defaults
                .as_ref()
                .map(|o| Self::merge_map(&self.defaults, o))
                .unwrap_or_else(|| self.defaults.clone()),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub category: Option<String>,
    pub base_url: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub cache_capacity: Option<u64>,
    /// Kept as text so unknown modes fall back to hierarchy instead of failing
    pub default_view: Option<String>,
    pub show_metadata: Option<bool>,
    pub show_references: Option<bool>,
    pub metadata_limit: Option<usize>,
    pub dimension_metadata_limit: Option<usize>,
    pub cube: RawCubeConfig,
}

/// Unified configuration for skillmix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root holding the category folders (default: current directory)
    pub data_dir: PathBuf,
    /// Folder below `data_dir` (or `base_url`) with the dimension files
    pub category: String,
    /// Fetch documents over HTTP below this URL instead of reading `data_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub fetch_timeout_secs: u64,
    /// Processed dimensions kept in memory
    pub cache_capacity: u64,
    pub default_view: ViewMode,
    pub show_metadata: bool,
    pub show_references: bool,
    pub metadata_limit: usize,
    pub dimension_metadata_limit: usize,
    pub cube: CubeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            data_dir: PathBuf::from("."),
            category: "clinical-skill-mix".into(),
            base_url: None,
            fetch_timeout_secs: 30,
            cache_capacity: 32,
            default_view: render.view_mode,
            show_metadata: render.show_metadata,
            show_references: render.show_references,
            metadata_limit: render.metadata_limit,
            dimension_metadata_limit: render.dimension_metadata_limit,
            cube: CubeConfig::default(),
        }
    }
}

/// Get the XDG config directory for skillmix.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "skillmix").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("skillmix.toml"))
}

/// Get the path to the local config file in a data directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".skillmix.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Directory holding the dimension files.
    pub fn category_dir(&self) -> PathBuf {
        self.data_dir.join(&self.category)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            view_mode: self.default_view,
            show_metadata: self.show_metadata,
            show_references: self.show_references,
            metadata_limit: self.metadata_limit,
            dimension_metadata_limit: self.dimension_metadata_limit,
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
        self.base_url = self.base_url.as_deref().map(expand_env_vars);
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            category: overlay
                .category
                .clone()
                .unwrap_or_else(|| self.category.clone()),
            base_url: overlay.base_url.clone().or_else(|| self.base_url.clone()),
            fetch_timeout_secs: overlay.fetch_timeout_secs.unwrap_or(self.fetch_timeout_secs),
            cache_capacity: overlay.cache_capacity.unwrap_or(self.cache_capacity),
            default_view: overlay
                .default_view
                .as_deref()
                .map(parse_view)
                .unwrap_or(self.default_view),
            show_metadata: overlay.show_metadata.unwrap_or(self.show_metadata),
            show_references: overlay.show_references.unwrap_or(self.show_references),
            metadata_limit: overlay.metadata_limit.unwrap_or(self.metadata_limit),
            dimension_metadata_limit: overlay
                .dimension_metadata_limit
                .unwrap_or(self.dimension_metadata_limit),
            cube: self.cube.merge(&overlay.cube),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `data_dir` - Data directory from the command line; holds the local
    ///   config and overrides `data_dir` from every other layer
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/skillmix/skillmix.toml`
    /// 3. Local config: `<data_dir>/.skillmix.toml`
    /// 4. Environment variables: `SKILLMIX_*` prefix
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config next to the data
        let local_dir = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| current.data_dir.clone());
        let local_path = local_config_path(&local_dir);
        if local_path.exists() {
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        if let Some(dir) = data_dir {
            current.data_dir = dir.to_path_buf();
        }

        current.expand_paths();

        Ok(current)
    }

    /// Apply SKILLMIX_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SKILLMIX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("category") {
            settings.category = val;
        }
        if let Ok(val) = config.get_string("base_url") {
            settings.base_url = Some(val);
        }
        if let Ok(val) = config.get::<u64>("fetch_timeout_secs") {
            settings.fetch_timeout_secs = val;
        }
        if let Ok(val) = config.get::<u64>("cache_capacity") {
            settings.cache_capacity = val;
        }
        if let Ok(val) = config.get_string("default_view") {
            settings.default_view = parse_view(&val);
        }
        if let Ok(val) = config.get_bool("show_metadata") {
            settings.show_metadata = val;
        }
        if let Ok(val) = config.get_bool("show_references") {
            settings.show_references = val;
        }
        if let Ok(val) = config.get::<usize>("metadata_limit") {
            settings.metadata_limit = val;
        }
        if let Ok(val) = config.get::<usize>("dimension_metadata_limit") {
            settings.dimension_metadata_limit = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# skillmix configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/skillmix/skillmix.toml
#   Local:  <data_dir>/.skillmix.toml
#   Env:    SKILLMIX_* environment variables (e.g. SKILLMIX_CACHE_CAPACITY=8)

# Root directory holding the category folder
# data_dir = "."

# Folder with the dimension JSON files
# category = "clinical-skill-mix"

# Fetch documents over HTTP instead of reading data_dir
# base_url = "https://example.org/site"
# fetch_timeout_secs = 30

# Processed dimensions kept in memory
# cache_capacity = 32

# hierarchy | list | network
# default_view = "hierarchy"
# show_metadata = true
# show_references = false
# metadata_limit = 3
# dimension_metadata_limit = 5

[cube]
# Extra role name conversions; "!Name" removes an inherited one
# person_forms = { "Geriatrics" = "geriatricians" }

# Default selection per cube dimension
# defaults = { care_phase = "diagnosis" }
"#
        .to_string()
    }
}

fn parse_view(s: &str) -> ViewMode {
    match s.parse::<ViewMode>() {
        Ok(mode) => mode,
        Err(never) => match never {},
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_match_site_behaviour() {
        let settings = Settings::default();
        assert_eq!(settings.category, "clinical-skill-mix");
        assert_eq!(settings.default_view, ViewMode::Hierarchy);
        assert!(settings.show_metadata);
        assert!(!settings.show_references);
        assert_eq!(settings.metadata_limit, 3);
        assert_eq!(settings.dimension_metadata_limit, 5);
        assert_eq!(settings.category_dir(), PathBuf::from("./clinical-skill-mix"));
    }

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/skillmix-site"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(
            settings.data_dir.to_string_lossy().starts_with(&home),
            "data_dir should start with home dir: {}",
            settings.data_dir.display()
        );
    }

    #[test]
    fn given_overlay_with_negation_when_merging_map_then_entry_removed() {
        let base = BTreeMap::from([
            ("Cardiology".to_string(), "cardiologists".to_string()),
            ("Urology".to_string(), "urologists".to_string()),
        ]);
        let overlay = BTreeMap::from([
            ("!Urology".to_string(), String::new()),
            ("Geriatrics".to_string(), "geriatricians".to_string()),
        ]);

        let merged = CubeConfig::merge_map(&base, &overlay);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("Geriatrics").map(String::as_str), Some("geriatricians"));
        assert!(!merged.contains_key("Urology"));
    }

    #[test]
    fn given_unknown_view_in_overlay_when_merging_then_hierarchy() {
        let raw = RawSettings {
            default_view: Some("sunburst".into()),
            ..Default::default()
        };
        let merged = Settings {
            default_view: ViewMode::List,
            ..Settings::default()
        }
        .merge_with(&raw);
        assert_eq!(merged.default_view, ViewMode::Hierarchy);
    }

    #[test]
    fn given_settings_when_serializing_then_template_and_toml_parse_back() {
        let toml_text = Settings::default().to_toml().unwrap();
        let parsed: RawSettings = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed.category.as_deref(), Some("clinical-skill-mix"));

        let template: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(template.category.is_none());
    }
}
