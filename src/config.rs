//! Render configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file only lists the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [toc]
//! title = "Table of Contents"  # Used when a document has no `toc-title`
//! location = "right"           # Used when a document has no `toc-location`
//! max_level = 4                # Deepest heading level listed in the TOC
//! indent_step = 1.25           # rem of indentation per level below h2
//!
//! [images]
//! class = "img-fluid"          # CSS class on every rendered image
//! lazy = true                  # Emit loading="lazy"
//!
//! [processing]
//! max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Table-of-contents defaults and layout.
    pub toc: TocConfig,
    /// Rendered image attributes.
    pub images: ImagesConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl RenderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=6).contains(&self.toc.max_level) {
            return Err(ConfigError::Validation(
                "toc.max_level must be 1-6".into(),
            ));
        }
        if !self.toc.indent_step.is_finite() || self.toc.indent_step < 0.0 {
            return Err(ConfigError::Validation(
                "toc.indent_step must be a non-negative number".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Table-of-contents settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TocConfig {
    /// Heading shown above the TOC when the document sets no `toc-title`.
    pub title: String,
    /// Placement hint used when the document sets no `toc-location`.
    pub location: String,
    /// Deepest heading level collected for the TOC (1-6).
    pub max_level: u8,
    /// Left margin, in rem, added per heading level below h2.
    pub indent_step: f64,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            title: "Table of Contents".to_string(),
            location: "right".to_string(),
            max_level: 4,
            indent_step: 1.25,
        }
    }
}

/// Attributes for rendered `<img>` elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// CSS class applied to every image.
    pub class: String,
    /// Whether images carry `loading="lazy"`.
    pub lazy: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            class: "img-fluid".to_string(),
            lazy: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel rendering workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RenderConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RenderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<RenderConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Press Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Table of contents
# ---------------------------------------------------------------------------
[toc]
# Title shown above the TOC when a document's header has no `toc-title`.
title = "Table of Contents"

# Placement hint when a document's header has no `toc-location`.
location = "right"

# Deepest heading level (1-6) collected into the TOC.
max_level = 4

# Left margin in rem added for each heading level below h2.
indent_step = 1.25

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# CSS class applied to every rendered <img>.
class = "img-fluid"

# Emit loading="lazy" on images.
lazy = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel rendering workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = RenderConfig::default();
        assert_eq!(config.toc.title, "Table of Contents");
        assert_eq!(config.toc.location, "right");
        assert_eq!(config.toc.max_level, 4);
        assert_eq!(config.toc.indent_step, 1.25);
        assert_eq!(config.images.class, "img-fluid");
        assert!(config.images.lazy);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[toc]
title = "Contents"
"#;
        let config: RenderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.toc.title, "Contents");
        // Defaults preserved
        assert_eq!(config.toc.location, "right");
        assert_eq!(config.images.class, "img-fluid");
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<RenderConfig, _> = toml::from_str("[toc]\ntitel = \"typo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: RenderConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_accepts_defaults() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_max_level_out_of_range() {
        let mut config = RenderConfig::default();
        config.toc.max_level = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.toc.max_level = 7;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_negative_indent_step() {
        let mut config = RenderConfig::default();
        config.toc.indent_step = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = RenderConfig::default();
        config.processing.max_processes = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merge_overlay_wins_and_base_preserved() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[images]\nclass = \"figure\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let config: RenderConfig = merged.try_into().unwrap();
        assert_eq!(config.images.class, "figure");
        assert!(config.images.lazy);
        assert_eq!(config.toc.title, "Table of Contents");
    }

    #[test]
    fn merge_replaces_non_table_values() {
        let base: toml::Value = toml::from_str("a = [1, 2]\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = [3]\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[toc]
location = "left"
max_level = 3

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.toc.location, "left");
        assert_eq!(config.toc.max_level, 3);
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.toc.title, "Table of Contents");
    }

    #[test]
    fn load_config_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[toc\nbroken").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_runs_validation() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[toc]\nmax_level = 9\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // effective_threads
    // =========================================================================

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 100),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        let one = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&one), 1);
    }
}
