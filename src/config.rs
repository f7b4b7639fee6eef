//! Editor configuration.
//!
//! Handles loading, validating, and merging `simple-edit.toml`. Stock defaults
//! are overridden by a user file, which only needs the keys it changes.
//!
//! ## Config File Location
//!
//! `simple-edit.toml` in the working directory, or any file passed with
//! `--config`. A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [history]
//! path = "configs/history.json"  # JSON array of every successful operation
//! on_corruption = "repair"       # "repair" starts a new log, "fail" errors
//!
//! [processing]
//! resize_filter = "catmull-rom"  # nearest | triangle | catmull-rom | gaussian | lanczos3
//! jpeg_quality = 90              # 1-100
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::codec::{Quality, ResizeFilter, RustCodec};
use crate::history::CorruptionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "simple-edit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `simple-edit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Where and how operations are recorded.
    pub history: HistoryConfig,
    /// Codec settings.
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.processing.jpeg_quality) {
            return Err(ConfigError::Validation(
                "processing.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.history.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "history.path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// History log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Path of the JSON history document. Relative paths resolve against the
    /// working directory.
    pub path: PathBuf,
    /// Behavior when the existing document is unreadable.
    pub on_corruption: CorruptionPolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("configs/history.json"),
            on_corruption: CorruptionPolicy::Repair,
        }
    }
}

/// Codec settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Resampling kernel for resize.
    pub resize_filter: ResizeFilter,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub jpeg_quality: u32,
}

impl ProcessingConfig {
    /// Build the codec these settings describe.
    pub fn codec(&self) -> RustCodec {
        RustCodec::new(self.resize_filter, Quality::new(self.jpeg_quality))
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            resize_filter: ResizeFilter::CatmullRom,
            jpeg_quality: 90,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(EditorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), ?config, "Config resolved");
    Ok(config)
}

/// Returns a fully-commented stock `simple-edit.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Edit Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# History log
# ---------------------------------------------------------------------------
[history]
# JSON array recording every successful operation (load, save, resize, ...).
# Relative paths resolve against the working directory.
path = "configs/history.json"

# What to do when the existing log cannot be parsed:
#   "repair" - start a new log holding only the new record (earlier
#              entries are lost, editing never fails because of the log)
#   "fail"   - report an error and leave the log untouched
on_corruption = "repair"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Resampling kernel for resize.
# One of: nearest, triangle, catmull-rom (bicubic), gaussian, lanczos3.
resize_filter = "catmull-rom"

# JPEG encoding quality (1 = worst, 100 = best).
jpeg_quality = 90
"##
}
