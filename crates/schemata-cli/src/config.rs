//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - The `SCHEMATA_CONFIG` environment variable (through `--config`)

use crate::error::{Error, Result};
use schemata_core::{OutputFormat, ValidationOptions, DEFAULT_MAX_TRAVERSAL_DEPTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation defaults applied before command-line flags
    pub validation: ValidationConfig,

    /// Where remote schema documents are read from
    pub documents: DocumentConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Validation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Assert `format` by default
    pub format_validation: bool,

    /// Fail unknown format names
    pub only_known_formats: bool,

    /// Stop a node's evaluation at the first failure
    pub short_circuit: bool,

    /// Maximum nesting of schema evaluations
    pub max_traversal_depth: usize,

    /// Projection used by `validate` when `--format` is absent
    pub output_format: OutputFormat,

    /// Base URI given to schemas without one
    pub default_base_uri: Option<String>,
}

/// Remote document mappings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// URI prefix to local directory, e.g. `http://localhost:1234/` to the
    /// test suite's `remotes` folder
    pub mappings: BTreeMap<String, PathBuf>,

    /// Allow `file://` references outside the mapped directories
    pub allow_file_uris: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Print annotations in human output
    pub show_annotations: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            format_validation: false,
            only_known_formats: false,
            short_circuit: false,
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            output_format: OutputFormat::Basic,
            default_base_uri: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_annotations: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load configuration");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".schemata.yaml"),
            PathBuf::from(".schemata.json"),
            PathBuf::from("schemata.yaml"),
            PathBuf::from("schemata.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let schemata_dir = config_dir.join("schemata");
            paths.push(schemata_dir.join("config.yaml"));
            paths.push(schemata_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".schemata.yaml"));
            paths.push(home_dir.join(".schemata.json"));
        }

        paths
    }

    /// Validation options carrying the configured defaults
    pub fn validation_options(&self) -> Result<ValidationOptions> {
        let settings = &self.validation;
        let mut options = ValidationOptions::default()
            .with_format_validation(settings.format_validation)
            .with_only_known_formats(settings.only_known_formats)
            .with_short_circuit(settings.short_circuit)
            .with_max_traversal_depth(settings.max_traversal_depth)
            .with_output_format(settings.output_format);
        if let Some(base) = &settings.default_base_uri {
            let uri = Url::parse(base)
                .map_err(|e| Error::config(format!("Invalid default_base_uri '{}': {}", base, e)))?;
            options = options.with_default_base_uri(uri);
        }
        Ok(options)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}
