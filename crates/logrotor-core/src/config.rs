//! Rotation configuration and config-file parsing
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::layout::Layout;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Rotation settings for one writer.
///
/// A threshold of zero disables the corresponding behaviour. With all three
/// at zero the writer is a plain append-only file at `base_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Prefix of every rotated file name
    pub base_path: PathBuf,
    /// strftime layout appended to `base_path`
    #[serde(default = "default_layout")]
    pub layout: String,
    /// Seconds between time-based rotations
    #[serde(default)]
    pub interval_secs: u64,
    /// Rotate once the active file grows past this many bytes
    #[serde(default)]
    pub max_size_bytes: u64,
    /// Number of rotated files to keep
    #[serde(default)]
    pub max_count: usize,
}

fn default_layout() -> String {
    FINE_LAYOUT.to_string()
}

impl RotationConfig {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(base_path: P, layout: S) -> Self {
        Self {
            base_path: base_path.into(),
            layout: layout.into(),
            interval_secs: 0,
            max_size_bytes: 0,
            max_count: 0,
        }
    }

    /// One file per day, no size or count caps
    pub fn daily<P: Into<PathBuf>>(base_path: P) -> Self {
        Self::new(base_path, DAILY_LAYOUT).with_interval_secs(DAILY_INTERVAL_SECS)
    }

    /// Second-resolution names with caller-supplied thresholds
    pub fn fine<P: Into<PathBuf>>(
        base_path: P,
        interval_secs: u64,
        max_size_bytes: u64,
        max_count: usize,
    ) -> Self {
        Self::new(base_path, FINE_LAYOUT)
            .with_interval_secs(interval_secs)
            .with_max_size_bytes(max_size_bytes)
            .with_max_count(max_count)
    }

    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    /// True when no rotation, retention, or background activity is configured
    pub fn is_passthrough(&self) -> bool {
        self.interval_secs == 0 && self.max_size_bytes == 0 && self.max_count == 0
    }

    /// Validate the config and return its parsed layout
    pub fn validate(&self) -> Result<Layout> {
        if self.base_path.as_os_str().is_empty() {
            return Err(Error::config("base_path must not be empty"));
        }
        self.split_base()?;
        Layout::new(self.layout.clone())
    }

    /// Split `base_path` into the directory to scan and the file-name prefix.
    ///
    /// A base path ending in a separator names a directory with an empty
    /// prefix.
    pub fn split_base(&self) -> Result<(PathBuf, String)> {
        let raw = self.base_path.as_os_str().to_str().ok_or_else(|| {
            Error::config(format!(
                "base_path is not valid UTF-8: {}",
                self.base_path.display()
            ))
        })?;

        if raw.ends_with(MAIN_SEPARATOR) || raw.ends_with('/') {
            return Ok((self.base_path.clone(), String::new()));
        }

        let prefix = self
            .base_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::config(format!("base_path has no file name: {}", raw)))?
            .to_string();
        let dir = self
            .base_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok((dir, prefix))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::config(format!(
                "Unsupported config file format: {}",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content, format)?;
        if !config.is_passthrough() {
            config.validate()?;
        }

        Ok(config)
    }

    /// Parse config content in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }
}
