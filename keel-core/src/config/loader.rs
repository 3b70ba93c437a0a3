//! Configuration loader

use crate::config::KeelConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Configuration loader for various formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<KeelConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config = match ext {
            "json" => Self::from_json(&content)?,
            "toml" => Self::from_toml(&content)?,
            _ => return Err(Error::Config(format!("Unknown config format: {}", ext))),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or the default location, falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<KeelConfig> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("📄 Using default config at {:?}", path);
                Self::load(path)
            }
            _ => Ok(KeelConfig::default()),
        }
    }

    /// Default config location (`<config dir>/keel/keel.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keel").join("keel.toml"))
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<KeelConfig> {
        serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<KeelConfig> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }
}
