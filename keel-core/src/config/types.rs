//! Configuration type definitions
//!
//! These types represent the runtime configuration for the Keel kernel.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration for Keel
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeelConfig {
    /// Kernel behaviour
    #[serde(default)]
    pub kernel: KernelConfig,

    /// Global logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Plugin filtering
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Modules opened at start
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Services created at boot
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// Kernel options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Kernel name, reported in logs
    #[serde(default = "default_kernel_name")]
    pub name: String,

    /// Abort a stage when a plugin returns an error
    #[serde(default)]
    pub strict: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: default_kernel_name(),
            strict: false,
        }
    }
}

fn default_kernel_name() -> String {
    "keel".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Plugin filtering
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PluginsConfig {
    /// Plugin names that are never registered
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl PluginsConfig {
    /// Check whether a plugin name is disabled
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

/// Module configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModulesConfig {
    /// Module type paths opened during `start`
    #[serde(default)]
    pub open: Vec<String>,
}

/// A service instance created during `boot`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Provider path, e.g. `provider/device/lihuiyu`
    pub provider: String,

    /// Instance label
    pub label: String,

    /// Attach the service once created
    #[serde(default)]
    pub activate: bool,

    /// Flag the activation as assigned
    #[serde(default)]
    pub assigned: bool,
}

impl KeelConfig {
    /// Check the configuration for values the kernel cannot use
    pub fn validate(&self) -> Result<()> {
        if self.kernel.name.trim().is_empty() {
            return Err(Error::Config("kernel.name must not be empty".to_string()));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "unsupported log level `{}`; expected one of {}",
                self.logging.level,
                LOG_LEVELS.join("|")
            )));
        }

        for service in &self.services {
            if !service.provider.starts_with("provider/") {
                return Err(Error::Config(format!(
                    "service `{}` has provider `{}` outside provider/",
                    service.label, service.provider
                )));
            }
            if service.label.trim().is_empty() {
                return Err(Error::Config(format!(
                    "service for `{}` needs a label",
                    service.provider
                )));
            }
        }

        for module in &self.modules.open {
            if !module.starts_with("module/") {
                return Err(Error::Config(format!(
                    "module path `{}` must start with module/",
                    module
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = KeelConfig::default();
        assert_eq!(config.kernel.name, "keel");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut config = KeelConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_paths() {
        let mut config = KeelConfig::default();
        config.services.push(ServiceConfig {
            provider: "device/lihuiyu".to_string(),
            label: "d0".to_string(),
            activate: false,
            assigned: false,
        });
        assert!(config.validate().is_err());

        let mut config = KeelConfig::default();
        config.modules.open.push("gui".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_plugins() {
        let plugins = PluginsConfig {
            disabled: vec!["example_simple".to_string()],
        };
        assert!(plugins.is_disabled("example_simple"));
        assert!(!plugins.is_disabled("example"));
    }
}
