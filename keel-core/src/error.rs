//! Error types for Keel

use thiserror::Error;

/// Result type for Keel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Keel
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Plugin error
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Lifecycle ordering error
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Console command error
    #[error("Console error: {0}")]
    Console(String),

    /// Element tree error
    #[error("Elements error: {0}")]
    Elements(String),

    /// Service error
    #[error("Service error: {0}")]
    Service(String),

    /// Module error
    #[error("Module error: {0}")]
    Module(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a plugin error
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin(message.into())
    }

    /// Shorthand for a console error
    pub fn console(message: impl Into<String>) -> Self {
        Self::Console(message.into())
    }
}
