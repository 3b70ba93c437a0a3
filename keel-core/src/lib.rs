//! Keel Core Library
//!
//! This crate provides the host state shared by the Keel kernel and its
//! plugins: configuration, error handling, the lookup registry, console
//! commands, element tree operations, and the service and module directories.

pub mod config;
pub mod console;
pub mod context;
pub mod elements;
pub mod error;
pub mod event;
pub mod lookup;
pub mod module;
pub mod service;

pub use console::{Channel, CommandCall};
pub use context::Context;
pub use elements::{Node, NodeId};
pub use error::{Error, Result};
pub use event::EntityEvent;
pub use module::{ModuleEvent, ModuleHandle};
pub use service::{ServiceEvent, ServiceHandle, ServiceId};

/// Keel version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
