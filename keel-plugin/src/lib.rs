//! Keel Plugin System
//!
//! The lifecycle dispatch contract between the kernel and its plugins.

mod loader;
mod registry;
mod stage;
mod traits;

pub use loader::PluginLoader;
pub use registry::{PluginEntry, PluginId, PluginRegistry, PluginRole};
pub use stage::LifecycleStage;
pub use traits::{FnPlugin, Host, MainloopFn, Plugin, PluginInfo, StageOutcome, plugin_fn};
