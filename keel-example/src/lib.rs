//! Keel Example Plugins
//!
//! A main kernel plugin that walks through every lifecycle stage and
//! contributes the smaller examples: a service plugin, a module plugin, an
//! invalidating plugin, a plugin adding a console command and tree operation,
//! and a device plugin registering the provider and module type the others
//! claim.

mod device;
mod entity;
mod kernel_plugin;
mod simple;

pub use device::{DevicePlugin, GUI_MODULE, LIHUIYU_PROVIDER};
pub use entity::{ModulePlugin, ServicePlugin};
pub use kernel_plugin::ExamplePlugin;
pub use simple::{HELLO_NODE_TYPES, InvalidatingPlugin, SimplePlugin};

use keel_plugin::Plugin;
use std::sync::Arc;

/// The main example plugin, which contributes the others at `plugins`
pub fn plugin() -> Arc<dyn Plugin> {
    Arc::new(ExamplePlugin)
}
