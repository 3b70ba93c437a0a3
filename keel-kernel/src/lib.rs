//! Keel Kernel
//!
//! Owns the plugin registry and host context and walks them through the
//! lifecycle, from `plugins` to `shutdown`.

pub mod builtins;
mod kernel;
mod lifecycle;

pub use kernel::Kernel;
pub use lifecycle::Lifecycle;
