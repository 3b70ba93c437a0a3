//! Lifecycle stage identifiers

use keel_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A point in the kernel's boot/run/shutdown sequence
///
/// Variants are declared in dispatch order, so `Ord` follows the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    /// Plugins may contribute further plugins
    Plugins,
    /// Plugins may claim a service provider
    Service,
    /// Plugins may claim a module type
    Module,
    /// Before command line processing
    Precli,
    /// Command line processing
    Cli,
    /// Plugins may opt out of every later stage
    Invalidate,
    Preregister,
    /// General lookup and command registration
    Register,
    /// Everything is registered, nothing is booted
    Configure,
    /// Services start
    Boot,
    Postboot,
    Prestart,
    Start,
    Poststart,
    Ready,
    Finished,
    Premain,
    /// One plugin may take over the calling thread
    Mainloop,
    Postmain,
    Preshutdown,
    Shutdown,
}

impl LifecycleStage {
    /// Every stage in dispatch order
    pub const ALL: [LifecycleStage; 21] = [
        Self::Plugins,
        Self::Service,
        Self::Module,
        Self::Precli,
        Self::Cli,
        Self::Invalidate,
        Self::Preregister,
        Self::Register,
        Self::Configure,
        Self::Boot,
        Self::Postboot,
        Self::Prestart,
        Self::Start,
        Self::Poststart,
        Self::Ready,
        Self::Finished,
        Self::Premain,
        Self::Mainloop,
        Self::Postmain,
        Self::Preshutdown,
        Self::Shutdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plugins => "plugins",
            Self::Service => "service",
            Self::Module => "module",
            Self::Precli => "precli",
            Self::Cli => "cli",
            Self::Invalidate => "invalidate",
            Self::Preregister => "preregister",
            Self::Register => "register",
            Self::Configure => "configure",
            Self::Boot => "boot",
            Self::Postboot => "postboot",
            Self::Prestart => "prestart",
            Self::Start => "start",
            Self::Poststart => "poststart",
            Self::Ready => "ready",
            Self::Finished => "finished",
            Self::Premain => "premain",
            Self::Mainloop => "mainloop",
            Self::Postmain => "postmain",
            Self::Preshutdown => "preshutdown",
            Self::Shutdown => "shutdown",
        }
    }

    /// Position in the dispatch order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The stage after this one
    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn first() -> Self {
        Self::Plugins
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| Error::Lifecycle(format!("unknown lifecycle stage: {}", s)))
    }
}
