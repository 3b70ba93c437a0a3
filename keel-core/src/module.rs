//! Module types and open module instances

use crate::error::{Error, Result};
use crate::event::{EntityEvent, EventQueue};
use std::collections::BTreeMap;

/// Handle passed to module plugins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHandle {
    /// Module type path, e.g. `module/gui`
    pub path: String,
    pub label: String,
}

impl std::fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.path)
    }
}

/// Module sub-lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleEvent {
    Open,
    Close,
    Shutdown,
}

impl ModuleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "module_open",
            Self::Close => "module_close",
            Self::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for ModuleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered module types and the modules currently open
#[derive(Debug, Default)]
pub struct Modules {
    types: BTreeMap<String, String>,
    open: BTreeMap<String, ModuleHandle>,
    events: EventQueue,
}

impl Modules {
    pub fn new(events: EventQueue) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Register a module type under `module/<name>`
    pub fn register_type(&mut self, path: impl Into<String>, label: impl Into<String>) -> Result<()> {
        let path = path.into();
        match path.strip_prefix("module/") {
            Some(name) if !name.is_empty() => {}
            _ => return Err(Error::Module(format!("invalid module path: {}", path))),
        }
        tracing::debug!("🧩 Registered module type {}", path);
        self.types.insert(path, label.into());
        Ok(())
    }

    /// Registered module types as `(path, label)`
    pub fn types(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types.iter().map(|(p, l)| (p.as_str(), l.as_str()))
    }

    /// Open a module; opening an open module returns the existing handle
    pub fn open(&mut self, path: &str) -> Result<ModuleHandle> {
        if let Some(handle) = self.open.get(path) {
            return Ok(handle.clone());
        }

        let label = self
            .types
            .get(path)
            .ok_or_else(|| Error::Module(format!("unknown module type: {}", path)))?;

        let handle = ModuleHandle {
            path: path.to_string(),
            label: label.clone(),
        };
        tracing::info!("📂 Module opened: {}", handle);
        self.open.insert(path.to_string(), handle.clone());
        self.emit(&handle, ModuleEvent::Open);
        Ok(handle)
    }

    pub fn close(&mut self, path: &str) -> Result<ModuleHandle> {
        let handle = self
            .open
            .remove(path)
            .ok_or_else(|| Error::Module(format!("module not open: {}", path)))?;
        tracing::info!("📁 Module closed: {}", handle);
        self.emit(&handle, ModuleEvent::Close);
        Ok(handle)
    }

    /// Close and shut down every open module
    pub fn shutdown_all(&mut self) {
        let open = std::mem::take(&mut self.open);
        for handle in open.into_values() {
            self.emit(&handle, ModuleEvent::Close);
            self.emit(&handle, ModuleEvent::Shutdown);
        }
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.open.contains_key(path)
    }

    pub fn list_open(&self) -> Vec<&ModuleHandle> {
        self.open.values().collect()
    }

    fn emit(&self, handle: &ModuleHandle, event: ModuleEvent) {
        self.events.push(EntityEvent::Module(handle.clone(), event));
    }
}
