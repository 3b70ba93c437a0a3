//! Plugin registry

use crate::traits::{Plugin, PluginInfo};
use keel_core::lookup::Glob;
use keel_core::{EntityEvent, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registration-order identifier of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginId(pub usize);

/// How the kernel dispatches to a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginRole {
    /// Receives every top-level stage
    Kernel,
    /// Receives service events for providers matching the capability
    Service(String),
    /// Receives module events for module types matching the capability
    Module(String),
    /// Opted out at `invalidate`
    Invalidated,
}

/// A registered plugin
#[derive(Clone)]
pub struct PluginEntry {
    pub id: PluginId,
    pub info: PluginInfo,
    pub role: PluginRole,
    /// Compiled capability of a service or module claim
    claim: Option<Glob>,
    plugin: Arc<dyn Plugin>,
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("id", &self.id)
            .field("name", &self.info.name)
            .field("role", &self.role)
            .finish()
    }
}

impl PluginEntry {
    pub fn plugin(&self) -> Arc<dyn Plugin> {
        self.plugin.clone()
    }
}

/// Plugin registry
///
/// Entries are kept in registration order, which is also dispatch order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
    by_name: HashMap<String, PluginId>,
}

impl PluginRegistry {
    /// Create a new plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<PluginId> {
        let info = plugin.info();
        if self.by_name.contains_key(&info.name) {
            return Err(Error::plugin(format!("plugin already registered: {}", info.name)));
        }

        tracing::info!("Registering plugin: {} v{}", info.name, info.version);
        let id = PluginId(self.entries.len());
        self.by_name.insert(info.name.clone(), id);
        self.entries.push(PluginEntry {
            id,
            info,
            role: PluginRole::Kernel,
            claim: None,
            plugin,
        });
        Ok(id)
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.by_name.get(name).map(|id| self.entries[id.0].plugin())
    }

    pub fn id_of(&self, name: &str) -> Option<PluginId> {
        self.by_name.get(name).copied()
    }

    pub fn entry(&self, id: PluginId) -> Option<&PluginEntry> {
        self.entries.get(id.0)
    }

    pub fn role(&self, id: PluginId) -> Option<&PluginRole> {
        self.entry(id).map(|e| &e.role)
    }

    /// List all registered plugins
    pub fn list(&self) -> Vec<PluginInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    pub fn entries(&self) -> &[PluginEntry] {
        &self.entries
    }

    /// Plugins that take part in top-level stages, in order
    pub fn kernel_plugins(&self) -> Vec<(PluginId, Arc<dyn Plugin>)> {
        self.entries
            .iter()
            .filter(|e| e.role == PluginRole::Kernel)
            .map(|e| (e.id, e.plugin()))
            .collect()
    }

    /// Exclude a plugin from every later stage
    pub fn invalidate(&mut self, id: PluginId) -> Result<()> {
        self.set_role(id, PluginRole::Invalidated)
    }

    /// Turn a kernel plugin into a service plugin
    pub fn claim_service(&mut self, id: PluginId, capability: impl Into<String>) -> Result<()> {
        self.set_role(id, PluginRole::Service(capability.into()))
    }

    /// Turn a kernel plugin into a module plugin
    pub fn claim_module(&mut self, id: PluginId, capability: impl Into<String>) -> Result<()> {
        self.set_role(id, PluginRole::Module(capability.into()))
    }

    /// Plugins whose claim matches the entity behind `event`, in order
    pub fn claimants(&self, event: &EntityEvent) -> Vec<(PluginId, Arc<dyn Plugin>)> {
        let path = event.path();
        self.entries
            .iter()
            .filter(|e| {
                let kind_matches = matches!(
                    (&e.role, event),
                    (PluginRole::Service(_), EntityEvent::Service(..))
                        | (PluginRole::Module(_), EntityEvent::Module(..))
                );
                kind_matches && e.claim.as_ref().is_some_and(|glob| glob.matches(path))
            })
            .map(|e| (e.id, e.plugin()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set_role(&mut self, id: PluginId, role: PluginRole) -> Result<()> {
        let entry = self
            .entries
            .get_mut(id.0)
            .ok_or_else(|| Error::plugin(format!("unknown plugin id {}", id.0)))?;
        if entry.role != PluginRole::Kernel {
            return Err(Error::plugin(format!(
                "plugin {} already left kernel dispatch ({:?})",
                entry.info.name, entry.role
            )));
        }
        tracing::debug!("🔀 Plugin {} -> {:?}", entry.info.name, role);
        entry.claim = match &role {
            PluginRole::Service(cap) | PluginRole::Module(cap) => Some(Glob::new(cap.as_str())),
            PluginRole::Kernel | PluginRole::Invalidated => None,
        };
        entry.role = role;
        Ok(())
    }
}
