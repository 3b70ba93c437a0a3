//! Service providers and service instances
//!
//! A provider path has the form `provider/<domain>/<name>`. At most one
//! service per domain is attached at any time.

use crate::error::{Error, Result};
use crate::event::{EntityEvent, EventQueue};
use std::collections::BTreeMap;

/// Service instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(pub u64);

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle passed to service plugins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub id: ServiceId,
    /// Provider path that created this service
    pub provider: String,
    /// Domain derived from the provider path, e.g. `device`
    pub domain: String,
    pub label: String,
}

impl std::fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}#{})", self.label, self.provider, self.id)
    }
}

/// Service sub-lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceEvent {
    /// Created by its provider
    Added,
    /// Became the active service of its domain
    Attach,
    /// Activated with the assigned flag
    Assigned,
    /// No longer the active service of its domain
    Detach,
    /// Removed, or the kernel is shutting down
    Shutdown,
}

impl ServiceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Attach => "service_attach",
            Self::Assigned => "assigned",
            Self::Detach => "service_detach",
            Self::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for ServiceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered service provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub path: String,
    pub domain: String,
    pub label: String,
}

/// Providers, instances and the active service per domain
#[derive(Debug, Default)]
pub struct Services {
    providers: BTreeMap<String, ProviderInfo>,
    instances: BTreeMap<ServiceId, ServiceHandle>,
    active: BTreeMap<String, ServiceId>,
    next_id: u64,
    events: EventQueue,
}

fn provider_domain(path: &str) -> Option<&str> {
    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("provider"), Some(domain), Some(name)) if !domain.is_empty() && !name.is_empty() => {
            Some(domain)
        }
        _ => None,
    }
}

impl Services {
    pub fn new(events: EventQueue) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Register a provider under `provider/<domain>/<name>`
    pub fn register_provider(&mut self, path: impl Into<String>, label: impl Into<String>) -> Result<()> {
        let path = path.into();
        let domain = provider_domain(&path)
            .ok_or_else(|| Error::Service(format!("invalid provider path: {}", path)))?
            .to_string();

        tracing::debug!("🔌 Registered provider {} (domain: {})", path, domain);
        self.providers.insert(
            path.clone(),
            ProviderInfo {
                path,
                domain,
                label: label.into(),
            },
        );
        Ok(())
    }

    pub fn provider(&self, path: &str) -> Option<&ProviderInfo> {
        self.providers.get(path)
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderInfo> {
        self.providers.values()
    }

    /// Create a service from a registered provider
    pub fn create(&mut self, provider: &str, label: impl Into<String>) -> Result<ServiceHandle> {
        let info = self
            .providers
            .get(provider)
            .ok_or_else(|| Error::Service(format!("unknown provider: {}", provider)))?;

        self.next_id += 1;
        let handle = ServiceHandle {
            id: ServiceId(self.next_id),
            provider: info.path.clone(),
            domain: info.domain.clone(),
            label: label.into(),
        };

        tracing::info!("➕ Service added: {}", handle);
        self.instances.insert(handle.id, handle.clone());
        self.emit(&handle, ServiceEvent::Added);
        Ok(handle)
    }

    /// Make a service the active one of its domain
    ///
    /// Detaches the previously active service first. Activating the service
    /// that is already active does nothing.
    pub fn activate(&mut self, id: ServiceId, assigned: bool) -> Result<()> {
        let handle = self
            .instances
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::Service(format!("unknown service: {}", id)))?;

        if self.active.get(&handle.domain) == Some(&id) {
            return Ok(());
        }

        self.deactivate(&handle.domain);
        self.active.insert(handle.domain.clone(), id);
        tracing::info!("🔗 Service attached: {}", handle);
        self.emit(&handle, ServiceEvent::Attach);
        if assigned {
            self.emit(&handle, ServiceEvent::Assigned);
        }
        Ok(())
    }

    /// Detach the active service of a domain, if any
    pub fn deactivate(&mut self, domain: &str) -> Option<ServiceId> {
        let id = self.active.remove(domain)?;
        if let Some(handle) = self.instances.get(&id).cloned() {
            tracing::info!("⛓️ Service detached: {}", handle);
            self.emit(&handle, ServiceEvent::Detach);
        }
        Some(id)
    }

    /// Remove a service, detaching it first if it is active
    pub fn remove(&mut self, id: ServiceId) -> Result<ServiceHandle> {
        let domain = self
            .instances
            .get(&id)
            .map(|h| h.domain.clone())
            .ok_or_else(|| Error::Service(format!("unknown service: {}", id)))?;

        if self.active.get(&domain) == Some(&id) {
            self.deactivate(&domain);
        }

        let handle = self
            .instances
            .remove(&id)
            .ok_or_else(|| Error::Internal(format!("service {} vanished during removal", id)))?;
        self.emit(&handle, ServiceEvent::Shutdown);
        Ok(handle)
    }

    /// Detach every active service and shut every instance down
    pub fn shutdown_all(&mut self) {
        let domains: Vec<String> = self.active.keys().cloned().collect();
        for domain in domains {
            self.deactivate(&domain);
        }

        let instances = std::mem::take(&mut self.instances);
        for handle in instances.into_values() {
            self.emit(&handle, ServiceEvent::Shutdown);
        }
    }

    pub fn get(&self, id: ServiceId) -> Option<&ServiceHandle> {
        self.instances.get(&id)
    }

    /// Active service of a domain
    pub fn active(&self, domain: &str) -> Option<&ServiceHandle> {
        self.active.get(domain).and_then(|id| self.instances.get(id))
    }

    /// Every domain with its active service
    pub fn active_domains(&self) -> Vec<(&str, &ServiceHandle)> {
        self.active
            .iter()
            .filter_map(|(domain, id)| self.instances.get(id).map(|h| (domain.as_str(), h)))
            .collect()
    }

    pub fn list(&self) -> Vec<&ServiceHandle> {
        self.instances.values().collect()
    }

    pub fn is_active(&self, id: ServiceId) -> bool {
        self.active.values().any(|active| *active == id)
    }

    fn emit(&self, handle: &ServiceHandle, event: ServiceEvent) {
        self.events
            .push(EntityEvent::Service(handle.clone(), event));
    }
}
