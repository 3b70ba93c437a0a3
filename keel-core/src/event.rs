//! Entity lifecycle events awaiting dispatch

use crate::module::{ModuleEvent, ModuleHandle};
use crate::service::{ServiceEvent, ServiceHandle};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A service or module lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    Service(ServiceHandle, ServiceEvent),
    Module(ModuleHandle, ModuleEvent),
}

impl EntityEvent {
    /// Path the event is routed by (provider or module type)
    pub fn path(&self) -> &str {
        match self {
            Self::Service(handle, _) => &handle.provider,
            Self::Module(handle, _) => &handle.path,
        }
    }
}

/// FIFO shared by the service and module directories
///
/// Both directories push into the same queue so the kernel sees events in
/// the order they happened.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<EntityEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: EntityEvent) {
        self.inner.lock().push_back(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&self) -> Vec<EntityEvent> {
        self.inner.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
