//! Plugin loader
//!
//! Handles the `plugins` stage: every registered plugin, including the ones
//! added during this stage, is asked once for further plugins.

use crate::registry::{PluginId, PluginRegistry, PluginRole};
use crate::stage::LifecycleStage;
use crate::traits::{Plugin, StageOutcome};
use keel_core::config::PluginsConfig;
use keel_core::{Context, Result};
use std::sync::Arc;

/// Plugin loader
#[derive(Debug, Default, Clone)]
pub struct PluginLoader {
    plugins: PluginsConfig,
    strict: bool,
}

impl PluginLoader {
    pub fn new(config: &PluginsConfig) -> Self {
        Self {
            plugins: config.clone(),
            strict: false,
        }
    }

    /// Propagate plugin errors instead of logging them
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register a plugin unless it is disabled or its name is taken
    pub fn add(&self, registry: &mut PluginRegistry, plugin: Arc<dyn Plugin>) -> Option<PluginId> {
        let name = plugin.info().name;
        if self.plugins.is_disabled(&name) {
            tracing::info!("⏭️ Skipping disabled plugin: {}", name);
            return None;
        }

        match registry.register(plugin) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("⚠️ Skipping plugin {}: {}", name, e);
                None
            }
        }
    }

    /// Run the `plugins` stage breadth-first, returning how many plugins it added
    pub fn expand(&self, registry: &mut PluginRegistry, ctx: &mut Context) -> Result<usize> {
        let before = registry.len();
        let mut cursor = 0;

        while cursor < registry.len() {
            let id = PluginId(cursor);
            cursor += 1;

            let Some(entry) = registry.entry(id) else {
                continue;
            };
            if entry.role != PluginRole::Kernel {
                continue;
            }
            let name = entry.info.name.clone();
            let plugin = entry.plugin();

            tracing::debug!("➡️ {} @ {}", name, LifecycleStage::Plugins);
            match plugin.lifecycle(ctx, LifecycleStage::Plugins) {
                Ok(StageOutcome::Plugins(children)) => {
                    tracing::debug!("📦 {} contributed {} plugin(s)", name, children.len());
                    for child in children {
                        self.add(registry, child);
                    }
                }
                Ok(StageOutcome::Ignored) => {}
                Ok(other) => {
                    tracing::warn!(
                        "⚠️ Plugin {} returned {} at {}; ignoring",
                        name,
                        other.kind(),
                        LifecycleStage::Plugins
                    );
                }
                Err(e) => {
                    tracing::error!("❌ Plugin {} failed at {}: {}", name, LifecycleStage::Plugins, e);
                    if self.strict {
                        return Err(e);
                    }
                }
            }
        }

        Ok(registry.len() - before)
    }
}
