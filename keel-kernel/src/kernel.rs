//! The lifecycle kernel
//!
//! Drives every registered plugin through the fixed stage sequence, routes
//! service and module events to the plugins that claimed them, and hands
//! the calling thread to at most one mainloop routine.

use crate::builtins;
use crate::lifecycle::Lifecycle;
use keel_core::config::KeelConfig;
use keel_core::{Context, EntityEvent, Error, Result};
use keel_plugin::{
    Host, LifecycleStage, MainloopFn, Plugin, PluginId, PluginLoader, PluginRegistry, StageOutcome,
};
use serde_json::Value;
use std::sync::Arc;

/// Non-ignored answers collected from one stage
type Outcomes = Vec<(PluginId, String, StageOutcome)>;

/// Plugin lifecycle kernel
pub struct Kernel {
    config: KeelConfig,
    context: Context,
    registry: PluginRegistry,
    loader: PluginLoader,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.config.kernel.name)
            .field("stage", &self.lifecycle.current())
            .field("plugins", &self.registry.len())
            .finish()
    }
}

impl Kernel {
    /// Create a kernel that has not entered any stage yet
    pub fn new(config: KeelConfig) -> Self {
        let loader = PluginLoader::new(&config.plugins).strict(config.kernel.strict);
        let mut context = Context::new();
        context.register("kernel/name", config.kernel.name.clone());
        context.register("kernel/version", keel_core::VERSION);

        Self {
            config,
            context,
            registry: PluginRegistry::new(),
            loader,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Add a top-level plugin
    ///
    /// Only allowed before the `plugins` stage. Returns `None` when the
    /// plugin is disabled by configuration or its name is already taken.
    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin>) -> Result<Option<PluginId>> {
        if self.lifecycle.has_started() {
            return Err(Error::Lifecycle(format!(
                "cannot add plugin {} after the kernel started",
                plugin.info().name
            )));
        }
        Ok(self.loader.add(&mut self.registry, plugin))
    }

    pub fn config(&self) -> &KeelConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Last stage entered
    pub fn stage(&self) -> Option<LifecycleStage> {
        self.lifecycle.current()
    }

    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.context.lookup(key)
    }

    pub fn register(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.register(key, value);
    }

    /// Run console text and dispatch the events it causes
    pub fn console(&mut self, text: &str) -> Result<()> {
        self.context.console(text)?;
        self.dispatch_events()
    }

    /// Run every stage up to and including `target`
    ///
    /// A failing `preshutdown` does not stop the advance to `shutdown`; the
    /// first error is returned once teardown has run.
    pub fn advance(&mut self, target: LifecycleStage) -> Result<()> {
        let mut first_error = None;
        for stage in self.lifecycle.pending_until(target)? {
            match self.run_stage(stage) {
                Ok(()) => {}
                Err(e) if stage == LifecycleStage::Preshutdown && target == LifecycleStage::Shutdown => {
                    first_error.get_or_insert(e);
                }
                Err(e) => return Err(first_error.unwrap_or(e)),
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Run the whole lifecycle
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("🚀 Starting {} v{}", self.config.kernel.name, keel_core::VERSION);
        self.advance(LifecycleStage::Shutdown)?;
        tracing::info!("👋 {} stopped", self.config.kernel.name);
        Ok(())
    }

    fn run_stage(&mut self, stage: LifecycleStage) -> Result<()> {
        self.lifecycle.enter(stage)?;
        tracing::info!("🔄 Lifecycle: {}", stage);
        self.context.register("kernel/stage", stage.as_str());

        match stage {
            LifecycleStage::Plugins => {
                let added = self.loader.expand(&mut self.registry, &mut self.context)?;
                tracing::info!("📦 {} plugin(s) registered ({} contributed)", self.registry.len(), added);
                self.dispatch_events()?;
            }
            LifecycleStage::Service | LifecycleStage::Module => {
                for (id, name, outcome) in self.dispatch(stage)? {
                    if let StageOutcome::Claim(capability) = outcome {
                        tracing::info!("🔌 {} claims {} as a {} plugin", name, capability, stage);
                        if stage == LifecycleStage::Service {
                            self.registry.claim_service(id, capability)?;
                        } else {
                            self.registry.claim_module(id, capability)?;
                        }
                    }
                }
            }
            LifecycleStage::Invalidate => {
                for (id, name, outcome) in self.dispatch(stage)? {
                    if matches!(outcome, StageOutcome::Invalidate) {
                        tracing::info!("🚫 Plugin {} invalidated itself", name);
                        self.registry.invalidate(id)?;
                    }
                }
            }
            LifecycleStage::Register => {
                builtins::register(&mut self.context);
                self.dispatch(stage)?;
            }
            LifecycleStage::Boot => {
                self.dispatch(stage)?;
                self.boot_services()?;
            }
            LifecycleStage::Start => {
                self.dispatch(stage)?;
                self.open_modules()?;
            }
            LifecycleStage::Mainloop => {
                let outcomes = self.dispatch(stage)?;
                self.run_mainloop(outcomes)?;
            }
            LifecycleStage::Preshutdown => {
                self.record_active_services();
                self.dispatch(stage)?;
            }
            LifecycleStage::Shutdown => {
                // Teardown runs even when a plugin fails here.
                let dispatched = self.dispatch(stage);
                self.context.modules.shutdown_all();
                self.context.services.shutdown_all();
                let routed = self.dispatch_events();
                dispatched?;
                routed?;
            }
            _ => {
                self.dispatch(stage)?;
            }
        }
        Ok(())
    }

    /// Call every kernel plugin for `stage`, keeping the answers that mean something there
    fn dispatch(&mut self, stage: LifecycleStage) -> Result<Outcomes> {
        let mut outcomes = Vec::new();

        for (id, plugin) in self.registry.kernel_plugins() {
            let name = plugin.info().name;
            tracing::debug!("➡️ {} @ {}", name, stage);

            let result = plugin.lifecycle(&mut self.context, stage);
            self.dispatch_events()?;

            match result {
                Ok(outcome) if outcome.is_ignored() => {}
                Ok(outcome) if outcome.expected_at(stage) => outcomes.push((id, name, outcome)),
                Ok(outcome) => {
                    tracing::warn!(
                        "⚠️ Plugin {} returned {} at {}; ignoring",
                        name,
                        outcome.kind(),
                        stage
                    );
                }
                Err(e) => self.plugin_failed(&name, stage.as_str(), e)?,
            }
        }

        Ok(outcomes)
    }

    /// Route queued service and module events to their claimants
    ///
    /// Every queued event reaches every claimant, including events queued
    /// by claimants. In strict mode the first failure is returned afterwards.
    fn dispatch_events(&mut self) -> Result<()> {
        let mut first_error = None;
        loop {
            let events = self.context.take_events();
            if events.is_empty() {
                return first_error.map_or(Ok(()), Err);
            }

            for event in events {
                let claimants = self.registry.claimants(&event);
                if claimants.is_empty() {
                    tracing::trace!("No plugin claims {}", event.path());
                }

                for (_, plugin) in claimants {
                    let name = plugin.info().name;
                    let (result, label) = match &event {
                        EntityEvent::Service(handle, kind) => {
                            tracing::debug!("➡️ {} @ {} {}", name, kind, handle);
                            (plugin.service_event(&mut self.context, handle, *kind), kind.as_str())
                        }
                        EntityEvent::Module(handle, kind) => {
                            tracing::debug!("➡️ {} @ {} {}", name, kind, handle);
                            (plugin.module_event(&mut self.context, handle, *kind), kind.as_str())
                        }
                    };
                    if let Err(e) = result.or_else(|e| self.plugin_failed(&name, label, e)) {
                        first_error.get_or_insert(e);
                    }
                }
            }
        }
    }

    fn plugin_failed(&self, plugin: &str, during: &str, error: Error) -> Result<()> {
        tracing::error!("❌ Plugin {} failed at {}: {}", plugin, during, error);
        if self.config.kernel.strict {
            return Err(error);
        }
        Ok(())
    }

    fn run_mainloop(&mut self, outcomes: Outcomes) -> Result<()> {
        let mut owner: Option<(String, MainloopFn)> = None;

        for (_, name, outcome) in outcomes {
            let StageOutcome::Mainloop(routine) = outcome else {
                continue;
            };
            match &owner {
                Some((current, _)) => {
                    tracing::warn!("⚠️ Mainloop already owned by {}; refusing {}", current, name);
                }
                None => owner = Some((name, routine)),
            }
        }

        let Some((name, routine)) = owner else {
            tracing::debug!("No plugin claimed the mainloop");
            return Ok(());
        };

        tracing::info!("🧵 {} owns the mainloop", name);
        self.context.register("kernel/mainloop", name.clone());
        let result = routine(self);
        self.dispatch_events()?;
        match result {
            Ok(()) => {
                tracing::info!("🧵 Mainloop returned");
                Ok(())
            }
            Err(e) => self.plugin_failed(&name, LifecycleStage::Mainloop.as_str(), e),
        }
    }

    fn boot_services(&mut self) -> Result<()> {
        for service in self.config.services.clone() {
            let created = self
                .context
                .services
                .create(&service.provider, service.label.clone())
                .and_then(|handle| {
                    if service.activate {
                        self.context.services.activate(handle.id, service.assigned)?;
                    }
                    Ok(handle)
                });

            if let Err(e) = created {
                tracing::warn!("⚠️ Could not start service {}: {}", service.label, e);
                if self.config.kernel.strict {
                    return Err(e);
                }
            }
            self.dispatch_events()?;
        }
        Ok(())
    }

    fn open_modules(&mut self) -> Result<()> {
        for path in self.config.modules.open.clone() {
            if let Err(e) = self.context.modules.open(&path) {
                tracing::warn!("⚠️ Could not open module {}: {}", path, e);
                if self.config.kernel.strict {
                    return Err(e);
                }
            }
            self.dispatch_events()?;
        }
        Ok(())
    }

    fn record_active_services(&mut self) {
        let active: Vec<(String, String)> = self
            .context
            .services
            .active_domains()
            .into_iter()
            .map(|(domain, handle)| (domain.to_string(), handle.label.clone()))
            .collect();

        for (domain, label) in active {
            self.context.register(format!("kernel/last_active/{}", domain), label);
        }
    }
}

impl Host for Kernel {
    fn context(&mut self) -> &mut Context {
        &mut self.context
    }

    fn console(&mut self, text: &str) -> Result<()> {
        Kernel::console(self, text)
    }

    fn shutdown_requested(&self) -> bool {
        self.context.shutdown_requested()
    }
}
