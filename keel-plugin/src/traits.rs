//! Plugin traits

use crate::stage::LifecycleStage;
use keel_core::{Context, ModuleEvent, ModuleHandle, Result, ServiceEvent, ServiceHandle};
use std::sync::Arc;

/// Plugin information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Plugin name, unique within a kernel
    pub name: String,
    /// Plugin version
    pub version: String,
    /// Plugin description
    pub description: String,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Access to the running kernel handed to a mainloop routine
pub trait Host {
    /// Host state
    fn context(&mut self) -> &mut Context;

    /// Run console text and dispatch the entity events it causes
    fn console(&mut self, text: &str) -> Result<()>;

    /// Whether something asked the mainloop to return
    fn shutdown_requested(&self) -> bool;
}

/// Routine that owns the calling thread during `mainloop`
pub type MainloopFn = Box<dyn FnOnce(&mut dyn Host) -> Result<()>>;

/// What a plugin answers for one lifecycle stage
pub enum StageOutcome {
    /// Nothing to report
    Ignored,
    /// More plugins to register (`plugins`)
    Plugins(Vec<Arc<dyn Plugin>>),
    /// Capability path this plugin serves (`service` or `module`)
    Claim(String),
    /// Exclude this plugin from every later stage (`invalidate`)
    Invalidate,
    /// Take over the calling thread (`mainloop`)
    Mainloop(MainloopFn),
}

impl StageOutcome {
    pub fn plugins(plugins: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self {
        Self::Plugins(plugins.into_iter().collect())
    }

    pub fn claim(path: impl Into<String>) -> Self {
        Self::Claim(path.into())
    }

    pub fn mainloop(routine: impl FnOnce(&mut dyn Host) -> Result<()> + 'static) -> Self {
        Self::Mainloop(Box::new(routine))
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Plugins(_) => "plugins",
            Self::Claim(_) => "claim",
            Self::Invalidate => "invalidate",
            Self::Mainloop(_) => "mainloop",
        }
    }

    /// Whether this outcome means anything at `stage`
    pub fn expected_at(&self, stage: LifecycleStage) -> bool {
        match self {
            Self::Ignored => true,
            Self::Plugins(_) => stage == LifecycleStage::Plugins,
            Self::Claim(_) => matches!(stage, LifecycleStage::Service | LifecycleStage::Module),
            Self::Invalidate => stage == LifecycleStage::Invalidate,
            Self::Mainloop(_) => stage == LifecycleStage::Mainloop,
        }
    }
}

impl std::fmt::Debug for StageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plugins(plugins) => {
                let names: Vec<String> = plugins.iter().map(|p| p.info().name).collect();
                f.debug_tuple("Plugins").field(&names).finish()
            }
            Self::Claim(path) => f.debug_tuple("Claim").field(path).finish(),
            Self::Ignored => f.write_str("Ignored"),
            Self::Invalidate => f.write_str("Invalidate"),
            Self::Mainloop(_) => f.write_str("Mainloop(..)"),
        }
    }
}

/// Main plugin trait
pub trait Plugin: Send + Sync {
    /// Get plugin information
    fn info(&self) -> PluginInfo;

    /// Handle one top-level lifecycle stage
    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome>;

    /// Handle a service event for a claimed provider
    fn service_event(&self, _ctx: &mut Context, _service: &ServiceHandle, _event: ServiceEvent) -> Result<()> {
        Ok(())
    }

    /// Handle a module event for a claimed module type
    fn module_event(&self, _ctx: &mut Context, _module: &ModuleHandle, _event: ModuleEvent) -> Result<()> {
        Ok(())
    }
}

/// Plugin backed by a closure over `(context, stage)`
pub struct FnPlugin<F> {
    info: PluginInfo,
    handler: F,
}

impl<F> FnPlugin<F>
where
    F: Fn(&mut Context, LifecycleStage) -> Result<StageOutcome> + Send + Sync,
{
    pub fn new(info: PluginInfo, handler: F) -> Self {
        Self { info, handler }
    }
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut Context, LifecycleStage) -> Result<StageOutcome> + Send + Sync,
{
    fn info(&self) -> PluginInfo {
        self.info.clone()
    }

    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        (self.handler)(ctx, stage)
    }
}

/// Wrap a closure as a shareable plugin
pub fn plugin_fn<F>(name: impl Into<String>, handler: F) -> Arc<dyn Plugin>
where
    F: Fn(&mut Context, LifecycleStage) -> Result<StageOutcome> + Send + Sync + 'static,
{
    Arc::new(FnPlugin::new(PluginInfo::new(name, "0.0.0"), handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_info() {
        let info = PluginInfo::new("example", "1.0.0").with_description("Demonstrates every stage");
        assert_eq!(info.name, "example");
        assert_eq!(info.description, "Demonstrates every stage");
    }

    #[test]
    fn test_outcome_expectations() {
        assert!(StageOutcome::Ignored.expected_at(LifecycleStage::Boot));
        assert!(StageOutcome::claim("module/gui").expected_at(LifecycleStage::Module));
        assert!(StageOutcome::claim("provider/device/*").expected_at(LifecycleStage::Service));
        assert!(!StageOutcome::claim("module/gui").expected_at(LifecycleStage::Register));
        assert!(!StageOutcome::Invalidate.expected_at(LifecycleStage::Cli));
        assert!(StageOutcome::plugins(Vec::new()).expected_at(LifecycleStage::Plugins));
        assert!(StageOutcome::mainloop(|_| Ok(())).expected_at(LifecycleStage::Mainloop));
    }

    #[test]
    fn test_fn_plugin() {
        let plugin = plugin_fn("closure", |ctx, stage| {
            if stage == LifecycleStage::Register {
                ctx.register("closure/registered", true);
            }
            Ok(StageOutcome::Ignored)
        });

        let mut ctx = Context::new();
        assert!(plugin.lifecycle(&mut ctx, LifecycleStage::Boot).unwrap().is_ignored());
        assert!(ctx.lookup("closure/registered").is_none());
        plugin.lifecycle(&mut ctx, LifecycleStage::Register).unwrap();
        assert!(ctx.lookup("closure/registered").is_some());
        assert_eq!(plugin.info().name, "closure");
    }

    #[test]
    fn test_outcome_debug() {
        let outcome = StageOutcome::plugins(vec![plugin_fn("child", |_, _| Ok(StageOutcome::Ignored))]);
        assert_eq!(format!("{:?}", outcome), r#"Plugins(["child"])"#);
        assert_eq!(format!("{:?}", StageOutcome::Invalidate), "Invalidate");
    }
}
