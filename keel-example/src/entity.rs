//! Example service and module plugins
//!
//! Both claim a capability at their stage and then only hear about the
//! entities behind it. The last event each one sees is recorded in the
//! lookup registry under `example_service/<label>` and
//! `example_module/<path>`.

use crate::device::{GUI_MODULE, LIHUIYU_PROVIDER};
use keel_core::{Context, ModuleEvent, ModuleHandle, Result, ServiceEvent, ServiceHandle};
use keel_plugin::{LifecycleStage, Plugin, PluginInfo, StageOutcome};

/// Service plugin for every lihuiyu device
#[derive(Debug, Default, Clone, Copy)]
pub struct ServicePlugin;

impl Plugin for ServicePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("example_service", env!("CARGO_PKG_VERSION"))
            .with_description("Follows lihuiyu device services")
    }

    fn lifecycle(&self, _ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        tracing::debug!("service:example {}", stage);
        if stage == LifecycleStage::Service {
            return Ok(StageOutcome::claim(LIHUIYU_PROVIDER));
        }
        Ok(StageOutcome::Ignored)
    }

    fn service_event(&self, ctx: &mut Context, service: &ServiceHandle, event: ServiceEvent) -> Result<()> {
        match event {
            ServiceEvent::Added => tracing::info!("A lihuiyu device was added: {}", service),
            ServiceEvent::Attach => tracing::info!("A lihuiyu device was attached: {}", service),
            ServiceEvent::Assigned => tracing::info!("A lihuiyu device assigned: {}", service),
            ServiceEvent::Detach => tracing::info!("A lihuiyu device was detached: {}", service),
            ServiceEvent::Shutdown => tracing::info!("A lihuiyu device was shutdown: {}", service.label),
        }
        ctx.register(format!("example_service/{}", service.label), event.as_str());
        Ok(())
    }
}

/// Module plugin for the gui module
#[derive(Debug, Default, Clone, Copy)]
pub struct ModulePlugin;

impl Plugin for ModulePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("example_module", env!("CARGO_PKG_VERSION"))
            .with_description("Follows the gui module")
    }

    fn lifecycle(&self, _ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        tracing::debug!("module:example {}", stage);
        if stage == LifecycleStage::Module {
            return Ok(StageOutcome::claim(GUI_MODULE));
        }
        Ok(StageOutcome::Ignored)
    }

    fn module_event(&self, ctx: &mut Context, module: &ModuleHandle, event: ModuleEvent) -> Result<()> {
        match event {
            ModuleEvent::Open => tracing::info!("{} was launched.", module.label),
            ModuleEvent::Close => tracing::info!("{} was closed.", module.label),
            ModuleEvent::Shutdown => tracing::info!("{} shutdown.", module.label),
        }
        ctx.register(format!("example_module/{}", module.path), event.as_str());
        Ok(())
    }
}
