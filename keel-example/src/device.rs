//! Device plugin providing something for the service and module examples to claim

use keel_core::{Context, Result};
use keel_plugin::{LifecycleStage, Plugin, PluginInfo, StageOutcome};

pub const LIHUIYU_PROVIDER: &str = "provider/device/lihuiyu";
pub const GUI_MODULE: &str = "module/gui";

/// Registers the lihuiyu provider and the gui module type at `register`
#[derive(Debug, Default, Clone, Copy)]
pub struct DevicePlugin;

impl Plugin for DevicePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("example_device", env!("CARGO_PKG_VERSION"))
            .with_description("Provides the lihuiyu device and the gui module")
    }

    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        if stage == LifecycleStage::Register {
            ctx.services.register_provider(LIHUIYU_PROVIDER, "Lihuiyu laser")?;
            ctx.modules.register_type(GUI_MODULE, "GUI")?;
        }
        Ok(StageOutcome::Ignored)
    }
}
