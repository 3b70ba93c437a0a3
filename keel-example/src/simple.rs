//! Small single-purpose example plugins

use keel_core::{Context, Result};
use keel_plugin::{LifecycleStage, Plugin, PluginInfo, StageOutcome};

/// Node types the `Hello World` tree operation applies to
pub const HELLO_NODE_TYPES: &[&str] = &["op cut", "op engrave"];

/// Adds the `example` console command and the `Hello World` tree operation
#[derive(Debug, Default, Clone, Copy)]
pub struct SimplePlugin;

impl Plugin for SimplePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("example_simple", env!("CARGO_PKG_VERSION"))
            .with_description("Registers a console command and a tree operation")
    }

    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        if stage == LifecycleStage::Register {
            ctx.console_command("example", "Says Hello World.", |_, channel, _| {
                channel.send("Hello World");
                Ok(())
            });
            ctx.tree_operation("Hello World", HELLO_NODE_TYPES, "calls `example` code.", |_, ctx| {
                ctx.console("example\n")
            });
        }
        Ok(StageOutcome::Ignored)
    }
}

/// Leaves a marker at `precli`, then opts out at `invalidate`
#[derive(Debug, Default, Clone, Copy)]
pub struct InvalidatingPlugin;

impl Plugin for InvalidatingPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("example_invalidating", env!("CARGO_PKG_VERSION"))
            .with_description("Invalidates itself")
    }

    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        match stage {
            LifecycleStage::Precli => {
                ctx.register("invalidating_plugin_existed", true);
                Ok(StageOutcome::Ignored)
            }
            LifecycleStage::Invalidate => Ok(StageOutcome::Invalidate),
            _ => Ok(StageOutcome::Ignored),
        }
    }
}
