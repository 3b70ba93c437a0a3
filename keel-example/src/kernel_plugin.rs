//! The main example plugin

use crate::{DevicePlugin, InvalidatingPlugin, ModulePlugin, ServicePlugin, SimplePlugin};
use keel_core::{Context, Result};
use keel_plugin::{LifecycleStage, Plugin, PluginInfo, StageOutcome};
use serde_json::Value;
use std::sync::Arc;

/// Kernel plugin that sees every top-level stage
#[derive(Debug, Default, Clone, Copy)]
pub struct ExamplePlugin;

impl ExamplePlugin {
    fn contributed() -> Vec<Arc<dyn Plugin>> {
        vec![
            Arc::new(ServicePlugin),
            Arc::new(ModulePlugin),
            Arc::new(InvalidatingPlugin),
            Arc::new(SimplePlugin),
            Arc::new(DevicePlugin),
        ]
    }
}

impl Plugin for ExamplePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("example", env!("CARGO_PKG_VERSION"))
            .with_description("Walks through every lifecycle stage")
    }

    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        tracing::info!("Kernel plugin calling lifecycle: {}", stage);

        match stage {
            LifecycleStage::Plugins => return Ok(StageOutcome::plugins(Self::contributed())),
            // Not a service or module plugin; see `ServicePlugin` and `ModulePlugin`.
            LifecycleStage::Service | LifecycleStage::Module => {}
            LifecycleStage::Cli => {
                let existed = ctx
                    .lookup("invalidating_plugin_existed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if existed {
                    tracing::info!("Our invalidating plugin existed and put this here.");
                }
            }
            // Still valid.
            LifecycleStage::Invalidate => {}
            LifecycleStage::Mainloop => {
                tracing::debug!("Leaving the mainloop to another plugin");
            }
            _ => {}
        }
        Ok(StageOutcome::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contributes_the_examples() {
        let mut ctx = Context::new();
        let outcome = ExamplePlugin.lifecycle(&mut ctx, LifecycleStage::Plugins).unwrap();
        let names: Vec<String> = match outcome {
            StageOutcome::Plugins(plugins) => plugins.iter().map(|p| p.info().name).collect(),
            other => panic!("expected plugins, got {:?}", other),
        };
        assert_eq!(
            names,
            vec![
                "example_service",
                "example_module",
                "example_invalidating",
                "example_simple",
                "example_device",
            ]
        );
    }

    #[test]
    fn test_ignores_every_other_stage() {
        let mut ctx = Context::new();
        ctx.register("invalidating_plugin_existed", true);
        for stage in &LifecycleStage::ALL[1..] {
            assert!(ExamplePlugin.lifecycle(&mut ctx, *stage).unwrap().is_ignored());
        }
    }
}
