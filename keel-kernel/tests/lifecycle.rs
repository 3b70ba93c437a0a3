//! Kernel lifecycle behaviour seen from plugins

use keel_core::config::{KeelConfig, ServiceConfig};
use keel_core::{Context, Error, ModuleEvent, ModuleHandle, Result, ServiceEvent, ServiceHandle};
use keel_kernel::Kernel;
use keel_plugin::{LifecycleStage, Plugin, PluginInfo, PluginRole, StageOutcome, plugin_fn};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Plugin that writes every stage it sees to a shared log
fn recorder(name: &str, log: &Log) -> Arc<dyn Plugin> {
    let log = log.clone();
    let prefix = name.to_string();
    plugin_fn(name, move |_, stage| {
        log.lock().push(format!("{}:{}", prefix, stage));
        Ok(StageOutcome::Ignored)
    })
}

/// Plugin claiming a capability and recording the events routed to it
struct Claimant {
    name: String,
    stage: LifecycleStage,
    capability: String,
    fails_on: Option<&'static str>,
    log: Log,
}

impl Claimant {
    fn record(&self, event: &str, target: &str) -> Result<()> {
        self.log.lock().push(format!("{}:{}:{}", self.name, event, target));
        if self.fails_on == Some(event) {
            return Err(Error::plugin(format!("{} rejected {}", self.name, event)));
        }
        Ok(())
    }
}

impl Plugin for Claimant {
    fn info(&self) -> PluginInfo {
        PluginInfo::new(self.name.clone(), "0.1.0")
    }

    fn lifecycle(&self, _ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        if stage == self.stage {
            return Ok(StageOutcome::claim(self.capability.clone()));
        }
        self.log.lock().push(format!("{}:{}", self.name, stage));
        Ok(StageOutcome::Ignored)
    }

    fn service_event(&self, _ctx: &mut Context, service: &ServiceHandle, event: ServiceEvent) -> Result<()> {
        self.record(event.as_str(), &service.label)
    }

    fn module_event(&self, _ctx: &mut Context, module: &ModuleHandle, event: ModuleEvent) -> Result<()> {
        self.record(event.as_str(), &module.path)
    }
}

fn claimant(name: &str, stage: LifecycleStage, capability: &str, log: &Log) -> Arc<dyn Plugin> {
    Arc::new(Claimant {
        name: name.to_string(),
        stage,
        capability: capability.to_string(),
        fails_on: None,
        log: log.clone(),
    })
}

/// Claimant whose handler for `event` records the call and then fails
fn failing_claimant(name: &str, capability: &str, event: &'static str, log: &Log) -> Arc<dyn Plugin> {
    Arc::new(Claimant {
        name: name.to_string(),
        stage: LifecycleStage::Service,
        capability: capability.to_string(),
        fails_on: Some(event),
        log: log.clone(),
    })
}

/// Only the `name:event:target` entries of a log
fn entity_events(log: &Log) -> Vec<String> {
    log.lock().iter().filter(|l| l.split(':').count() == 3).cloned().collect()
}

fn strict_config() -> KeelConfig {
    let mut config = KeelConfig::default();
    config.kernel.strict = true;
    config
}

fn laser() -> ServiceConfig {
    ServiceConfig {
        provider: "provider/device/lihuiyu".to_string(),
        label: "laser".to_string(),
        activate: true,
        assigned: false,
    }
}

/// Kernel plugin that fails when it reaches `at`
fn fails_at(at: LifecycleStage) -> Arc<dyn Plugin> {
    plugin_fn("stubborn", move |_, stage| {
        if stage == at {
            return Err(Error::plugin(format!("{} failed", stage)));
        }
        Ok(StageOutcome::Ignored)
    })
}

/// Registers the lihuiyu provider and the gui module type
fn device() -> Arc<dyn Plugin> {
    plugin_fn("device", |ctx, stage| {
        if stage == LifecycleStage::Register {
            ctx.services.register_provider("provider/device/lihuiyu", "Lihuiyu")?;
            ctx.modules.register_type("module/gui", "GUI")?;
        }
        Ok(StageOutcome::Ignored)
    })
}

#[test]
fn test_every_stage_once_in_order() {
    let log = log();
    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(recorder("a", &log)).unwrap();
    kernel.run().unwrap();

    let expected: Vec<String> = LifecycleStage::ALL.iter().map(|s| format!("a:{}", s)).collect();
    assert_eq!(*log.lock(), expected);
    assert_eq!(kernel.stage(), Some(LifecycleStage::Shutdown));
    assert_eq!(kernel.lookup("kernel/stage"), Some(&json!("shutdown")));
}

#[test]
fn test_plugins_are_called_in_registration_order() {
    let log = log();
    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(recorder("first", &log)).unwrap();
    kernel.add_plugin(recorder("second", &log)).unwrap();
    kernel.advance(LifecycleStage::Precli).unwrap();

    let seen: Vec<String> = log.lock().iter().filter(|l| l.ends_with(":precli")).cloned().collect();
    assert_eq!(seen, vec!["first:precli", "second:precli"]);
}

#[test]
fn test_contributed_plugins_join_from_service() {
    let log = log();
    let child = recorder("child", &log);
    let parent = plugin_fn("parent", move |_, stage| {
        if stage == LifecycleStage::Plugins {
            return Ok(StageOutcome::plugins(vec![child.clone()]));
        }
        Ok(StageOutcome::Ignored)
    });

    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(parent).unwrap();
    kernel.advance(LifecycleStage::Module).unwrap();

    assert_eq!(*log.lock(), vec!["child:plugins", "child:service", "child:module"]);
    assert_eq!(kernel.registry().len(), 2);
}

#[test]
fn test_invalidated_plugin_sees_no_later_stage() {
    let log = log();
    let inner = log.clone();
    let quitter = plugin_fn("quitter", move |_, stage| {
        inner.lock().push(stage.to_string());
        if stage == LifecycleStage::Invalidate {
            return Ok(StageOutcome::Invalidate);
        }
        Ok(StageOutcome::Ignored)
    });

    let mut kernel = Kernel::new(KeelConfig::default());
    let id = kernel.add_plugin(quitter).unwrap().unwrap();
    kernel.run().unwrap();

    assert_eq!(log.lock().last().map(String::as_str), Some("invalidate"));
    assert_eq!(log.lock().len(), LifecycleStage::Invalidate.index() + 1);
    assert_eq!(kernel.registry().role(id), Some(&PluginRole::Invalidated));
}

#[test]
fn test_precli_value_is_visible_at_cli() {
    let seen = log();
    let inner = seen.clone();
    let plugin = plugin_fn("args", move |ctx, stage| {
        match stage {
            LifecycleStage::Precli => ctx.register("args/mode", "batch"),
            LifecycleStage::Cli => {
                let mode = ctx.lookup("args/mode").and_then(|v| v.as_str()).unwrap_or("missing");
                inner.lock().push(mode.to_string());
            }
            _ => {}
        }
        Ok(StageOutcome::Ignored)
    });

    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(plugin).unwrap();
    kernel.advance(LifecycleStage::Cli).unwrap();
    assert_eq!(*seen.lock(), vec!["batch"]);
}

#[test]
fn test_advance_cannot_go_back() {
    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.advance(LifecycleStage::Boot).unwrap();
    assert!(kernel.advance(LifecycleStage::Register).is_err());
    assert!(kernel.add_plugin(plugin_fn("late", |_, _| Ok(StageOutcome::Ignored))).is_err());
    kernel.advance(LifecycleStage::Start).unwrap();
    assert_eq!(kernel.stage(), Some(LifecycleStage::Start));
}

#[test]
fn test_mainloop_has_a_single_owner() {
    let log = log();
    let owner = |name: &'static str, log: &Log| {
        let log = log.clone();
        plugin_fn(name, move |_, stage| {
            if stage != LifecycleStage::Mainloop {
                return Ok(StageOutcome::Ignored);
            }
            let log = log.clone();
            Ok(StageOutcome::mainloop(move |host| {
                log.lock().push(name.to_string());
                host.console("echo from the loop")
            }))
        })
    };

    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(recorder("clock", &log)).unwrap();
    kernel.add_plugin(owner("gui", &log)).unwrap();
    kernel.add_plugin(owner("headless", &log)).unwrap();
    kernel.run().unwrap();

    let log = log.lock();
    let at = |entry: &str| log.iter().position(|l| l == entry).unwrap();
    assert!(at("clock:premain") < at("gui"));
    assert!(at("gui") < at("clock:postmain"));
    assert_eq!(log.iter().filter(|l| !l.starts_with("clock:")).collect::<Vec<_>>(), vec!["gui"]);
    assert_eq!(kernel.lookup("kernel/mainloop"), Some(&json!("gui")));
    assert_eq!(kernel.context_mut().console_channel().last().as_deref(), Some("from the loop"));
}

#[test]
fn test_mainloop_outcome_elsewhere_is_ignored() {
    let ran = log();
    let inner = ran.clone();
    let eager = plugin_fn("eager", move |_, stage| {
        if stage == LifecycleStage::Ready {
            let inner = inner.clone();
            return Ok(StageOutcome::mainloop(move |_| {
                inner.lock().push("ran".to_string());
                Ok(())
            }));
        }
        Ok(StageOutcome::Ignored)
    });

    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(eager).unwrap();
    kernel.run().unwrap();
    assert!(ran.lock().is_empty());
}

#[test]
fn test_service_claimant_receives_service_events() {
    let log = log();
    let mut config = KeelConfig::default();
    config.services.push(ServiceConfig {
        provider: "provider/device/lihuiyu".to_string(),
        label: "laser".to_string(),
        activate: true,
        assigned: true,
    });

    let mut kernel = Kernel::new(config);
    kernel.add_plugin(device()).unwrap();
    kernel
        .add_plugin(claimant("driver", LifecycleStage::Service, "provider/device/lihuiyu", &log))
        .unwrap();
    kernel.run().unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "driver:plugins",
            "driver:added:laser",
            "driver:service_attach:laser",
            "driver:assigned:laser",
            "driver:service_detach:laser",
            "driver:shutdown:laser",
        ]
    );
    assert_eq!(kernel.lookup("kernel/last_active/device"), Some(&json!("laser")));
}

#[test]
fn test_module_claimant_receives_module_events() {
    let log = log();
    let mut config = KeelConfig::default();
    config.modules.open.push("module/gui".to_string());

    let mut kernel = Kernel::new(config);
    kernel.add_plugin(device()).unwrap();
    kernel
        .add_plugin(claimant("window", LifecycleStage::Module, "module/*", &log))
        .unwrap();
    kernel.run().unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "window:plugins",
            "window:service",
            "window:module_open:module/gui",
            "window:module_close:module/gui",
            "window:shutdown:module/gui",
        ]
    );
}

#[test]
fn test_console_routes_events_to_claimants() {
    let log = log();
    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.add_plugin(device()).unwrap();
    kernel
        .add_plugin(claimant("driver", LifecycleStage::Service, "provider/device/*", &log))
        .unwrap();
    kernel.advance(LifecycleStage::Ready).unwrap();

    kernel.console("service add provider/device/lihuiyu bench").unwrap();
    assert_eq!(*log.lock(), vec!["driver:plugins", "driver:added:bench"]);
}

#[test]
fn test_unknown_command_is_reported() {
    let mut kernel = Kernel::new(KeelConfig::default());
    kernel.advance(LifecycleStage::Register).unwrap();
    kernel.console("frobnicate now").unwrap();
    assert_eq!(
        kernel.context_mut().console_channel().last().as_deref(),
        Some("frobnicate is not a registered command.")
    );
}

#[test]
fn test_plugin_errors_follow_strict_mode() {
    let failing = || plugin_fn("broken", |_, stage| {
        if stage == LifecycleStage::Boot {
            return Err(Error::plugin("boot failed"));
        }
        Ok(StageOutcome::Ignored)
    });

    let mut lenient = Kernel::new(KeelConfig::default());
    lenient.add_plugin(failing()).unwrap();
    assert!(lenient.run().is_ok());

    let mut config = KeelConfig::default();
    config.kernel.strict = true;
    let mut strict = Kernel::new(config);
    strict.add_plugin(failing()).unwrap();
    assert!(strict.run().is_err());
    assert_eq!(strict.stage(), Some(LifecycleStage::Boot));
}

#[test]
fn test_strict_event_failure_reaches_every_claimant() {
    let log = log();
    let mut kernel = Kernel::new(strict_config());
    kernel.add_plugin(device()).unwrap();
    kernel
        .add_plugin(failing_claimant("a", "provider/device/lihuiyu", "added", &log))
        .unwrap();
    kernel
        .add_plugin(claimant("b", LifecycleStage::Service, "provider/device/lihuiyu", &log))
        .unwrap();
    kernel.advance(LifecycleStage::Ready).unwrap();

    let err = kernel
        .console("service add provider/device/lihuiyu one\nservice activate 1")
        .unwrap_err();
    assert!(err.to_string().contains("a rejected added"));
    assert_eq!(
        entity_events(&log),
        vec!["a:added:one", "b:added:one", "a:service_attach:one", "b:service_attach:one"]
    );
}

#[test]
fn test_strict_shutdown_failure_still_tears_down() {
    let log = log();
    let mut config = strict_config();
    config.services.push(laser());

    let mut kernel = Kernel::new(config);
    kernel.add_plugin(device()).unwrap();
    kernel.add_plugin(fails_at(LifecycleStage::Shutdown)).unwrap();
    kernel
        .add_plugin(claimant("driver", LifecycleStage::Service, "provider/device/lihuiyu", &log))
        .unwrap();

    let err = kernel.run().unwrap_err();
    assert!(err.to_string().contains("shutdown failed"));
    assert_eq!(kernel.stage(), Some(LifecycleStage::Shutdown));
    assert!(kernel.context().services.list().is_empty());
    assert_eq!(
        entity_events(&log),
        vec![
            "driver:added:laser",
            "driver:service_attach:laser",
            "driver:service_detach:laser",
            "driver:shutdown:laser",
        ]
    );
}

#[test]
fn test_strict_preshutdown_failure_still_shuts_down() {
    let log = log();
    let mut config = strict_config();
    config.services.push(laser());

    let mut kernel = Kernel::new(config);
    kernel.add_plugin(device()).unwrap();
    kernel.add_plugin(fails_at(LifecycleStage::Preshutdown)).unwrap();
    kernel
        .add_plugin(claimant("driver", LifecycleStage::Service, "provider/device/lihuiyu", &log))
        .unwrap();

    let err = kernel.run().unwrap_err();
    assert!(err.to_string().contains("preshutdown failed"));
    assert_eq!(kernel.stage(), Some(LifecycleStage::Shutdown));
    assert!(kernel.context().services.list().is_empty());
    assert!(entity_events(&log).ends_with(&["driver:service_detach:laser".to_string(), "driver:shutdown:laser".to_string()]));
}

#[test]
fn test_disabled_plugin_is_never_called() {
    let log = log();
    let mut config = KeelConfig::default();
    config.plugins.disabled.push("muted".to_string());

    let mut kernel = Kernel::new(config);
    assert_eq!(kernel.add_plugin(recorder("muted", &log)).unwrap(), None);
    kernel.run().unwrap();
    assert!(log.lock().is_empty());
}
