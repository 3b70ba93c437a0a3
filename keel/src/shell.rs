//! Host plugins the CLI adds next to the examples

use keel_core::{Context, Result};
use keel_plugin::{Host, LifecycleStage, Plugin, PluginInfo, StageOutcome};
use std::io::{BufRead, Write};

/// Runs the `-e` commands once the kernel is ready
#[derive(Debug, Default, Clone)]
pub struct ScriptPlugin {
    commands: Vec<String>,
}

impl ScriptPlugin {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl Plugin for ScriptPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("keel_script", env!("CARGO_PKG_VERSION"))
            .with_description("Runs command line console commands at ready")
    }

    fn lifecycle(&self, ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        if stage == LifecycleStage::Ready {
            for command in &self.commands {
                tracing::debug!("📜 Running: {}", command);
                ctx.console(command)?;
            }
        }
        Ok(StageOutcome::Ignored)
    }
}

/// Takes the mainloop with an interactive console on stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePlugin {
    batch: bool,
}

impl ConsolePlugin {
    pub fn new(batch: bool) -> Self {
        Self { batch }
    }
}

impl Plugin for ConsolePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("keel_console", env!("CARGO_PKG_VERSION"))
            .with_description("Interactive console mainloop")
    }

    fn lifecycle(&self, _ctx: &mut Context, stage: LifecycleStage) -> Result<StageOutcome> {
        if stage != LifecycleStage::Mainloop || self.batch {
            return Ok(StageOutcome::Ignored);
        }
        Ok(StageOutcome::mainloop(|host| {
            let stdin = std::io::stdin();
            repl(host, stdin.lock())
        }))
    }
}

/// Feed lines to the console until EOF, `quit`, or a shutdown request
fn repl(host: &mut dyn Host, input: impl BufRead) -> Result<()> {
    let mut lines = input.lines();
    while !host.shutdown_requested() {
        eprint!("keel> ");
        std::io::stderr().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if matches!(line, "quit" | "exit") {
            break;
        }
        host.console(line)?;
    }
    Ok(())
}
