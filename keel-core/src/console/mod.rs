//! Console command table
//!
//! Commands are looked up by their first word. Execution happens through
//! [`Context::console`](crate::Context::console) so handlers can reach the rest
//! of the host state.

mod channel;

pub use channel::{Channel, Watcher};

use crate::context::Context;
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Channel that receives console command output
pub const CONSOLE_CHANNEL: &str = "console";

/// Handler invoked for one console command line
pub type CommandHandler =
    Arc<dyn Fn(&CommandCall, &Channel, &mut Context) -> Result<()> + Send + Sync>;

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    /// Command name (first word)
    pub name: String,
    /// Remaining whitespace-separated words
    pub args: Vec<String>,
    /// Text after the command name, untouched
    pub remainder: String,
}

impl CommandCall {
    /// Parse a single line; `None` for blank lines
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let name = words.next()?.to_string();
        let args = words.map(str::to_string).collect();
        let remainder = line[name.len()..].trim_start().to_string();
        Some(Self {
            name,
            args,
            remainder,
        })
    }

    /// Positional argument
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Split console text into command lines on `\n` and `;`
pub fn parse_console(text: &str) -> Vec<CommandCall> {
    text.split(['\n', ';'])
        .filter_map(CommandCall::parse)
        .collect()
}

/// A registered console command
#[derive(Clone)]
pub struct ConsoleCommand {
    pub name: String,
    pub help: String,
    handler: CommandHandler,
}

impl std::fmt::Debug for ConsoleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleCommand")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish()
    }
}

/// Registered commands and channels
#[derive(Debug, Default)]
pub struct Console {
    commands: BTreeMap<String, ConsoleCommand>,
    channels: BTreeMap<String, Channel>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, replacing any command with the same name
    pub fn register_command<F>(&mut self, name: impl Into<String>, help: impl Into<String>, handler: F)
    where
        F: Fn(&CommandCall, &Channel, &mut Context) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.commands.contains_key(&name) {
            tracing::debug!("🔁 Replacing console command: {}", name);
        }
        self.commands.insert(
            name.clone(),
            ConsoleCommand {
                name,
                help: help.into(),
                handler: Arc::new(handler),
            },
        );
    }

    pub fn command(&self, name: &str) -> Option<&ConsoleCommand> {
        self.commands.get(name)
    }

    /// Handler for a command, cloned so it can run against `&mut Context`
    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).map(|c| c.handler.clone())
    }

    /// All commands in name order
    pub fn commands(&self) -> impl Iterator<Item = &ConsoleCommand> {
        self.commands.values()
    }

    /// Get a channel, creating it on first use
    pub fn channel(&mut self, name: &str) -> Channel {
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name))
            .clone()
    }
}
