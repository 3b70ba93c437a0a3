//! Host state passed to every plugin call

use crate::console::{Channel, CommandCall, Console, CONSOLE_CHANNEL, parse_console};
use crate::elements::{Elements, Node, NodeId};
use crate::error::{Error, Result};
use crate::event::{EntityEvent, EventQueue};
use crate::lookup::Lookup;
use crate::module::Modules;
use crate::service::Services;
use serde_json::Value;

/// Maximum nesting of `console` calls made from inside commands
pub const MAX_CONSOLE_DEPTH: usize = 16;

/// Explicit host context
///
/// Owns the lookup registry, console, element tree and the service and
/// module directories. Service and module changes queue [`EntityEvent`]s
/// which the kernel routes to claiming plugins.
#[derive(Debug)]
pub struct Context {
    pub lookup: Lookup,
    pub console: Console,
    pub elements: Elements,
    pub services: Services,
    pub modules: Modules,
    events: EventQueue,
    cli_args: Vec<String>,
    shutdown_requested: bool,
    console_depth: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let events = EventQueue::new();
        Self {
            lookup: Lookup::new(),
            console: Console::new(),
            elements: Elements::new(),
            services: Services::new(events.clone()),
            modules: Modules::new(events.clone()),
            events,
            cli_args: Vec::new(),
            shutdown_requested: false,
            console_depth: 0,
        }
    }

    /// Store a value in the lookup registry
    pub fn register(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.lookup.register(key, value);
    }

    /// Retrieve a value from the lookup registry
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.lookup.lookup(key)
    }

    /// Register a console command
    pub fn console_command<F>(&mut self, name: impl Into<String>, help: impl Into<String>, handler: F)
    where
        F: Fn(&CommandCall, &Channel, &mut Context) -> Result<()> + Send + Sync + 'static,
    {
        self.console.register_command(name, help, handler);
    }

    /// The channel console commands write to
    pub fn console_channel(&mut self) -> Channel {
        self.console.channel(CONSOLE_CHANNEL)
    }

    /// Run console text, one command per line
    ///
    /// Unknown commands and command failures are reported on the console
    /// channel. Only exceeding [`MAX_CONSOLE_DEPTH`] is returned as an error.
    pub fn console(&mut self, text: &str) -> Result<()> {
        if self.console_depth >= MAX_CONSOLE_DEPTH {
            return Err(Error::console(format!(
                "console nested deeper than {} levels",
                MAX_CONSOLE_DEPTH
            )));
        }

        let channel = self.console_channel();
        self.console_depth += 1;
        for call in parse_console(text) {
            let Some(handler) = self.console.handler(&call.name) else {
                channel.send(format!("{} is not a registered command.", call.name));
                continue;
            };

            tracing::debug!("⌨️ console: {}", call.name);
            if let Err(e) = handler(&call, &channel, self) {
                tracing::warn!("Console command '{}' failed: {}", call.name, e);
                channel.send(format!("{}: {}", call.name, e));
            }
        }
        self.console_depth -= 1;
        Ok(())
    }

    /// Register a tree operation (shorthand for `elements.tree_operation`)
    pub fn tree_operation<F>(&mut self, label: impl Into<String>, node_types: &[&str], help: impl Into<String>, handler: F)
    where
        F: Fn(&Node, &mut Context) -> Result<()> + Send + Sync + 'static,
    {
        self.elements.tree_operation(label, node_types, help, handler);
    }

    /// Run a tree operation against a node
    pub fn invoke_tree_operation(&mut self, label: &str, node: NodeId) -> Result<()> {
        let node = self
            .elements
            .node(node)
            .cloned()
            .ok_or_else(|| Error::Elements(format!("no node {}", node)))?;
        let operation = self
            .elements
            .operation(label)
            .ok_or_else(|| Error::Elements(format!("no tree operation '{}'", label)))?;
        if !operation.applies_to(&node.node_type) {
            return Err(Error::Elements(format!(
                "'{}' does not apply to {} nodes",
                label, node.node_type
            )));
        }

        let handler = operation.handler();
        handler(&node, self)
    }

    /// Arguments passed through to plugins from the command line
    pub fn cli_args(&self) -> &[String] {
        &self.cli_args
    }

    pub fn set_cli_args(&mut self, args: Vec<String>) {
        self.cli_args = args;
    }

    /// Ask the running mainloop to return
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Take the queued service and module events
    pub fn take_events(&mut self) -> Vec<EntityEvent> {
        self.events.drain()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceEvent;
    use serde_json::json;

    #[test]
    fn test_console_runs_registered_command() {
        let mut ctx = Context::new();
        ctx.console_command("example", "Says Hello World.", |_, channel, _| {
            channel.send("Hello World");
            Ok(())
        });

        ctx.console("example\n").unwrap();
        assert_eq!(ctx.console_channel().lines(), vec!["Hello World"]);
    }

    #[test]
    fn test_unknown_command_is_reported() {
        let mut ctx = Context::new();
        ctx.console("frobnicate").unwrap();
        assert_eq!(
            ctx.console_channel().last().as_deref(),
            Some("frobnicate is not a registered command.")
        );
    }

    #[test]
    fn test_failing_command_is_reported() {
        let mut ctx = Context::new();
        ctx.console_command("fail", "", |_, _, _| Err(Error::console("boom")));
        ctx.console("fail").unwrap();
        assert_eq!(
            ctx.console_channel().last().as_deref(),
            Some("fail: Console error: boom")
        );
    }

    #[test]
    fn test_nested_console_is_bounded() {
        let mut ctx = Context::new();
        ctx.console_command("again", "", |_, _, ctx| ctx.console("again"));
        ctx.console("again").unwrap();

        let lines = ctx.console_channel().lines();
        assert!(lines.iter().any(|l| l.contains("nested deeper")));
        assert_eq!(ctx.console_depth, 0);
    }

    #[test]
    fn test_commands_can_mutate_context() {
        let mut ctx = Context::new();
        ctx.console_command("mark", "", |call, _, ctx| {
            ctx.register("marked", call.remainder.clone());
            Ok(())
        });
        ctx.console("mark the spot").unwrap();
        assert_eq!(ctx.lookup("marked"), Some(&json!("the spot")));
    }

    #[test]
    fn test_tree_operation_runs_console() {
        let mut ctx = Context::new();
        ctx.console_command("example", "", |_, channel, _| {
            channel.send("Hello World");
            Ok(())
        });
        ctx.tree_operation("Hello World", &["op cut", "op engrave"], "", |_, ctx| {
            ctx.console("example\n")
        });

        let cut = ctx.elements.add_node("op cut", "Cut");
        let raster = ctx.elements.add_node("op raster", "Raster");

        ctx.invoke_tree_operation("Hello World", cut).unwrap();
        assert_eq!(ctx.console_channel().lines(), vec!["Hello World"]);
        assert!(ctx.invoke_tree_operation("Hello World", raster).is_err());
        assert!(ctx.invoke_tree_operation("Missing", cut).is_err());
    }

    #[test]
    fn test_service_events_are_queued() {
        let mut ctx = Context::new();
        ctx.services
            .register_provider("provider/device/lihuiyu", "Lihuiyu")
            .unwrap();
        let handle = ctx.services.create("provider/device/lihuiyu", "d0").unwrap();
        ctx.services.activate(handle.id, false).unwrap();

        let events = ctx.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], EntityEvent::Service(handle, ServiceEvent::Attach));
        assert!(!ctx.has_pending_events());
    }
}
