//! Console commands the kernel registers for itself

use keel_core::{Channel, CommandCall, Context, Error, NodeId, Result, ServiceId};

const SERVICE_USAGE: &str = "usage: service list|providers|add <provider> <label>|activate <id> [assigned]|deactivate <domain>|remove <id>";
const MODULE_USAGE: &str = "usage: module list|open <path>|close <path>";
const TREE_USAGE: &str = "usage: tree list|add <node_type> <label>|ops <node_type>|invoke <label> <node_id>";

/// Register the built-in command set on a context
pub fn register(ctx: &mut Context) {
    ctx.console_command("help", "Lists commands, or shows help for one command.", help);
    ctx.console_command("echo", "Writes its arguments back to the channel.", |call, channel, _| {
        channel.send(call.remainder.clone());
        Ok(())
    });
    ctx.console_command("lookup", "Lists lookup registry entries matching a pattern.", lookup);
    ctx.console_command("service", "Manages service instances.", service);
    ctx.console_command("module", "Opens and closes modules.", module);
    ctx.console_command("tree", "Inspects element nodes and runs tree operations.", tree);
    ctx.console_command("shutdown", "Asks the mainloop to return.", |_, channel, ctx| {
        ctx.request_shutdown();
        channel.send("Shutting down.");
        Ok(())
    });
}

fn help(call: &CommandCall, channel: &Channel, ctx: &mut Context) -> Result<()> {
    match call.arg(0) {
        Some(name) => match ctx.console.command(name) {
            Some(command) => channel.send(format!("{}: {}", command.name, command.help)),
            None => channel.send(format!("{} is not a registered command.", name)),
        },
        None => {
            for command in ctx.console.commands() {
                channel.send(format!("{:<10} {}", command.name, command.help));
            }
        }
    }
    Ok(())
}

fn lookup(call: &CommandCall, channel: &Channel, ctx: &mut Context) -> Result<()> {
    let pattern = call.arg(0).unwrap_or("*");
    let entries = ctx.lookup.find(pattern);
    if entries.is_empty() {
        channel.send(format!("No lookup entries match {}", pattern));
    }
    for (key, value) in entries {
        channel.send(format!("{} = {}", key, value));
    }
    Ok(())
}

fn parse_service_id(value: Option<&str>) -> Result<ServiceId> {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .map(ServiceId)
        .ok_or_else(|| Error::console(SERVICE_USAGE))
}

fn service(call: &CommandCall, channel: &Channel, ctx: &mut Context) -> Result<()> {
    match call.arg(0) {
        Some("list") | None => {
            let services = ctx.services.list();
            if services.is_empty() {
                channel.send("No services.");
            }
            for handle in services {
                let marker = if ctx.services.is_active(handle.id) { " *" } else { "" };
                channel.send(format!("#{} {} [{}]{}", handle.id, handle.label, handle.provider, marker));
            }
        }
        Some("providers") => {
            for provider in ctx.services.providers() {
                channel.send(format!("{} ({})", provider.path, provider.label));
            }
        }
        Some("add") => {
            let provider = call.arg(1).ok_or_else(|| Error::console(SERVICE_USAGE))?;
            let label = call.args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
            if label.is_empty() {
                return Err(Error::console(SERVICE_USAGE));
            }
            let handle = ctx.services.create(provider, label)?;
            channel.send(format!("Added service #{} {}", handle.id, handle.label));
        }
        Some("activate") => {
            let id = parse_service_id(call.arg(1))?;
            let assigned = call.arg(2) == Some("assigned");
            ctx.services.activate(id, assigned)?;
            channel.send(format!("Activated service #{}", id));
        }
        Some("deactivate") => {
            let domain = call.arg(1).ok_or_else(|| Error::console(SERVICE_USAGE))?;
            match ctx.services.deactivate(domain) {
                Some(id) => channel.send(format!("Deactivated service #{}", id)),
                None => channel.send(format!("No active service in {}", domain)),
            }
        }
        Some("remove") => {
            let id = parse_service_id(call.arg(1))?;
            let handle = ctx.services.remove(id)?;
            channel.send(format!("Removed service #{} {}", handle.id, handle.label));
        }
        Some(_) => return Err(Error::console(SERVICE_USAGE)),
    }
    Ok(())
}

fn module(call: &CommandCall, channel: &Channel, ctx: &mut Context) -> Result<()> {
    match (call.arg(0), call.arg(1)) {
        (Some("list") | None, _) => {
            for (path, label) in ctx.modules.types() {
                let state = if ctx.modules.is_open(path) { "open" } else { "closed" };
                channel.send(format!("{} ({}) {}", path, label, state));
            }
        }
        (Some("open"), Some(path)) => {
            let handle = ctx.modules.open(path)?;
            channel.send(format!("Opened {}", handle));
        }
        (Some("close"), Some(path)) => {
            let handle = ctx.modules.close(path)?;
            channel.send(format!("Closed {}", handle));
        }
        _ => return Err(Error::console(MODULE_USAGE)),
    }
    Ok(())
}

fn tree(call: &CommandCall, channel: &Channel, ctx: &mut Context) -> Result<()> {
    match call.arg(0) {
        Some("list") | None => {
            for node in ctx.elements.nodes() {
                channel.send(format!("{} {} '{}'", node.id, node.node_type, node.label));
            }
        }
        Some("add") => {
            // Node types may contain spaces ("op cut"); the last word is the label.
            let words = call.args.get(1..).unwrap_or_default();
            let Some((label, node_type)) = words.split_last() else {
                return Err(Error::console(TREE_USAGE));
            };
            if node_type.is_empty() {
                return Err(Error::console(TREE_USAGE));
            }
            let id = ctx.elements.add_node(node_type.join(" "), label.clone());
            channel.send(format!("Added node {}", id));
        }
        Some("ops") => {
            let node_type = call.args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
            for op in ctx.elements.operations_for(&node_type) {
                channel.send(format!("{}: {}", op.label, op.help));
            }
        }
        Some("invoke") => {
            // Labels may contain spaces ("Hello World"); the last word is the node id.
            let words = call.args.get(1..).unwrap_or_default();
            let Some((id, label)) = words.split_last() else {
                return Err(Error::console(TREE_USAGE));
            };
            let id = id.parse::<usize>().map(NodeId).map_err(|_| Error::console(TREE_USAGE))?;
            ctx.invoke_tree_operation(&label.join(" "), id)?;
        }
        Some(_) => return Err(Error::console(TREE_USAGE)),
    }
    Ok(())
}
