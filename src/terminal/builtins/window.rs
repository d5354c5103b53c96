use std::str::FromStr;

use crate::model::WindowType;
use crate::terminal::command::{
    ArgSpec, Category, Command, CommandOutput, CommandSpec, missing_capability,
};
use crate::terminal::context::CommandContext;

/// Turns the window the command was typed in into `window_type`.
pub(super) fn transform_current(ctx: &mut CommandContext<'_>, window_type: WindowType) -> CommandOutput {
    let Some(node_id) = ctx.node_id else {
        return CommandOutput::text("No active window to transform.");
    };
    let Some(windows) = ctx.windows.as_deref_mut() else {
        return missing_capability("windows");
    };
    if windows.transform_window(node_id, window_type) {
        CommandOutput::text(format!("Switching window to {window_type}..."))
    } else {
        CommandOutput::text(format!("Window {node_id} no longer exists."))
    }
}

/// A command that always transforms into one fixed window type.
pub struct TransformCommand {
    spec: CommandSpec,
    target: WindowType,
}

impl TransformCommand {
    pub fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        description: &'static str,
        target: WindowType,
    ) -> Self {
        Self {
            spec: CommandSpec {
                name,
                aliases,
                description,
                usage: name,
                args: vec![],
                category: Category::Window,
            },
            target,
        }
    }
}

impl Command for TransformCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, _: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        Ok(transform_current(ctx, self.target))
    }
}

pub struct WindowCommand {
    spec: CommandSpec,
}

impl WindowCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "window",
                aliases: &["win"],
                description: "Turn this window into any window type",
                usage: "window <type>",
                args: vec![ArgSpec::required("type", "One of the available window types")],
                category: Category::Window,
            },
        }
    }
}

impl Command for WindowCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        let Some(name) = args.first() else {
            return Ok(CommandOutput::text(format!("Usage: {}", self.spec.usage)));
        };
        let Ok(window_type) = WindowType::from_str(name) else {
            return Ok(CommandOutput::text(format!(
                "Unknown window type '{name}'. Available: {}",
                WindowType::names().join(", ")
            )));
        };
        if window_type == WindowType::Admin && !ctx.is_admin() {
            return Ok(CommandOutput::text("Permission denied: admin access required."));
        }
        Ok(transform_current(ctx, window_type))
    }
}
