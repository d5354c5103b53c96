use serde_json::Value;

use crate::terminal::command::{
    ArgSpec, Category, Command, CommandOutput, CommandSpec, missing_capability,
};
use crate::terminal::context::CommandContext;
use crate::terminal::help::generate_help;

pub struct HelpCommand {
    spec: CommandSpec,
}

impl HelpCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "help",
                aliases: &["h", "?"],
                description: "List commands or show help for one",
                usage: "help [command]",
                args: vec![ArgSpec::optional("command", "Command to describe")],
                category: Category::General,
            },
        }
    }
}

impl Command for HelpCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        let Some(registry) = ctx.registry else { return Ok(missing_capability("registry")) };
        Ok(generate_help(registry, args.first().map(String::as_str)))
    }
}

pub struct ClearCommand {
    spec: CommandSpec,
}

impl ClearCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "clear",
                aliases: &["cl", "cls"],
                description: "Clear the terminal output",
                usage: "clear",
                args: vec![],
                category: Category::General,
            },
        }
    }
}

impl Command for ClearCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, _: &[String], _: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        Ok(CommandOutput::structured("clear", Value::Null))
    }
}

pub struct VersionCommand {
    spec: CommandSpec,
}

impl VersionCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "version",
                aliases: &["ver"],
                description: "Show the application version",
                usage: "version",
                args: vec![],
                category: Category::General,
            },
        }
    }
}

impl Command for VersionCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, _: &[String], _: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        Ok(CommandOutput::text(format!("splitdesk v{}", env!("CARGO_PKG_VERSION"))))
    }
}

/// Dumps what the terminal knows about its surroundings.
pub struct DebugCommand {
    spec: CommandSpec,
}

impl DebugCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "debug",
                aliases: &["dbg"],
                description: "Show session and layout details",
                usage: "debug",
                args: vec![],
                category: Category::Debug,
            },
        }
    }
}

fn yes_no(present: bool) -> &'static str { if present { "yes" } else { "no" } }

impl Command for DebugCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, _: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        let user = match &ctx.user {
            Some(user) if user.is_admin => format!("{} (admin)", user.name),
            Some(user) => user.name.clone(),
            None => "anonymous".to_string(),
        };
        let mut lines = vec![
            format!("User: {user}"),
            format!(
                "Window: {}",
                ctx.node_id.map_or_else(|| "none".to_string(), |id| id.to_string())
            ),
            format!("Input: {}", ctx.original),
            format!("Commands: {}", ctx.registry.map_or(0, |r| r.len())),
            format!(
                "Capabilities: windows={} party={} announcer={} dice={}",
                yes_no(ctx.windows.is_some()),
                yes_no(ctx.party.is_some()),
                yes_no(ctx.announcer.is_some()),
                yes_no(ctx.dice.is_some()),
            ),
        ];
        if let Some(windows) = ctx.windows.as_deref() {
            lines.push("Layout:".to_string());
            lines.extend(windows.layout_summary());
        }
        Ok(CommandOutput::Lines(lines))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use crate::model::{NodeId, WindowType};
    use crate::terminal::context::{User, WindowControl};
    use crate::terminal::{CommandContext, CommandOutput, CommandRegistry, execute_command};

    struct FixedLayout;

    impl WindowControl for FixedLayout {
        fn transform_window(&mut self, _: NodeId, _: WindowType) -> bool { true }

        fn layout_summary(&self) -> Vec<String> { vec!["[1] terminal".into()] }
    }

    fn registry() -> CommandRegistry { CommandRegistry::with_builtins(&BTreeMap::new()) }

    #[test]
    fn clear_is_structured() {
        let out = execute_command(&registry(), "cls", &mut CommandContext::new());
        assert!(matches!(out, CommandOutput::Structured { ref kind, .. } if kind == "clear"));
    }

    #[test]
    fn version_reports_package_version() {
        let out = execute_command(&registry(), "ver", &mut CommandContext::new());
        assert_eq!(out, CommandOutput::text(format!("splitdesk v{}", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn help_uses_registry_from_executor() {
        let out = execute_command(&registry(), "?", &mut CommandContext::new());
        assert_eq!(out.to_lines()[0], "Available commands:");
    }

    #[test]
    fn debug_includes_layout_when_available() {
        let registry = registry();
        let mut layout = FixedLayout;
        let mut ctx = CommandContext::new()
            .with_user(User::admin("root"))
            .with_node(NodeId::new(1))
            .with_windows(&mut layout);
        let lines = execute_command(&registry, "dbg", &mut ctx).to_lines();
        assert_eq!(lines[0], "User: root (admin)");
        assert_eq!(lines[1], "Window: 1");
        assert_eq!(lines[2], "Input: dbg");
        assert_eq!(lines[3], "Commands: 12");
        assert_eq!(lines.last().map(String::as_str), Some("[1] terminal"));
    }

    #[test]
    fn debug_without_capabilities() {
        let lines = execute_command(&registry(), "debug", &mut CommandContext::new()).to_lines();
        assert_eq!(lines[0], "User: anonymous");
        assert_eq!(lines[4], "Capabilities: windows=no party=no announcer=no dice=no");
        assert_eq!(lines.len(), 5);
    }
}
