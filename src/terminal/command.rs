use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter};

use super::context::CommandContext;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter
)]
pub enum Category {
    General,
    Dice,
    Window,
    Party,
    Admin,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

impl ArgSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self { name, description, required: true }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self { name, description, required: false }
    }
}

/// Static description of a command: how it is invoked and documented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub args: Vec<ArgSpec>,
    pub category: Category,
}

impl CommandSpec {
    pub fn required_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args.iter().filter(|a| a.required)
    }
}

/// Result of running a command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CommandOutput {
    Empty,
    Text(String),
    Lines(Vec<String>),
    /// Output the caller renders specially, such as a dice animation.
    Structured { kind: String, content: Value },
}

impl CommandOutput {
    pub fn text(s: impl Into<String>) -> Self { CommandOutput::Text(s.into()) }

    pub fn structured(kind: impl Into<String>, content: Value) -> Self {
        CommandOutput::Structured { kind: kind.into(), content }
    }

    /// Plain-text rendering, one entry per output line.
    pub fn to_lines(&self) -> Vec<String> {
        match self {
            CommandOutput::Empty => Vec::new(),
            CommandOutput::Text(text) => text.lines().map(str::to_string).collect(),
            CommandOutput::Lines(lines) => lines.clone(),
            CommandOutput::Structured { content, .. } => match content.get("text") {
                Some(Value::String(text)) => vec![text.clone()],
                _ if content.is_null() => Vec::new(),
                _ => vec![content.to_string()],
            },
        }
    }

    pub fn is_empty(&self) -> bool { matches!(self, CommandOutput::Empty) }
}

pub trait Command: Send + Sync {
    fn spec(&self) -> &CommandSpec;

    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>)
    -> anyhow::Result<CommandOutput>;

    fn help(&self) -> Vec<String> { render_help(self.spec()) }
}

pub fn render_help(spec: &CommandSpec) -> Vec<String> {
    let mut lines = vec![
        format!("{} - {}", spec.name, spec.description),
        format!("Usage: {}", spec.usage),
    ];
    if !spec.aliases.is_empty() {
        lines.push(format!("Aliases: {}", spec.aliases.join(", ")));
    }
    if !spec.args.is_empty() {
        lines.push("Arguments:".to_string());
        for arg in &spec.args {
            let (open, close, label) =
                if arg.required { ('<', '>', "required") } else { ('[', ']', "optional") };
            lines.push(format!(
                "  {open}{}{close} ({label}) - {}",
                arg.name, arg.description
            ));
        }
    }
    lines
}

/// Reply used when a command needs a capability the caller did not provide.
pub fn missing_capability(name: &str) -> CommandOutput {
    CommandOutput::text(format!("This command needs the '{name}' capability, which is not available here."))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn spec() -> CommandSpec {
        CommandSpec {
            name: "party",
            aliases: &["p"],
            description: "Manage parties",
            usage: "party <subcommand> [value]",
            args: vec![
                ArgSpec::required("subcommand", "What to do"),
                ArgSpec::optional("value", "Code or name"),
            ],
            category: Category::Party,
        }
    }

    #[test]
    fn help_lists_aliases_and_argument_requirements() {
        assert_eq!(
            render_help(&spec()),
            vec![
                "party - Manage parties",
                "Usage: party <subcommand> [value]",
                "Aliases: p",
                "Arguments:",
                "  <subcommand> (required) - What to do",
                "  [value] (optional) - Code or name",
            ]
        );
        assert_eq!(spec().required_args().count(), 1);
    }

    #[test]
    fn output_lines() {
        assert!(CommandOutput::Empty.to_lines().is_empty());
        assert_eq!(CommandOutput::text("a\nb").to_lines(), vec!["a", "b"]);
        assert_eq!(
            CommandOutput::structured("dice", json!({ "text": "Rolled 7" })).to_lines(),
            vec!["Rolled 7"]
        );
        assert!(CommandOutput::structured("clear", Value::Null).to_lines().is_empty());
    }
}
