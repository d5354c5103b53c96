use tracing::{debug, trace};

use super::command::CommandOutput;
use super::context::CommandContext;
use super::parser::parse_command;
use super::registry::CommandRegistry;

/// Runs one command line. Never fails: every problem becomes output text.
pub fn execute_command<'a>(
    registry: &'a CommandRegistry,
    line: &str,
    ctx: &mut CommandContext<'a>,
) -> CommandOutput {
    let parsed = parse_command(line);
    ctx.registry = Some(registry);
    ctx.original = parsed.original.clone();

    if parsed.is_empty() {
        return CommandOutput::Empty;
    }
    if let Some(error) = &parsed.error {
        trace!(%error, "parse warning");
    }

    let Some(command) = registry.resolve(&parsed.command) else {
        return CommandOutput::text(format!("Unknown command: {}", parsed.command));
    };
    let spec = command.spec();

    let required: Vec<_> = spec.required_args().collect();
    if parsed.args.len() < required.len() {
        let missing: Vec<_> = required[parsed.args.len()..].iter().map(|a| a.name).collect();
        return CommandOutput::Lines(vec![
            format!("Missing required argument(s): {}", missing.join(", ")),
            format!("Usage: {}", spec.usage),
        ]);
    }

    trace!(command = spec.name, args = ?parsed.args, "executing");
    match command.execute(&parsed.args, ctx) {
        Ok(output) => output,
        Err(e) => {
            debug!(command = spec.name, "command failed: {e:#}");
            CommandOutput::text(format!("Error executing command: {e}"))
        }
    }
}
