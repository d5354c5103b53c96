use std::collections::BTreeMap;

use super::command::{Category, CommandOutput};
use super::registry::CommandRegistry;

/// Help text for one command, or an overview of all of them grouped by
/// category.
pub fn generate_help(registry: &CommandRegistry, name: Option<&str>) -> CommandOutput {
    if let Some(name) = name {
        return match registry.resolve(name) {
            Some(command) => CommandOutput::Lines(command.help()),
            None => CommandOutput::text(format!("No help available for '{name}'")),
        };
    }

    let mut groups: BTreeMap<Category, Vec<(&str, &str)>> = BTreeMap::new();
    for command in registry.commands() {
        let spec = command.spec();
        groups.entry(spec.category).or_default().push((spec.name, spec.description));
    }

    let width = groups.values().flatten().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut lines = vec!["Available commands:".to_string()];
    for (category, mut commands) in groups {
        commands.sort_by_key(|(name, _)| *name);
        lines.push(String::new());
        lines.push(format!("{category}:"));
        for (name, description) in commands {
            lines.push(format!("  {name:<width$}  {description}"));
        }
    }
    lines.push(String::new());
    lines.push("Type 'help <command>' for details on a command.".to_string());
    CommandOutput::Lines(lines)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn registry() -> CommandRegistry { CommandRegistry::with_builtins(&BTreeMap::new()) }

    #[test]
    fn overview_groups_by_category_in_order() {
        let lines = generate_help(&registry(), None).to_lines();
        let headers: Vec<_> = lines.iter().filter(|l| l.ends_with(':') && !l.starts_with(' ')).collect();
        assert_eq!(
            headers,
            vec!["Available commands:", "General:", "Dice:", "Window:", "Party:", "Admin:", "Debug:"]
        );
    }

    #[test]
    fn overview_sorts_within_category() {
        let lines = generate_help(&registry(), None).to_lines();
        let start = lines.iter().position(|l| l == "Window:").unwrap() + 1;
        let names: Vec<_> = lines[start..]
            .iter()
            .take_while(|l| !l.is_empty())
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(names, vec!["chat", "explorer", "terminal", "window"]);
    }

    #[test]
    fn single_command_help_resolves_aliases() {
        let lines = generate_help(&registry(), Some("r")).to_lines();
        assert!(lines[0].starts_with("roll - "));
        assert!(lines.iter().any(|l| l == "Aliases: r, d"));
        assert!(lines.iter().any(|l| l.contains("<expression> (required)")));
    }

    #[test]
    fn unknown_command_help() {
        assert_eq!(
            generate_help(&registry(), Some("zzz")),
            CommandOutput::text("No help available for 'zzz'")
        );
    }
}
