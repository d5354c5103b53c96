use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use super::builtins;
use super::command::Command;
use crate::common::collections::{HashMap, HashSet};

/// Lookup table from command names and aliases to commands.
///
/// Names and aliases are matched case-insensitively. When a name is not
/// found directly, the legacy alias table is followed, possibly through
/// several hops, until it reaches a registered name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
    index: HashMap<String, usize>,
    legacy_aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registry holding every built-in command plus the given legacy aliases.
    pub fn with_builtins(legacy_aliases: &BTreeMap<String, String>) -> Self {
        let mut registry = Self::new();
        for command in builtins::all() {
            registry.register(command);
        }
        for (alias, target) in legacy_aliases {
            registry.add_legacy_alias(alias, target);
        }
        registry
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        let slot = self.commands.len();
        let spec = command.spec();
        let keys = std::iter::once(spec.name).chain(spec.aliases.iter().copied());
        for key in keys {
            if let Some(previous) = self.index.insert(key.to_lowercase(), slot) {
                warn!(
                    key,
                    previous = self.commands[previous].spec().name,
                    "command name registered twice, keeping the newest"
                );
            }
        }
        self.commands.push(command);
    }

    pub fn add_legacy_alias(&mut self, alias: &str, target: &str) {
        self.legacy_aliases.insert(alias.to_lowercase(), target.to_lowercase());
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Command>> {
        let mut key = name.to_lowercase();
        let mut visited = HashSet::default();
        loop {
            if let Some(&slot) = self.index.get(&key) {
                return self.commands.get(slot);
            }
            let target = self.legacy_aliases.get(&key)?;
            if !visited.insert(key.clone()) {
                warn!(name, "alias cycle detected");
                return None;
            }
            key = target.clone();
        }
    }

    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn Command>> { self.commands.iter() }

    pub fn len(&self) -> usize { self.commands.len() }

    pub fn is_empty(&self) -> bool { self.commands.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::command::{Category, CommandOutput, CommandSpec};
    use crate::terminal::context::CommandContext;

    struct Named(CommandSpec);

    impl Command for Named {
        fn spec(&self) -> &CommandSpec { &self.0 }

        fn execute(&self, _: &[String], _: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
            Ok(CommandOutput::text(self.0.name))
        }
    }

    fn named(name: &'static str, aliases: &'static [&'static str]) -> Arc<dyn Command> {
        Arc::new(Named(CommandSpec {
            name,
            aliases,
            description: "",
            usage: name,
            args: vec![],
            category: Category::General,
        }))
    }

    fn resolved(registry: &CommandRegistry, name: &str) -> Option<&'static str> {
        registry.resolve(name).map(|c| c.spec().name)
    }

    #[test]
    fn resolves_names_and_aliases_case_insensitively() {
        let mut registry = CommandRegistry::new();
        registry.register(named("help", &["h", "?"]));
        assert_eq!(resolved(&registry, "HELP"), Some("help"));
        assert_eq!(resolved(&registry, "h"), Some("help"));
        assert_eq!(resolved(&registry, "?"), Some("help"));
        assert_eq!(resolved(&registry, "nope"), None);
    }

    #[test]
    fn legacy_aliases_chain_to_a_command() {
        let mut registry = CommandRegistry::new();
        registry.register(named("explorer", &[]));
        registry.add_legacy_alias("ex", "explorer");
        registry.add_legacy_alias("files", "ex");
        assert_eq!(resolved(&registry, "ex"), Some("explorer"));
        assert_eq!(resolved(&registry, "FILES"), Some("explorer"));
    }

    #[test]
    fn direct_names_take_precedence_over_legacy_aliases() {
        let mut registry = CommandRegistry::new();
        registry.register(named("explorer", &[]));
        registry.register(named("ex", &[]));
        registry.add_legacy_alias("ex", "explorer");
        assert_eq!(resolved(&registry, "ex"), Some("ex"));
    }

    #[test]
    fn alias_cycles_terminate() {
        let mut registry = CommandRegistry::new();
        registry.add_legacy_alias("a", "b");
        registry.add_legacy_alias("b", "a");
        registry.add_legacy_alias("self", "self");
        assert_eq!(resolved(&registry, "a"), None);
        assert_eq!(resolved(&registry, "self"), None);
    }

    #[test]
    fn builtins_are_registered() {
        let registry = CommandRegistry::with_builtins(&BTreeMap::from([("ex".into(), "explorer".into())]));
        for name in ["help", "clear", "version", "roll", "terminal", "explorer", "chat", "admin", "window", "party", "debug", "announcement"] {
            assert_eq!(resolved(&registry, name), Some(name));
        }
        assert_eq!(resolved(&registry, "ex"), Some("explorer"));
        assert_eq!(resolved(&registry, "d"), Some("roll"));
        assert_eq!(resolved(&registry, "p"), Some("party"));
        assert_eq!(registry.len(), 12);
    }
}
