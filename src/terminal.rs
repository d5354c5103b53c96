//! The command terminal hosted inside terminal windows.
//!
//! A line typed by the user goes through [`tokenize`], then
//! [`parse_command`], then is resolved through the [`CommandRegistry`] and
//! run by [`execute_command`] against a [`CommandContext`] carrying whatever
//! capabilities the host provides.

pub mod builtins;
pub mod command;
pub mod context;
pub mod executor;
pub mod help;
pub mod parser;
pub mod registry;
pub mod tokenizer;

pub use command::{ArgSpec, Category, Command, CommandOutput, CommandSpec};
pub use context::{
    Announcer, CommandContext, DiceRoller, PartyRequest, PartyService, User, WindowControl,
};
pub use executor::execute_command;
pub use help::generate_help;
pub use parser::{ParsedCommand, parse_command};
pub use registry::CommandRegistry;
pub use tokenizer::tokenize;
