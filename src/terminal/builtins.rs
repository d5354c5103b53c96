//! Commands available in every terminal.

mod admin;
mod dice;
mod general;
mod party;
mod window;

use std::sync::Arc;

pub use admin::{AdminCommand, AnnouncementCommand};
pub use dice::{DiceError, DiceExpression, RollCommand, ThreadRngRoller};
pub use general::{ClearCommand, DebugCommand, HelpCommand, VersionCommand};
pub use party::PartyCommand;
pub use window::{TransformCommand, WindowCommand};

use super::command::Command;
use crate::model::WindowType;

pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(HelpCommand::new()),
        Arc::new(ClearCommand::new()),
        Arc::new(VersionCommand::new()),
        Arc::new(RollCommand::new()),
        Arc::new(TransformCommand::new(
            "terminal",
            &["term"],
            "Turn this window into a terminal",
            WindowType::Terminal,
        )),
        Arc::new(TransformCommand::new(
            "explorer",
            &[],
            "Turn this window into a file explorer",
            WindowType::Explorer,
        )),
        Arc::new(TransformCommand::new(
            "chat",
            &[],
            "Turn this window into a chat",
            WindowType::Chat,
        )),
        Arc::new(AdminCommand::new()),
        Arc::new(WindowCommand::new()),
        Arc::new(PartyCommand::new()),
        Arc::new(DebugCommand::new()),
        Arc::new(AnnouncementCommand::new()),
    ]
}
