use super::registry::CommandRegistry;
use crate::model::{NodeId, WindowType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub is_admin: bool,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), is_admin: false } }

    pub fn admin(name: impl Into<String>) -> Self { Self { name: name.into(), is_admin: true } }
}

/// Access to the window tree for commands that change the current window.
pub trait WindowControl {
    /// Changes the type of leaf `id`. Returns false if no such leaf exists.
    fn transform_window(&mut self, id: NodeId, window_type: WindowType) -> bool;

    /// Human-readable description of the current layout.
    fn layout_summary(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartyRequest {
    Create(Option<String>),
    Join(String),
    Leave,
    List,
    Info,
    Delete(Option<String>),
    Mode(String),
    Stats,
}

pub trait PartyService {
    fn handle(&mut self, user: Option<&User>, request: PartyRequest) -> anyhow::Result<Vec<String>>;
}

pub trait Announcer {
    fn announce(&mut self, from: &User, text: &str) -> anyhow::Result<()>;
}

pub trait DiceRoller {
    /// A value in `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;
}

/// Capabilities and metadata handed to a running command.
///
/// Every capability is optional; commands reply with a message naming the
/// capability they are missing instead of failing.
#[derive(Default)]
pub struct CommandContext<'a> {
    pub user: Option<User>,
    pub node_id: Option<NodeId>,
    /// The full command line as typed; set by the executor.
    pub original: String,
    /// Set by the executor.
    pub registry: Option<&'a CommandRegistry>,
    pub windows: Option<&'a mut dyn WindowControl>,
    pub party: Option<&'a mut dyn PartyService>,
    pub announcer: Option<&'a mut dyn Announcer>,
    pub dice: Option<&'a mut dyn DiceRoller>,
}

impl<'a> CommandContext<'a> {
    pub fn new() -> Self { Self::default() }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_node(mut self, id: NodeId) -> Self {
        self.node_id = Some(id);
        self
    }

    pub fn with_windows(mut self, windows: &'a mut dyn WindowControl) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn with_party(mut self, party: &'a mut dyn PartyService) -> Self {
        self.party = Some(party);
        self
    }

    pub fn with_announcer(mut self, announcer: &'a mut dyn Announcer) -> Self {
        self.announcer = Some(announcer);
        self
    }

    pub fn with_dice(mut self, dice: &'a mut dyn DiceRoller) -> Self {
        self.dice = Some(dice);
        self
    }

    pub fn is_admin(&self) -> bool { self.user.as_ref().is_some_and(|u| u.is_admin) }
}

impl std::fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("user", &self.user)
            .field("node_id", &self.node_id)
            .field("original", &self.original)
            .field("registry", &self.registry.is_some())
            .field("windows", &self.windows.is_some())
            .field("party", &self.party.is_some())
            .field("announcer", &self.announcer.is_some())
            .field("dice", &self.dice.is_some())
            .finish()
    }
}
