use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

pub const TERMINAL_WELCOME: &str = "Welcome to splitdesk. Type 'help' to list commands.";
pub const EDITOR_PLACEHOLDER: &str = "// Start writing here\n";

/// Which pane owns a window leaf.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WindowType {
    Terminal,
    Editor,
    Explorer,
    Audio,
    Image,
    Dice,
    Chat,
    Admin,
    Canvas,
}

/// Fresh terminal content greeting the user with `welcome`; an empty
/// welcome starts with no output.
pub fn terminal_state(welcome: &str) -> Value {
    let output: Vec<&str> = if welcome.is_empty() { vec![] } else { vec![welcome] };
    json!({
        "output": output,
        "history": [],
        "input": "",
    })
}

impl WindowType {
    /// Content a freshly created leaf of this type starts with.
    pub fn default_state(self) -> Value {
        match self {
            WindowType::Terminal => terminal_state(TERMINAL_WELCOME),
            WindowType::Editor => json!({ "content": EDITOR_PLACEHOLDER }),
            WindowType::Explorer => json!({
                "currentPath": "/",
                "selectedItem": null,
            }),
            _ => json!({}),
        }
    }

    pub fn names() -> Vec<&'static str> {
        use strum::IntoEnumIterator;
        Self::iter().map(<&'static str>::from).collect()
    }
}
