//! Tiled virtual desktop: a binary-split window tree with workspaces,
//! debounced persistence and an embedded command terminal.

pub mod common;
pub mod layout_engine;
pub mod model;
pub mod storage;
pub mod terminal;
