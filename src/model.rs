pub mod node;
pub mod session_drafts;
pub mod window_type;
pub mod workspace;

pub use node::{IdAllocator, Node, NodeId, SplitNode, WindowLeaf, clamp_ratio};
pub use session_drafts::SessionDrafts;
pub use window_type::WindowType;
pub use workspace::{Workspace, WorkspaceSnapshot, WorkspaceStore};
