pub mod geometry;
pub mod graph;
pub mod manager;
pub mod navigation;
pub mod resize;
pub mod tree_ops;

pub use geometry::{Bounds, MinimumSize, Rect, Viewport, WindowBounds, compute_bounds, is_adjacent};
pub use graph::{Direction, Orientation, ParseDirectionError};
pub use manager::{CreateOutcome, ResizeOutcome, SplitOutcome, WindowManager};
