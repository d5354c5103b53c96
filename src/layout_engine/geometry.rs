//! Percentage-space geometry for window trees.
//!
//! Every rectangle here is expressed in percent of the viewport (0 to 100 on
//! both axes). Pixel sizes only appear when checking leaves against the
//! minimum window size.

use serde::{Deserialize, Serialize};

use super::{Direction, Orientation};
use crate::model::{Node, NodeId};

/// Tolerance used when comparing edges, in percentage units.
pub const ADJACENCY_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const FULL: Rect = Rect { x: 0.0, y: 0.0, width: 100.0, height: 100.0 };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self { Self { x, y, width, height } }

    /// Splits the rect in two along `orientation`, giving `ratio` of the space to
    /// the first half.
    pub fn split(self, orientation: Orientation, ratio: f64) -> (Rect, Rect) {
        match orientation {
            Orientation::Horizontal => {
                let first_width = self.width * ratio;
                (
                    Rect { width: first_width, ..self },
                    Rect {
                        x: self.x + first_width,
                        width: self.width - first_width,
                        ..self
                    },
                )
            }
            Orientation::Vertical => {
                let first_height = self.height * ratio;
                (
                    Rect { height: first_height, ..self },
                    Rect {
                        y: self.y + first_height,
                        height: self.height - first_height,
                        ..self
                    },
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        Bounds {
            left: r.x,
            top: r.y,
            right: r.x + r.width,
            bottom: r.y + r.height,
            width: r.width,
            height: r.height,
            center_x: r.x + r.width / 2.0,
            center_y: r.y + r.height / 2.0,
        }
    }
}

impl Bounds {
    /// Start and end of the bounds along `orientation`'s axis.
    pub fn span(&self, orientation: Orientation) -> (f64, f64) {
        match orientation {
            Orientation::Horizontal => (self.left, self.right),
            Orientation::Vertical => (self.top, self.bottom),
        }
    }

    /// Length of the shared projection of two bounds on `orientation`'s axis.
    pub fn overlap(&self, other: &Bounds, orientation: Orientation) -> f64 {
        let (a0, a1) = self.span(orientation);
        let (b0, b1) = other.span(orientation);
        (a1.min(b1) - a0.max(b0)).max(0.0)
    }

    pub fn area(&self) -> f64 { self.width * self.height }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub id: NodeId,
    pub bounds: Bounds,
}

pub fn compute_bounds(node: &Node, available: Rect) -> Vec<WindowBounds> {
    let mut out = Vec::with_capacity(node.leaf_count());
    compute_bounds_into(node, available, &mut out);
    out
}

fn compute_bounds_into(node: &Node, available: Rect, out: &mut Vec<WindowBounds>) {
    match node {
        Node::Window(leaf) => out.push(WindowBounds {
            id: leaf.id,
            bounds: available.into(),
        }),
        Node::Split(split) => {
            let (first, second) = available.split(split.direction, split.split_ratio);
            compute_bounds_into(&split.first, first, out);
            compute_bounds_into(&split.second, second, out);
        }
    }
}

/// Whether `b` touches `a` on the edge of `a` named by `direction`, with a
/// non-empty shared edge.
pub fn is_adjacent(a: &Bounds, b: &Bounds, direction: Direction) -> bool {
    let touching = match direction {
        Direction::Left => (a.left - b.right).abs() < ADJACENCY_TOLERANCE,
        Direction::Right => (a.right - b.left).abs() < ADJACENCY_TOLERANCE,
        Direction::Up => (a.top - b.bottom).abs() < ADJACENCY_TOLERANCE,
        Direction::Down => (a.bottom - b.top).abs() < ADJACENCY_TOLERANCE,
    };
    touching && a.overlap(b, direction.orientation().perpendicular()) > 0.0
}

/// First leaf directly adjacent to `from` in `direction`.
pub fn find_adjacent_window(
    bounds: &[WindowBounds],
    from: NodeId,
    direction: Direction,
) -> Option<NodeId> {
    let current = bounds.iter().find(|wb| wb.id == from)?;
    bounds
        .iter()
        .filter(|wb| wb.id != from)
        .find(|wb| is_adjacent(&current.bounds, &wb.bounds, direction))
        .map(|wb| wb.id)
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self { Self { width, height } }

    pub fn to_pixels(&self, bounds: &Bounds) -> PixelSize {
        PixelSize {
            width: bounds.width * self.width / 100.0,
            height: bounds.height * self.height / 100.0,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self { Self::new(1920.0, 1080.0) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub fn is_below(&self, min: MinimumSize) -> bool {
        self.width < min.width || self.height < min.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimumSize {
    pub width: f64,
    pub height: f64,
}

impl Default for MinimumSize {
    fn default() -> Self { Self { width: 300.0, height: 200.0 } }
}

/// Leaves whose pixel size falls below `min` at the given viewport.
pub fn find_undersized(
    bounds: &[WindowBounds],
    viewport: Viewport,
    min: MinimumSize,
) -> Vec<NodeId> {
    bounds
        .iter()
        .filter(|wb| viewport.to_pixels(&wb.bounds).is_below(min))
        .map(|wb| wb.id)
        .collect()
}
