use std::sync::Arc;

use tracing::trace;

use super::tree_ops::{self, Side};
use super::Direction;
use crate::model::{Node, NodeId};

pub const DEFAULT_RESIZE_STEP: f64 = 0.05;

/// Direction a resize request acts in for one split.
///
/// The request is flipped once when the active leaf lives in the split's
/// second child and once more when the split itself lies in the second child
/// of its nearest ancestor split along the same axis. Two flips cancel.
pub fn effective_direction(
    direction: Direction,
    is_second_child: bool,
    ancestor_side: bool,
) -> Direction {
    let mut effective = direction;
    if is_second_child {
        effective = effective.opposite();
    }
    if ancestor_side {
        effective = effective.opposite();
    }
    effective
}

/// Signed ratio change for one step in `direction`.
pub fn ratio_delta(direction: Direction, step: f64) -> f64 {
    if direction.is_forward() { step } else { -step }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioChange {
    pub split: NodeId,
    pub from: f64,
    pub delta: f64,
}

/// Ratio changes for every split on the path to `active` whose axis matches
/// `direction`. Empty when the leaf is missing or no split matches.
pub fn plan_resize(root: &Node, active: NodeId, direction: Direction, step: f64) -> Vec<RatioChange> {
    let Some(path) = tree_ops::path_to(root, active) else { return Vec::new() };
    let axis = direction.orientation();

    let mut changes = Vec::new();
    let mut nearest_same_axis: Option<Side> = None;
    for step_on_path in &path {
        let split = step_on_path.split;
        if split.direction != axis {
            continue;
        }
        let is_second_child = step_on_path.side == Side::Second;
        let ancestor_side = nearest_same_axis == Some(Side::Second);
        let effective = effective_direction(direction, is_second_child, ancestor_side);
        trace!(
            split = %split.id,
            is_second_child,
            ancestor_side,
            %effective,
            "resize step"
        );
        changes.push(RatioChange {
            split: split.id,
            from: split.split_ratio,
            delta: ratio_delta(effective, step),
        });
        nearest_same_axis = Some(step_on_path.side);
    }
    changes
}

/// Applies a plan, clamping each ratio. Returns `None` if nothing changed.
pub fn apply_resize(root: &Arc<Node>, changes: &[RatioChange]) -> Option<Arc<Node>> {
    let mut out = Arc::clone(root);
    for change in changes {
        if let Some(updated) = tree_ops::update_split(&out, change.split, &mut |r: f64| r + change.delta) {
            out = updated;
        }
    }
    (!changes.is_empty()).then_some(out)
}
