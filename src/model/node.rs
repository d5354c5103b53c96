use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout_engine::Orientation;
use crate::model::WindowType;

/// Smallest ratio a split may hold; keeps either child from collapsing.
pub const MIN_SPLIT_RATIO: f64 = 0.1;
pub const MAX_SPLIT_RATIO: f64 = 0.9;
pub const DEFAULT_SPLIT_RATIO: f64 = 0.5;

/// Largest id the allocator hands out or trusts from outside. Restored ids
/// above it are reassigned.
pub const MAX_NODE_ID: u64 = (1 << 53) - 1;

pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return DEFAULT_SPLIT_RATIO;
    }
    ratio.clamp(MIN_SPLIT_RATIO, MAX_SPLIT_RATIO)
}

/// Identifier shared by window leaves and split nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self { Self(raw) }

    pub const fn get(self) -> u64 { self.0 }

    pub const fn in_range(self) -> bool { self.0 <= MAX_NODE_ID }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(NodeId) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowLeaf {
    pub id: NodeId,
    pub window_type: WindowType,
    #[serde(default)]
    pub state: Value,
}

impl WindowLeaf {
    pub fn new(id: NodeId, window_type: WindowType) -> Self {
        Self {
            id,
            window_type,
            state: window_type.default_state(),
        }
    }

    pub fn with_state(id: NodeId, window_type: WindowType, state: Value) -> Self {
        Self { id, window_type, state }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitNode {
    pub id: NodeId,
    pub direction: Orientation,
    pub first: Arc<Node>,
    pub second: Arc<Node>,
    pub split_ratio: f64,
}

/// Element of a window tree.
///
/// Children are held behind `Arc` so that operations which rebuild one path
/// of the tree share every untouched subtree with the previous version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Window(WindowLeaf),
    Split(SplitNode),
}

impl Node {
    pub fn leaf(id: NodeId, window_type: WindowType) -> Self {
        Node::Window(WindowLeaf::new(id, window_type))
    }

    pub fn split(
        id: NodeId,
        direction: Orientation,
        first: impl Into<Arc<Node>>,
        second: impl Into<Arc<Node>>,
        split_ratio: f64,
    ) -> Self {
        Node::Split(SplitNode {
            id,
            direction,
            first: first.into(),
            second: second.into(),
            split_ratio: clamp_ratio(split_ratio),
        })
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Window(leaf) => leaf.id,
            Node::Split(split) => split.id,
        }
    }

    pub fn as_leaf(&self) -> Option<&WindowLeaf> {
        match self {
            Node::Window(leaf) => Some(leaf),
            Node::Split(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool { matches!(self, Node::Window(_)) }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Window(_) => 1,
            Node::Split(split) => split.first.leaf_count() + split.second.leaf_count(),
        }
    }

    /// Largest id used anywhere in the tree, splits included.
    pub fn max_id(&self) -> NodeId {
        match self {
            Node::Window(leaf) => leaf.id,
            Node::Split(split) => split.id.max(split.first.max_id()).max(split.second.max_id()),
        }
    }
}

/// Hands out fresh node ids.
///
/// Ids follow the wall clock in milliseconds but are strictly increasing even
/// when several are requested within the same millisecond.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new() -> Self { Self::default() }

    /// Allocator that never returns an id at or below `floor`. Out-of-range
    /// floors are capped at [`MAX_NODE_ID`].
    pub fn above(floor: NodeId) -> Self { Self { last: floor.get().min(MAX_NODE_ID) } }

    pub fn next(&mut self) -> NodeId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last = now.max(self.last.saturating_add(1));
        NodeId(self.last)
    }

    /// Ids outside the allocatable range are ignored.
    pub fn observe(&mut self, id: NodeId) {
        if id.in_range() {
            self.last = self.last.max(id.get());
        }
    }
}
