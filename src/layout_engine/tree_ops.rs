//! Copy-on-write mutators for window trees.
//!
//! Every function takes the current root and returns a new one. Subtrees that
//! an operation does not touch are shared with the input through their `Arc`,
//! so only the path from the root to the changed node is reallocated. A target
//! id that does not exist leaves the tree unchanged.

use std::sync::Arc;

use super::Orientation;
use crate::model::{Node, NodeId, SplitNode, WindowLeaf, clamp_ratio, node::DEFAULT_SPLIT_RATIO};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// One split on the way from the root to a leaf, and which child the walk
/// continued into.
#[derive(Debug, Clone, Copy)]
pub struct PathStep<'a> {
    pub split: &'a SplitNode,
    pub side: Side,
}

/// Rebuilds the leaf matching `target` with `f`, returning `None` when no leaf
/// in `node` matched.
fn rebuild_leaf(
    node: &Arc<Node>,
    target: NodeId,
    f: &mut dyn FnMut(&WindowLeaf) -> Node,
) -> Option<Arc<Node>> {
    match &**node {
        Node::Window(leaf) if leaf.id == target => Some(Arc::new(f(leaf))),
        Node::Window(_) => None,
        Node::Split(split) => {
            if let Some(first) = rebuild_leaf(&split.first, target, f) {
                return Some(Arc::new(Node::Split(SplitNode { first, ..split.clone() })));
            }
            let second = rebuild_leaf(&split.second, target, f)?;
            Some(Arc::new(Node::Split(SplitNode { second, ..split.clone() })))
        }
    }
}

pub fn split_node_by_id(
    root: &Arc<Node>,
    target: NodeId,
    direction: Orientation,
    new_leaf: WindowLeaf,
    split_id: NodeId,
) -> Arc<Node> {
    let mut new_leaf = Some(new_leaf);
    let mut wrap = |leaf: &WindowLeaf| match new_leaf.take() {
        Some(second) => Node::split(
            split_id,
            direction,
            Node::Window(leaf.clone()),
            Node::Window(second),
            DEFAULT_SPLIT_RATIO,
        ),
        None => Node::Window(leaf.clone()),
    };
    rebuild_leaf(root, target, &mut wrap).unwrap_or_else(|| Arc::clone(root))
}

/// Removes the leaf `target`, collapsing its parent split into the sibling.
///
/// Returns `None` only when the root itself was the target, meaning the tree
/// is now empty.
pub fn remove_node_by_id(root: &Arc<Node>, target: NodeId) -> Option<Arc<Node>> {
    match &**root {
        Node::Window(leaf) if leaf.id == target => None,
        _ => Some(remove_below(root, target).unwrap_or_else(|| Arc::clone(root))),
    }
}

fn remove_below(node: &Arc<Node>, target: NodeId) -> Option<Arc<Node>> {
    let Node::Split(split) = &**node else { return None };
    if is_leaf_with_id(&split.first, target) {
        return Some(Arc::clone(&split.second));
    }
    if is_leaf_with_id(&split.second, target) {
        return Some(Arc::clone(&split.first));
    }
    if let Some(first) = remove_below(&split.first, target) {
        return Some(Arc::new(Node::Split(SplitNode { first, ..split.clone() })));
    }
    let second = remove_below(&split.second, target)?;
    Some(Arc::new(Node::Split(SplitNode { second, ..split.clone() })))
}

fn is_leaf_with_id(node: &Node, id: NodeId) -> bool {
    matches!(node, Node::Window(leaf) if leaf.id == id)
}

/// Depth-first lookup restricted to leaves; split ids never match.
pub fn find_node_by_id(root: &Node, target: NodeId) -> Option<&WindowLeaf> {
    match root {
        Node::Window(leaf) => (leaf.id == target).then_some(leaf),
        Node::Split(split) => find_node_by_id(&split.first, target)
            .or_else(|| find_node_by_id(&split.second, target)),
    }
}

pub fn find_all_window_ids(root: Option<&Node>) -> Vec<NodeId> {
    let mut ids = Vec::new();
    if let Some(root) = root {
        collect_ids(root, &mut ids);
    }
    ids
}

fn collect_ids(node: &Node, out: &mut Vec<NodeId>) {
    match node {
        Node::Window(leaf) => out.push(leaf.id),
        Node::Split(split) => {
            collect_ids(&split.first, out);
            collect_ids(&split.second, out);
        }
    }
}

pub fn first_leaf(node: &Node) -> &WindowLeaf {
    match node {
        Node::Window(leaf) => leaf,
        Node::Split(split) => first_leaf(&split.first),
    }
}

/// Sets the ratio of the split whose own id is `split_id`, clamped to the
/// allowed range.
pub fn update_split_ratio(root: &Arc<Node>, split_id: NodeId, ratio: f64) -> Arc<Node> {
    update_split(root, split_id, &mut |_: f64| clamp_ratio(ratio)).unwrap_or_else(|| Arc::clone(root))
}

/// Rewrites a split's ratio through `f`; the result is clamped.
pub(crate) fn update_split(
    node: &Arc<Node>,
    split_id: NodeId,
    f: &mut dyn FnMut(f64) -> f64,
) -> Option<Arc<Node>> {
    let Node::Split(split) = &**node else { return None };
    if split.id == split_id {
        return Some(Arc::new(Node::Split(SplitNode {
            split_ratio: clamp_ratio(f(split.split_ratio)),
            ..split.clone()
        })));
    }
    if let Some(first) = update_split(&split.first, split_id, f) {
        return Some(Arc::new(Node::Split(SplitNode { first, ..split.clone() })));
    }
    let second = update_split(&split.second, split_id, f)?;
    Some(Arc::new(Node::Split(SplitNode { second, ..split.clone() })))
}

/// For a leaf that is a direct child of a split, the first leaf of the other
/// child.
pub fn find_sibling_window_id(root: &Node, target: NodeId) -> Option<NodeId> {
    let Node::Split(split) = root else { return None };
    if is_leaf_with_id(&split.first, target) {
        return Some(first_leaf(&split.second).id);
    }
    if is_leaf_with_id(&split.second, target) {
        return Some(first_leaf(&split.first).id);
    }
    find_sibling_window_id(&split.first, target)
        .or_else(|| find_sibling_window_id(&split.second, target))
}

/// Replaces the leaf `target` with whatever `f` builds from it. The id is kept
/// by convention of the callers; this function does not enforce it.
pub fn update_leaf(
    root: &Arc<Node>,
    target: NodeId,
    f: impl FnOnce(&WindowLeaf) -> WindowLeaf,
) -> Arc<Node> {
    let mut f = Some(f);
    let mut apply = |leaf: &WindowLeaf| match f.take() {
        Some(f) => Node::Window(f(leaf)),
        None => Node::Window(leaf.clone()),
    };
    rebuild_leaf(root, target, &mut apply).unwrap_or_else(|| Arc::clone(root))
}

/// Splits from the root down to the leaf `target`, outermost first.
pub fn path_to(root: &Node, target: NodeId) -> Option<Vec<PathStep<'_>>> {
    let mut path = Vec::new();
    walk_path(root, target, &mut path).then_some(path)
}

fn walk_path<'a>(node: &'a Node, target: NodeId, path: &mut Vec<PathStep<'a>>) -> bool {
    match node {
        Node::Window(leaf) => leaf.id == target,
        Node::Split(split) => {
            for (child, side) in [(&split.first, Side::First), (&split.second, Side::Second)] {
                path.push(PathStep { split, side });
                if walk_path(child, target, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WindowType;

    fn id(raw: u64) -> NodeId { NodeId::new(raw) }

    fn leaf(raw: u64) -> Node { Node::leaf(id(raw), WindowType::Terminal) }

    fn new_leaf(raw: u64) -> WindowLeaf { WindowLeaf::new(id(raw), WindowType::Editor) }

    fn ids(root: &Node) -> Vec<u64> {
        find_all_window_ids(Some(root)).into_iter().map(NodeId::get).collect()
    }

    /// split(h, 1, split(v, 2, 3))
    fn sample() -> Arc<Node> {
        Arc::new(Node::split(
            id(10),
            Orientation::Horizontal,
            leaf(1),
            Node::split(id(11), Orientation::Vertical, leaf(2), leaf(3), 0.5),
            0.5,
        ))
    }

    mod split {
        use super::*;

        #[test]
        fn splits_single_leaf() {
            let root = Arc::new(leaf(1));
            let out = split_node_by_id(&root, id(1), Orientation::Vertical, new_leaf(2), id(5));
            let Node::Split(split) = &*out else { panic!("expected split") };
            pretty_assertions::assert_eq!(split.id, id(5));
            pretty_assertions::assert_eq!(split.direction, Orientation::Vertical);
            pretty_assertions::assert_eq!(split.split_ratio, 0.5);
            pretty_assertions::assert_eq!(split.first.id(), id(1));
            pretty_assertions::assert_eq!(split.second.id(), id(2));
        }

        #[test]
        fn splits_nested_leaf_and_shares_untouched_subtree() {
            let root = sample();
            let out = split_node_by_id(&root, id(3), Orientation::Horizontal, new_leaf(4), id(12));
            pretty_assertions::assert_eq!(ids(&out), vec![1, 2, 3, 4]);

            let (Node::Split(before), Node::Split(after)) = (&*root, &*out) else {
                panic!("expected splits")
            };
            assert!(Arc::ptr_eq(&before.first, &after.first));
        }

        #[test]
        fn missing_target_returns_same_tree() {
            let root = sample();
            let out = split_node_by_id(&root, id(99), Orientation::Horizontal, new_leaf(4), id(12));
            assert!(Arc::ptr_eq(&root, &out));
        }

        #[test]
        fn split_ids_are_not_split_targets() {
            let root = sample();
            let out = split_node_by_id(&root, id(11), Orientation::Horizontal, new_leaf(4), id(12));
            assert!(Arc::ptr_eq(&root, &out));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn removing_root_leaf_empties_tree() {
            assert!(remove_node_by_id(&Arc::new(leaf(1)), id(1)).is_none());
        }

        #[test]
        fn removing_direct_child_returns_sibling() {
            let root = Arc::new(Node::split(id(10), Orientation::Horizontal, leaf(1), leaf(2), 0.5));
            let out = remove_node_by_id(&root, id(1)).unwrap();
            pretty_assertions::assert_eq!(*out, leaf(2));
        }

        #[test]
        fn removing_nested_leaf_collapses_parent() {
            let root = sample();
            let out = remove_node_by_id(&root, id(2)).unwrap();
            let Node::Split(split) = &*out else { panic!("expected split") };
            pretty_assertions::assert_eq!(split.id, id(10));
            pretty_assertions::assert_eq!(*split.second, leaf(3));
        }

        #[test]
        fn removing_missing_leaf_is_noop() {
            let root = sample();
            let out = remove_node_by_id(&root, id(99)).unwrap();
            assert!(Arc::ptr_eq(&root, &out));
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn find_node_only_matches_leaves() {
            let root = sample();
            pretty_assertions::assert_eq!(find_node_by_id(&root, id(3)).map(|l| l.id), Some(id(3)));
            assert!(find_node_by_id(&root, id(11)).is_none());
        }

        #[test]
        fn window_ids_are_pre_order() {
            pretty_assertions::assert_eq!(ids(&sample()), vec![1, 2, 3]);
            assert!(find_all_window_ids(None).is_empty());
        }

        #[test]
        fn sibling_is_first_leaf_of_other_child() {
            let root = sample();
            pretty_assertions::assert_eq!(find_sibling_window_id(&root, id(1)), Some(id(2)));
            pretty_assertions::assert_eq!(find_sibling_window_id(&root, id(3)), Some(id(2)));
            pretty_assertions::assert_eq!(find_sibling_window_id(&root, id(2)), Some(id(3)));
            pretty_assertions::assert_eq!(find_sibling_window_id(&leaf(1), id(1)), None);
        }

        #[test]
        fn path_to_records_sides() {
            let root = sample();
            let path = path_to(&root, id(3)).unwrap();
            let steps: Vec<_> = path.iter().map(|s| (s.split.id.get(), s.side)).collect();
            pretty_assertions::assert_eq!(steps, vec![(10, Side::Second), (11, Side::Second)]);
            assert!(path_to(&root, id(99)).is_none());
            assert!(path_to(&leaf(1), id(1)).unwrap().is_empty());
        }
    }

    mod ratio {
        use super::*;

        #[test]
        fn update_split_ratio_clamps_and_copies() {
            let root = sample();
            let out = update_split_ratio(&root, id(11), 0.95);
            let Node::Split(outer) = &*out else { panic!("expected split") };
            let Node::Split(inner) = &*outer.second else { panic!("expected split") };
            pretty_assertions::assert_eq!(inner.split_ratio, 0.9);

            let Node::Split(original) = &*root else { panic!("expected split") };
            let Node::Split(original_inner) = &*original.second else { panic!("expected split") };
            pretty_assertions::assert_eq!(original_inner.split_ratio, 0.5);
        }

        #[test]
        fn update_split_ratio_ignores_leaf_ids() {
            let root = sample();
            assert!(Arc::ptr_eq(&root, &update_split_ratio(&root, id(1), 0.3)));
        }
    }

    #[test]
    fn update_leaf_replaces_content() {
        let root = sample();
        let out = update_leaf(&root, id(2), |leaf| WindowLeaf::new(leaf.id, WindowType::Dice));
        pretty_assertions::assert_eq!(find_node_by_id(&out, id(2)).unwrap().window_type, WindowType::Dice);
        pretty_assertions::assert_eq!(find_node_by_id(&root, id(2)).unwrap().window_type, WindowType::Terminal);
    }
}
