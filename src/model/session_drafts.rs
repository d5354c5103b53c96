use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::model::NodeId;

/// Unsaved per-window drafts that live only for the current session.
///
/// Drafts are keyed by the leaf that owns them and never persisted. Cloning
/// shares the underlying map.
#[derive(Clone, Default, Debug)]
pub struct SessionDrafts(Arc<DashMap<NodeId, Value>>);

impl SessionDrafts {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, id: NodeId, draft: Value) { self.0.insert(id, draft); }

    pub fn get(&self, id: NodeId) -> Option<Value> { self.0.get(&id).map(|entry| entry.clone()) }

    pub fn remove(&self, id: NodeId) -> Option<Value> { self.0.remove(&id).map(|(_, draft)| draft) }

    /// Exchanges the drafts of two windows. A window without a draft hands an
    /// absence over to the other side.
    pub fn swap(&self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let draft_a = self.remove(a);
        let draft_b = self.remove(b);
        if let Some(draft) = draft_a {
            self.insert(b, draft);
        }
        if let Some(draft) = draft_b {
            self.insert(a, draft);
        }
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_session_drafts_insert_get_remove() {
        let drafts = SessionDrafts::new();
        let id = NodeId::new(1);
        drafts.insert(id, json!("draft"));
        assert_eq!(drafts.get(id), Some(json!("draft")));
        assert_eq!(drafts.remove(id), Some(json!("draft")));
        assert!(drafts.get(id).is_none());
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_session_drafts_swap_moves_both_sides() {
        let drafts = SessionDrafts::new();
        let (a, b) = (NodeId::new(1), NodeId::new(2));
        drafts.insert(a, json!("a"));
        drafts.insert(b, json!("b"));
        drafts.swap(a, b);
        assert_eq!(drafts.get(a), Some(json!("b")));
        assert_eq!(drafts.get(b), Some(json!("a")));
    }

    #[test]
    fn test_session_drafts_swap_with_missing_side() {
        let drafts = SessionDrafts::new();
        let (a, b) = (NodeId::new(1), NodeId::new(2));
        drafts.insert(a, json!("only"));
        drafts.swap(a, b);
        assert!(drafts.get(a).is_none());
        assert_eq!(drafts.get(b), Some(json!("only")));
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_session_drafts_clones_share_state() {
        let drafts = SessionDrafts::new();
        let other = drafts.clone();
        other.insert(NodeId::new(3), json!(3));
        assert_eq!(drafts.get(NodeId::new(3)), Some(json!(3)));
    }
}
