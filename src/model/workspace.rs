use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::common::collections::HashSet;
use crate::common::config::WorkspaceSettings;
use crate::layout_engine::tree_ops;
use crate::model::{IdAllocator, Node, NodeId, SplitNode, WindowLeaf, clamp_ratio};
use crate::storage::{Bucket, Record, Storage};

/// Record id under which the active workspace index is stored.
pub const ACTIVE_WORKSPACE_RECORD: u64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: usize,
    pub name: String,
    #[serde(default)]
    pub root: Option<Arc<Node>>,
    #[serde(default)]
    pub active_node_id: Option<NodeId>,
    #[serde(default)]
    pub terminal_states: BTreeMap<NodeId, Value>,
}

impl Workspace {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            root: None,
            active_node_id: None,
            terminal_states: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool { self.root.is_none() }

    pub fn window_ids(&self) -> Vec<NodeId> { tree_ops::find_all_window_ids(self.root.as_deref()) }

    pub fn contains_window(&self, id: NodeId) -> bool {
        self.root.as_deref().and_then(|root| tree_ops::find_node_by_id(root, id)).is_some()
    }

    /// Restores the focus invariant: no focus on an empty tree, and a focused
    /// id that names an existing leaf otherwise. Terminal states of leaves
    /// that no longer exist are dropped. Returns whether anything changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;
        match self.root.as_deref() {
            None => {
                changed |= self.active_node_id.take().is_some();
            }
            Some(root) => {
                let valid = self
                    .active_node_id
                    .is_some_and(|id| tree_ops::find_node_by_id(root, id).is_some());
                if !valid {
                    let first = tree_ops::first_leaf(root).id;
                    debug!(workspace = self.id, from = ?self.active_node_id, to = %first, "repairing focus");
                    self.active_node_id = Some(first);
                    changed = true;
                }
            }
        }
        let before = self.terminal_states.len();
        let ids = self.window_ids();
        self.terminal_states.retain(|id, _| ids.contains(id));
        changed || before != self.terminal_states.len()
    }

    /// Brings a tree read from outside back within the model's invariants:
    /// split ratios are clamped, and any node whose id is out of range or
    /// already in `seen` gets a fresh id from `ids`. Unchanged subtrees are
    /// shared. Returns whether anything changed.
    pub fn normalize_tree(&mut self, seen: &mut HashSet<NodeId>, ids: &mut IdAllocator) -> bool {
        let Some(root) = self.root.clone() else { return false };
        let mut renamed = Vec::new();
        let normalized = normalize_node(&root, seen, ids, &mut renamed);
        if Arc::ptr_eq(&normalized, &root) {
            return false;
        }

        warn!(workspace = self.id, ?renamed, "normalized restored window tree");
        for &(old, new) in &renamed {
            // a single out-of-range leaf keeps its focus and terminal state
            if old.in_range() {
                continue;
            }
            if let Some(state) = self.terminal_states.remove(&old) {
                self.terminal_states.insert(new, state);
            }
            if self.active_node_id == Some(old) {
                self.active_node_id = Some(new);
            }
        }
        self.root = Some(normalized);
        true
    }
}

fn claim_id(
    id: NodeId,
    seen: &mut HashSet<NodeId>,
    ids: &mut IdAllocator,
    renamed: &mut Vec<(NodeId, NodeId)>,
) -> NodeId {
    if id.in_range() && seen.insert(id) {
        return id;
    }
    let fresh = ids.next();
    seen.insert(fresh);
    renamed.push((id, fresh));
    fresh
}

fn normalize_node(
    node: &Arc<Node>,
    seen: &mut HashSet<NodeId>,
    ids: &mut IdAllocator,
    renamed: &mut Vec<(NodeId, NodeId)>,
) -> Arc<Node> {
    match &**node {
        Node::Window(leaf) => {
            let id = claim_id(leaf.id, seen, ids, renamed);
            if id == leaf.id {
                return Arc::clone(node);
            }
            Arc::new(Node::Window(WindowLeaf { id, ..leaf.clone() }))
        }
        Node::Split(split) => {
            let id = claim_id(split.id, seen, ids, renamed);
            let first = normalize_node(&split.first, seen, ids, renamed);
            let second = normalize_node(&split.second, seen, ids, renamed);
            let split_ratio = clamp_ratio(split.split_ratio);
            let unchanged = id == split.id
                && split_ratio.to_bits() == split.split_ratio.to_bits()
                && Arc::ptr_eq(&first, &split.first)
                && Arc::ptr_eq(&second, &split.second);
            if unchanged {
                return Arc::clone(node);
            }
            Arc::new(Node::Split(SplitNode {
                id,
                direction: split.direction,
                first,
                second,
                split_ratio,
            }))
        }
    }
}

fn max_id_in_range(node: &Node) -> Option<NodeId> {
    match node {
        Node::Window(leaf) => Some(leaf.id).filter(|id| id.in_range()),
        Node::Split(split) => [
            Some(split.id).filter(|id| id.in_range()),
            max_id_in_range(&split.first),
            max_id_in_range(&split.second),
        ]
        .into_iter()
        .flatten()
        .max(),
    }
}

/// Full persisted state of every workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub workspaces: Vec<Workspace>,
    pub active: usize,
}

impl WorkspaceSnapshot {
    pub async fn write<S: Storage>(&self, storage: &S) -> anyhow::Result<()> {
        for (index, workspace) in self.workspaces.iter().enumerate() {
            let data = serde_json::to_value(workspace)?;
            storage
                .put(Bucket::Workspaces, Record::new(index as u64, data))
                .await
                .with_context(|| format!("writing workspace {index}"))?;
        }
        storage
            .put(
                Bucket::ActiveWindow,
                Record::new(ACTIVE_WORKSPACE_RECORD, json!(self.active)),
            )
            .await
            .context("writing active workspace")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceStore {
    workspaces: Vec<Workspace>,
    active: usize,
}

fn default_name(settings: &WorkspaceSettings, index: usize) -> String {
    settings.names.get(index).cloned().unwrap_or_else(|| format!("Workspace {}", index + 1))
}

impl WorkspaceStore {
    pub fn new(settings: &WorkspaceSettings) -> Self {
        let count = settings.count.max(1);
        let workspaces = (0..count).map(|i| Workspace::new(i, default_name(settings, i))).collect();
        Self { workspaces, active: 0 }
    }

    pub fn from_snapshot(snapshot: WorkspaceSnapshot, settings: &WorkspaceSettings) -> Self {
        let count = settings.count.max(1);
        let mut workspaces = snapshot.workspaces;
        workspaces.truncate(count);

        let floor = workspaces
            .iter()
            .filter_map(|w| w.root.as_deref())
            .filter_map(max_id_in_range)
            .max();
        let mut ids = floor.map(IdAllocator::above).unwrap_or_default();
        let mut seen = HashSet::default();
        for (index, workspace) in workspaces.iter_mut().enumerate() {
            workspace.id = index;
            workspace.normalize_tree(&mut seen, &mut ids);
            workspace.repair();
        }
        while workspaces.len() < count {
            let index = workspaces.len();
            workspaces.push(Workspace::new(index, default_name(settings, index)));
        }
        let active = if snapshot.active < count { snapshot.active } else { 0 };
        Self { workspaces, active }
    }

    /// Loads every workspace from `storage`, falling back to fresh workspaces
    /// for anything missing or unreadable.
    pub async fn restore<S: Storage>(storage: &S, settings: &WorkspaceSettings) -> Self {
        let count = settings.count.max(1);
        let records = match storage.get_all(Bucket::Workspaces).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to load workspaces, starting fresh: {e}");
                return Self::new(settings);
            }
        };

        let mut slots: Vec<Option<Workspace>> = vec![None; count];
        for record in records {
            let Some(slot) = slots.get_mut(record.id as usize) else {
                debug!(id = record.id, "ignoring workspace beyond configured count");
                continue;
            };
            match serde_json::from_value::<Workspace>(record.data) {
                Ok(workspace) => *slot = Some(workspace),
                Err(e) => warn!(id = record.id, "Skipping unreadable workspace record: {e}"),
            }
        }

        let active = match storage.get(Bucket::ActiveWindow, ACTIVE_WORKSPACE_RECORD).await {
            Ok(record) => record.and_then(|r| r.data.as_u64()).unwrap_or(0) as usize,
            Err(e) => {
                warn!("Failed to load active workspace: {e}");
                0
            }
        };

        let workspaces = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.unwrap_or_else(|| Workspace::new(i, default_name(settings, i))))
            .collect();
        let store = Self::from_snapshot(WorkspaceSnapshot { workspaces, active }, settings);
        info!(
            workspaces = store.len(),
            active = store.active,
            windows = store.workspaces.iter().map(|w| w.window_ids().len()).sum::<usize>(),
            "restored workspaces"
        );
        store
    }

    pub fn len(&self) -> usize { self.workspaces.len() }

    pub fn is_empty(&self) -> bool { self.workspaces.is_empty() }

    pub fn workspaces(&self) -> &[Workspace] { &self.workspaces }

    pub fn get(&self, index: usize) -> Option<&Workspace> { self.workspaces.get(index) }

    pub fn active_index(&self) -> usize { self.active }

    pub fn active(&self) -> &Workspace { &self.workspaces[self.active] }

    pub fn active_mut(&mut self) -> &mut Workspace { &mut self.workspaces[self.active] }

    pub fn switch_to(&mut self, index: usize) -> bool {
        if index >= self.workspaces.len() || index == self.active {
            return false;
        }
        self.active = index;
        true
    }

    /// Largest node id in any workspace, for seeding id allocation.
    pub fn max_node_id(&self) -> Option<NodeId> {
        self.workspaces.iter().filter_map(|w| w.root.as_deref()).map(Node::max_id).max()
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            workspaces: self.workspaces.clone(),
            active: self.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::layout_engine::{Orientation, Rect, compute_bounds};
    use crate::model::WindowType;
    use crate::storage::MemoryStorage;

    fn settings(count: usize) -> WorkspaceSettings {
        WorkspaceSettings {
            count,
            names: vec!["Main".into()],
        }
    }

    fn populated(id: usize) -> Workspace {
        let mut ws = Workspace::new(id, "Main");
        ws.root = Some(Arc::new(Node::split(
            NodeId::new(10),
            Orientation::Horizontal,
            Node::leaf(NodeId::new(1), WindowType::Terminal),
            Node::leaf(NodeId::new(2), WindowType::Explorer),
            0.5,
        )));
        ws.active_node_id = Some(NodeId::new(2));
        ws
    }

    #[test]
    fn new_store_uses_configured_and_default_names() {
        let store = WorkspaceStore::new(&settings(3));
        let names: Vec<_> = store.workspaces().iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Workspace 2", "Workspace 3"]);
        assert_eq!(store.active_index(), 0);
        assert!(store.active().is_empty());
    }

    #[test]
    fn switch_rejects_out_of_range() {
        let mut store = WorkspaceStore::new(&settings(2));
        assert!(store.switch_to(1));
        assert!(!store.switch_to(1));
        assert!(!store.switch_to(2));
        assert_eq!(store.active_index(), 1);
    }

    #[test]
    fn repair_fixes_dangling_focus_and_stale_terminal_states() {
        let mut ws = populated(0);
        ws.active_node_id = Some(NodeId::new(99));
        ws.terminal_states.insert(NodeId::new(1), json!({ "history": [] }));
        ws.terminal_states.insert(NodeId::new(42), json!({}));
        assert!(ws.repair());
        assert_eq!(ws.active_node_id, Some(NodeId::new(1)));
        assert_eq!(ws.terminal_states.keys().copied().collect::<Vec<_>>(), vec![NodeId::new(1)]);
        assert!(!ws.repair());

        let mut empty = Workspace::new(1, "Empty");
        empty.active_node_id = Some(NodeId::new(5));
        assert!(empty.repair());
        assert_eq!(empty.active_node_id, None);
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let mut store = WorkspaceStore::new(&settings(4));
        *store.active_mut() = populated(0);
        store.switch_to(2);
        store.snapshot().write(&storage).await.unwrap();

        let restored = WorkspaceStore::restore(&storage, &settings(4)).await;
        assert_eq!(restored, store);
        assert_eq!(restored.max_node_id(), Some(NodeId::new(10)));
    }

    #[tokio::test]
    async fn restore_skips_bad_records_and_pads() {
        let storage = MemoryStorage::new();
        storage
            .put(Bucket::Workspaces, Record::new(0, serde_json::to_value(populated(0)).unwrap()))
            .await
            .unwrap();
        storage.put(Bucket::Workspaces, Record::new(1, json!("garbage"))).await.unwrap();
        storage
            .put(Bucket::Workspaces, Record::new(9, serde_json::to_value(populated(9)).unwrap()))
            .await
            .unwrap();
        storage.put(Bucket::ActiveWindow, Record::new(0, json!(7))).await.unwrap();

        let store = WorkspaceStore::restore(&storage, &settings(3)).await;
        assert_eq!(store.len(), 3);
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.get(0).unwrap().window_ids().len(), 2);
        assert!(store.get(1).unwrap().is_empty());
        assert_eq!(store.get(1).unwrap().name, "Workspace 2");
    }

    #[tokio::test]
    async fn restore_clamps_ratios_and_reassigns_duplicate_ids() {
        let storage = MemoryStorage::new();
        let record = json!({
            "id": 0,
            "name": "Main",
            "root": {
                "type": "split",
                "id": 10,
                "direction": "horizontal",
                "splitRatio": 1.5,
                "first": { "type": "window", "id": 1, "windowType": "terminal" },
                "second": { "type": "window", "id": 1, "windowType": "explorer" },
            },
            "activeNodeId": 1,
        });
        storage.put(Bucket::Workspaces, Record::new(0, record)).await.unwrap();

        let store = WorkspaceStore::restore(&storage, &settings(1)).await;
        let ws = store.active();
        let Some(Node::Split(split)) = ws.root.as_deref() else { panic!("expected split root") };
        assert_eq!(split.split_ratio, 0.9);

        let ids = ws.window_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], NodeId::new(1));
        assert!(ids[1] > NodeId::new(10));
        assert_eq!(ws.active_node_id, Some(NodeId::new(1)));

        let bounds = compute_bounds(ws.root.as_deref().unwrap(), Rect::FULL);
        let widths: Vec<_> = bounds.iter().map(|wb| wb.bounds.width).collect();
        assert!(widths.iter().all(|&w| w > 0.0));
        assert!((widths.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_moves_out_of_range_ids_and_their_state() {
        let mut ws = Workspace::new(0, "Main");
        let huge = NodeId::new(u64::MAX);
        ws.root = Some(Arc::new(Node::leaf(huge, WindowType::Terminal)));
        ws.active_node_id = Some(huge);
        ws.terminal_states.insert(huge, json!({ "input": "ls" }));

        let mut ids = IdAllocator::new();
        assert!(ws.normalize_tree(&mut HashSet::default(), &mut ids));
        let id = ws.window_ids()[0];
        assert!(id.in_range());
        assert_eq!(ws.active_node_id, Some(id));
        assert_eq!(ws.terminal_states.get(&id), Some(&json!({ "input": "ls" })));
    }

    #[test]
    fn normalize_leaves_valid_tree_shared() {
        let mut ws = populated(0);
        let before = ws.root.clone().unwrap();
        assert!(!ws.normalize_tree(&mut HashSet::default(), &mut IdAllocator::new()));
        assert!(Arc::ptr_eq(&before, ws.root.as_ref().unwrap()));
    }

    #[tokio::test]
    async fn restore_falls_back_when_storage_fails() {
        let storage = MemoryStorage::new();
        storage.set_unavailable(true);
        let store = WorkspaceStore::restore(&storage, &settings(2)).await;
        assert_eq!(store, WorkspaceStore::new(&settings(2)));
    }
}
