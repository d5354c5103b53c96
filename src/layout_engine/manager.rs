//! The stateful core that owns every workspace tree.
//!
//! Each operation builds a new tree through the pure mutators, checks it
//! against the geometry where policy requires, and then commits it to the
//! active workspace in one step. A commit schedules a debounced snapshot
//! write when a [`Persister`] is attached.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::geometry::{
    MinimumSize, Rect, Viewport, WindowBounds, compute_bounds, find_undersized,
};
use super::resize::{apply_resize, plan_resize};
use super::{Direction, Orientation, navigation, tree_ops};
use crate::common::config::{Config, LayoutSettings};
use crate::model::window_type::{TERMINAL_WELCOME, terminal_state};
use crate::model::{
    IdAllocator, Node, NodeId, SessionDrafts, WindowLeaf, WindowType, Workspace, WorkspaceStore,
};
use crate::storage::{Bucket, Persister, Record, Storage, StorageResult};
use crate::terminal::WindowControl;

/// Called with the id of a leaf that should flash to signal a refused
/// operation.
pub type FlashHandler = Box<dyn FnMut(NodeId) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    Applied { new_leaf: NodeId, split: NodeId },
    /// The split would have left these leaves below the minimum size.
    Refused { undersized: Vec<NodeId> },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(NodeId),
    Refused { undersized: Vec<NodeId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Resize mode is off.
    Disabled,
    NoActiveWindow,
    /// No split on the path to the active leaf runs along the requested axis.
    Unchanged,
    Applied { splits: usize, undersized: Vec<NodeId> },
}

pub struct WindowManager {
    store: WorkspaceStore,
    layout: LayoutSettings,
    viewport: Viewport,
    ids: IdAllocator,
    welcome: String,
    resize_mode: bool,
    drafts: SessionDrafts,
    flash: Option<FlashHandler>,
    persister: Option<Persister>,
}

static_assertions::assert_impl_all!(WindowManager: Send);

impl WindowManager {
    pub fn new(config: &Config) -> Self {
        Self::with_store(WorkspaceStore::new(&config.workspaces), config.layout.clone())
            .with_welcome(config.terminal.welcome.clone())
    }

    pub fn with_store(store: WorkspaceStore, layout: LayoutSettings) -> Self {
        let ids = store.max_node_id().map(IdAllocator::above).unwrap_or_default();
        Self {
            viewport: layout.viewport(),
            store,
            layout,
            ids,
            welcome: TERMINAL_WELCOME.to_string(),
            resize_mode: false,
            drafts: SessionDrafts::new(),
            flash: None,
            persister: None,
        }
    }

    /// Greeting shown in the output of every terminal this manager creates.
    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = welcome.into();
        self
    }

    pub fn store(&self) -> &WorkspaceStore { &self.store }

    pub fn workspace(&self) -> &Workspace { self.store.active() }

    pub fn active_window(&self) -> Option<NodeId> { self.workspace().active_node_id }

    pub fn window(&self, id: NodeId) -> Option<&WindowLeaf> {
        tree_ops::find_node_by_id(self.workspace().root.as_deref()?, id)
    }

    pub fn drafts(&self) -> &SessionDrafts { &self.drafts }

    pub fn viewport(&self) -> Viewport { self.viewport }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        debug!(width = viewport.width, height = viewport.height, "viewport changed");
        self.viewport = viewport;
    }

    pub fn set_flash_handler(&mut self, handler: impl FnMut(NodeId) + Send + 'static) {
        self.flash = Some(Box::new(handler));
    }

    pub fn attach_persister(&mut self, persister: Persister) { self.persister = Some(persister); }

    /// Stops the background writer, dropping any write still pending.
    pub async fn detach_persister(&mut self) {
        if let Some(persister) = self.persister.take() {
            persister.shutdown().await;
        }
    }

    /// Writes every workspace now, bypassing the debounce.
    pub async fn save<S: Storage>(&self, storage: &S) -> anyhow::Result<()> {
        self.store.snapshot().write(storage).await
    }

    pub fn bounds(&self) -> Vec<WindowBounds> {
        match self.workspace().root.as_deref() {
            Some(root) => compute_bounds(root, Rect::FULL),
            None => Vec::new(),
        }
    }

    fn minimum_size(&self) -> MinimumSize { self.layout.minimum_size() }

    fn undersized(&self, root: &Node) -> Vec<NodeId> {
        find_undersized(&compute_bounds(root, Rect::FULL), self.viewport, self.minimum_size())
    }

    fn flash(&mut self, id: NodeId) {
        debug!(%id, "flash");
        if let Some(handler) = self.flash.as_mut() {
            handler(id);
        }
    }

    fn commit(&mut self) {
        debug!("Tree:\n{}", self.draw_tree().trim());
        if let Some(persister) = &self.persister {
            persister.schedule(self.store.snapshot());
        }
    }

    fn fresh_leaf(&mut self, window_type: WindowType) -> WindowLeaf {
        let id = self.ids.next();
        match window_type {
            WindowType::Terminal => {
                WindowLeaf::with_state(id, window_type, terminal_state(&self.welcome))
            }
            _ => WindowLeaf::new(id, window_type),
        }
    }

    pub fn create_new_window(&mut self, window_type: WindowType) -> CreateOutcome {
        let leaf = self.fresh_leaf(window_type);
        let new_id = leaf.id;
        let workspace = self.store.active();

        let Some(root) = workspace.root.clone() else {
            let workspace = self.store.active_mut();
            workspace.root = Some(Arc::new(Node::Window(leaf)));
            workspace.active_node_id = Some(new_id);
            info!(id = %new_id, %window_type, "created first window");
            self.commit();
            return CreateOutcome::Created(new_id);
        };

        let Some(active) = workspace.active_node_id.filter(|&id| workspace.contains_window(id))
        else {
            let undersized = self.undersized(&root);
            if let Some(&first) = undersized.first() {
                warn!(?undersized, "refusing new window: existing windows already too small");
                self.flash(first);
                return CreateOutcome::Refused { undersized };
            }
            let abandoned = tree_ops::find_all_window_ids(Some(&root));
            warn!(?abandoned, "no active window, replacing the tree with a new root");
            for id in &abandoned {
                self.drafts.remove(*id);
            }
            let workspace = self.store.active_mut();
            workspace.root = Some(Arc::new(Node::Window(leaf)));
            workspace.active_node_id = Some(new_id);
            workspace.terminal_states.clear();
            self.commit();
            return CreateOutcome::Created(new_id);
        };

        let orientation = self.longer_axis(active);
        match self.split_window(active, orientation, Some(leaf)) {
            SplitOutcome::Applied { new_leaf, .. } => {
                self.store.active_mut().active_node_id = Some(new_leaf);
                self.commit();
                CreateOutcome::Created(new_leaf)
            }
            SplitOutcome::Refused { undersized } => CreateOutcome::Refused { undersized },
            SplitOutcome::NotFound => CreateOutcome::Refused { undersized: Vec::new() },
        }
    }

    /// Horizontal when the leaf is at least as wide as it is tall in pixels.
    fn longer_axis(&self, id: NodeId) -> Orientation {
        let bounds = self.bounds();
        match bounds.iter().find(|wb| wb.id == id) {
            Some(wb) => {
                let px = self.viewport.to_pixels(&wb.bounds);
                if px.width >= px.height { Orientation::Horizontal } else { Orientation::Vertical }
            }
            None => Orientation::Horizontal,
        }
    }

    /// Splits `target`, placing `new_leaf` (a fresh terminal when `None`) in
    /// the second half. Refused without any change if a resulting leaf would
    /// fall below the minimum pixel size.
    pub fn split_window(
        &mut self,
        target: NodeId,
        direction: Orientation,
        new_leaf: Option<WindowLeaf>,
    ) -> SplitOutcome {
        let Some(root) = self.workspace().root.clone() else { return SplitOutcome::NotFound };
        if tree_ops::find_node_by_id(&root, target).is_none() {
            return SplitOutcome::NotFound;
        }

        let mut leaf = new_leaf.unwrap_or_else(|| self.fresh_leaf(WindowType::Terminal));
        if !leaf.id.in_range() || tree_ops::find_node_by_id(&root, leaf.id).is_some() {
            let id = self.ids.next();
            warn!(requested = %leaf.id, assigned = %id, "new window id unusable");
            leaf.id = id;
        } else {
            self.ids.observe(leaf.id);
        }
        let new_id = leaf.id;
        let split_id = self.ids.next();

        let simulated = tree_ops::split_node_by_id(&root, target, direction, leaf, split_id);
        let undersized = self.undersized(&simulated);
        if !undersized.is_empty() {
            warn!(%target, %direction, ?undersized, "split refused: windows would be too small");
            self.flash(target);
            return SplitOutcome::Refused { undersized };
        }

        self.store.active_mut().root = Some(simulated);
        debug!(%target, %direction, new_leaf = %new_id, "split window");
        self.commit();
        SplitOutcome::Applied { new_leaf: new_id, split: split_id }
    }

    pub fn close_window(&mut self, target: NodeId) -> bool {
        let workspace = self.store.active_mut();
        let Some(root) = workspace.root.clone() else { return false };
        if tree_ops::find_node_by_id(&root, target).is_none() {
            return false;
        }

        workspace.root = tree_ops::remove_node_by_id(&root, target);
        workspace.terminal_states.remove(&target);
        if workspace.active_node_id == Some(target) {
            workspace.active_node_id =
                workspace.root.as_deref().map(|root| tree_ops::first_leaf(root).id);
        }
        self.drafts.remove(target);
        debug!(%target, "closed window");
        self.commit();
        true
    }

    /// Changes a leaf's type in place, keeping its content.
    pub fn transform_window(&mut self, target: NodeId, window_type: WindowType) -> bool {
        let workspace = self.store.active_mut();
        let Some(root) = workspace.root.clone() else { return false };
        if tree_ops::find_node_by_id(&root, target).is_none() {
            return false;
        }

        workspace.root = Some(tree_ops::update_leaf(&root, target, |leaf| {
            let mut state = leaf.state.clone();
            if window_type == WindowType::Terminal {
                clear_pending_input(&mut state);
            }
            WindowLeaf::with_state(leaf.id, window_type, state)
        }));
        if window_type == WindowType::Terminal
            && let Some(state) = workspace.terminal_states.get_mut(&target)
        {
            clear_pending_input(state);
        }
        debug!(%target, %window_type, "transformed window");
        self.commit();
        true
    }

    pub fn resize_mode(&self) -> bool { self.resize_mode }

    pub fn set_resize_mode(&mut self, enabled: bool) {
        if self.resize_mode != enabled {
            debug!(enabled, "resize mode");
        }
        self.resize_mode = enabled;
    }

    pub fn toggle_resize_mode(&mut self) -> bool {
        self.set_resize_mode(!self.resize_mode);
        self.resize_mode
    }

    /// Grows or shrinks the active leaf. Undersized results are logged but
    /// never block the resize.
    pub fn resize_active_window(&mut self, direction: Direction) -> ResizeOutcome {
        if !self.resize_mode {
            return ResizeOutcome::Disabled;
        }
        let workspace = self.store.active();
        let (Some(root), Some(active)) = (workspace.root.clone(), workspace.active_node_id) else {
            return ResizeOutcome::NoActiveWindow;
        };

        let changes = plan_resize(&root, active, direction, self.layout.resize_step);
        let Some(resized) = apply_resize(&root, &changes) else {
            return ResizeOutcome::Unchanged;
        };

        let undersized = self.undersized(&resized);
        if !undersized.is_empty() {
            warn!(?undersized, "resize left windows below the minimum size");
        }
        self.store.active_mut().root = Some(resized);
        self.commit();
        ResizeOutcome::Applied { splits: changes.len(), undersized }
    }

    /// Moves focus to the best-scoring leaf in `direction`.
    pub fn navigate_to_window(&mut self, direction: Direction) -> Option<NodeId> {
        let active = self.active_window()?;
        let next = navigation::find_best_neighbor(&self.bounds(), active, direction)?;
        debug!(from = %active, to = %next, %direction, "navigate");
        self.store.active_mut().active_node_id = Some(next);
        self.commit();
        Some(next)
    }

    pub fn focus_window(&mut self, id: NodeId) -> bool {
        if !self.workspace().contains_window(id) {
            return false;
        }
        if self.active_window() != Some(id) {
            self.store.active_mut().active_node_id = Some(id);
            self.commit();
        }
        true
    }

    /// Replaces a leaf's content. Terminal content is mirrored into the
    /// workspace's terminal states.
    pub fn update_window_state(&mut self, id: NodeId, state: Value) -> bool {
        let workspace = self.store.active_mut();
        let Some(root) = workspace.root.clone() else { return false };
        let Some(leaf) = tree_ops::find_node_by_id(&root, id) else { return false };

        if leaf.window_type == WindowType::Terminal {
            workspace.terminal_states.insert(id, state.clone());
        }
        workspace.root = Some(tree_ops::update_leaf(&root, id, |leaf| {
            WindowLeaf::with_state(leaf.id, leaf.window_type, state)
        }));
        self.commit();
        true
    }

    /// Writes a leaf's content to the generic bucket and its type's own
    /// bucket.
    pub async fn persist_window_state<S: Storage>(
        &self,
        storage: &S,
        id: NodeId,
    ) -> anyhow::Result<()> {
        let Some(leaf) = self.window(id) else {
            anyhow::bail!("Window {id} not found");
        };
        let generic = json!({ "windowType": leaf.window_type, "state": leaf.state });
        storage.put(Bucket::WindowState, Record::new(id.get(), generic)).await?;
        if let Some(bucket) = Bucket::for_window_type(leaf.window_type) {
            storage.put(bucket, Record::new(id.get(), leaf.state.clone())).await?;
        }
        Ok(())
    }

    /// Best-effort removal of a closed window's per-window records. Does
    /// nothing while the window is still open; storage failures are logged.
    pub async fn discard_window_records<S: Storage>(&self, storage: &S, id: NodeId) -> bool {
        if self.window(id).is_some() {
            debug!(%id, "window still open, keeping its records");
            return false;
        }
        let mut clean = true;
        for bucket in Bucket::PER_WINDOW {
            if let Err(e) = storage.delete(bucket, id.get()).await {
                warn!(%bucket, %id, "Failed to delete stored window state: {e}");
                clean = false;
            }
        }
        clean
    }

    /// Exchanges the content of two leaves, along with their stored
    /// per-window records, terminal states and session drafts. The tree shape
    /// is unchanged.
    pub async fn swap_windows<S: Storage>(&mut self, storage: &S, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let Some(root) = self.workspace().root.clone() else { return false };
        let (Some(leaf_a), Some(leaf_b)) =
            (tree_ops::find_node_by_id(&root, a), tree_ops::find_node_by_id(&root, b))
        else {
            return false;
        };
        let (leaf_a, leaf_b) = (leaf_a.clone(), leaf_b.clone());

        for bucket in Bucket::PER_WINDOW {
            if let Err(e) = swap_records(storage, bucket, a, b).await {
                warn!(%bucket, %a, %b, "Failed to swap stored window state: {e}");
            }
        }

        let swapped = tree_ops::update_leaf(&root, a, |_| {
            WindowLeaf::with_state(a, leaf_b.window_type, leaf_b.state.clone())
        });
        let swapped = tree_ops::update_leaf(&swapped, b, |_| {
            WindowLeaf::with_state(b, leaf_a.window_type, leaf_a.state.clone())
        });

        let workspace = self.store.active_mut();
        workspace.root = Some(swapped);
        let state_a = workspace.terminal_states.remove(&a);
        let state_b = workspace.terminal_states.remove(&b);
        if let Some(state) = state_b {
            workspace.terminal_states.insert(a, state);
        }
        if let Some(state) = state_a {
            workspace.terminal_states.insert(b, state);
        }
        self.drafts.swap(a, b);
        debug!(%a, %b, "swapped windows");
        self.commit();
        true
    }

    pub fn switch_workspace(&mut self, index: usize) -> bool {
        if !self.store.switch_to(index) {
            return false;
        }
        info!(index, name = %self.workspace().name, "switched workspace");
        self.commit();
        true
    }

    pub fn next_workspace(&mut self) -> bool {
        let next = (self.store.active_index() + 1) % self.store.len();
        self.switch_workspace(next)
    }

    pub fn prev_workspace(&mut self) -> bool {
        let len = self.store.len();
        let prev = (self.store.active_index() + len - 1) % len;
        self.switch_workspace(prev)
    }

    pub fn draw_tree(&self) -> String {
        let workspace = self.workspace();
        let Some(root) = workspace.root.as_deref() else {
            return format!("{} (empty)\n", workspace.name);
        };
        let tree = ascii_tree::Tree::Node(
            workspace.name.clone(),
            vec![ascii_tree_of(root, workspace.active_node_id)],
        );
        let mut out = String::new();
        if let Err(e) = ascii_tree::write_tree(&mut out, &tree) {
            debug!("failed to draw tree: {e}");
        }
        out
    }
}

fn ascii_tree_of(node: &Node, active: Option<NodeId>) -> ascii_tree::Tree {
    match node {
        Node::Window(leaf) => {
            let mark = if Some(leaf.id) == active { "☒ " } else { "☐ " };
            ascii_tree::Tree::Leaf(vec![format!("{mark}{} {}", leaf.window_type, leaf.id)])
        }
        Node::Split(split) => ascii_tree::Tree::Node(
            format!("{} {:.2} [{}]", split.direction, split.split_ratio, split.id),
            vec![ascii_tree_of(&split.first, active), ascii_tree_of(&split.second, active)],
        ),
    }
}

fn clear_pending_input(state: &mut Value) {
    if let Some(fields) = state.as_object_mut() {
        fields.insert("input".to_string(), Value::String(String::new()));
    }
}

/// Reads both records before clearing either, then writes them back under
/// each other's ids.
async fn swap_records<S: Storage>(
    storage: &S,
    bucket: Bucket,
    a: NodeId,
    b: NodeId,
) -> StorageResult<()> {
    let record_a = storage.get(bucket, a.get()).await?;
    let record_b = storage.get(bucket, b.get()).await?;
    storage.delete(bucket, a.get()).await?;
    storage.delete(bucket, b.get()).await?;
    if let Some(record) = record_b {
        storage.put(bucket, Record::new(a.get(), record.data)).await?;
    }
    if let Some(record) = record_a {
        storage.put(bucket, Record::new(b.get(), record.data)).await?;
    }
    Ok(())
}

impl WindowControl for WindowManager {
    fn transform_window(&mut self, id: NodeId, window_type: WindowType) -> bool {
        WindowManager::transform_window(self, id, window_type)
    }

    fn layout_summary(&self) -> Vec<String> {
        let workspace = self.workspace();
        let mut lines = vec![format!(
            "Workspace {}/{}: {}",
            self.store.active_index() + 1,
            self.store.len(),
            workspace.name
        )];
        for wb in self.bounds() {
            let Some(leaf) = self.window(wb.id) else { continue };
            let px = self.viewport.to_pixels(&wb.bounds);
            let mark = if Some(wb.id) == workspace.active_node_id { "*" } else { " " };
            lines.push(format!(
                "{mark} [{}] {} {:.0}x{:.0}px at ({:.1}%, {:.1}%)",
                wb.id, leaf.window_type, px.width, px.height, wb.bounds.left, wb.bounds.top
            ));
        }
        lines
    }
}
