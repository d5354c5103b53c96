use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Storage;
use crate::model::WorkspaceSnapshot;

/// Debounced background writer for workspace snapshots.
///
/// Each [`schedule`](Persister::schedule) replaces the pending snapshot and
/// restarts the quiet period; once `debounce` passes without a new snapshot
/// the latest one is written in full. Dropping the persister cancels the task,
/// discarding anything still pending.
pub struct Persister {
    tx: watch::Sender<Option<WorkspaceSnapshot>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Persister {
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: Storage>(storage: Arc<S>, debounce: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(storage, rx, debounce, cancel.clone()));
        Self { tx, cancel, handle: Some(handle) }
    }

    pub fn schedule(&self, snapshot: WorkspaceSnapshot) { self.tx.send_replace(Some(snapshot)); }

    /// Stops the background task and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) { self.cancel.cancel(); }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister").field("cancelled", &self.cancel.is_cancelled()).finish()
    }
}

async fn run<S: Storage>(
    storage: Arc<S>,
    mut rx: watch::Receiver<Option<WorkspaceSnapshot>>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                changed = rx.changed() => {
                    // sender dropped with its owner, discard the pending snapshot
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        if cancel.is_cancelled() {
            return;
        }
        let Some(snapshot) = rx.borrow_and_update().clone() else { continue };
        debug!(workspaces = snapshot.workspaces.len(), "persisting snapshot");
        if let Err(e) = snapshot.write(&*storage).await {
            warn!("Failed to persist workspaces: {e:#}");
        }
    }
}
