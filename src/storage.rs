//! Asynchronous key-value storage that sessions are persisted to.
//!
//! Data lives in named [`Bucket`]s of [`Record`]s keyed by a numeric id. The
//! window manager only ever talks to the [`Storage`] trait; [`MemoryStorage`]
//! and [`FileStorage`] are the two backends shipped with the crate.

mod file;
mod memory;
mod persister;

use std::future::Future;
use std::sync::Arc;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persister::Persister;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter};

use crate::model::WindowType;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Bucket {
    Workspaces,
    ActiveWindow,
    WindowState,
    Terminal,
    Explorer,
    Chat,
    Canvas,
}

impl Bucket {
    /// Buckets that hold content belonging to a single window leaf.
    pub const PER_WINDOW: [Bucket; 5] =
        [Bucket::WindowState, Bucket::Terminal, Bucket::Explorer, Bucket::Chat, Bucket::Canvas];

    /// Specialised bucket for a window type, if it has one beyond the generic
    /// window state bucket.
    pub fn for_window_type(window_type: WindowType) -> Option<Bucket> {
        match window_type {
            WindowType::Terminal => Some(Bucket::Terminal),
            WindowType::Explorer => Some(Bucket::Explorer),
            WindowType::Chat => Some(Bucket::Chat),
            WindowType::Canvas => Some(Bucket::Canvas),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub data: Value,
}

impl Record {
    pub fn new(id: u64, data: Value) -> Self { Self { id, data } }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode bucket: {0}")]
    Encode(#[from] ron::Error),
    #[error("Failed to decode bucket: {0}")]
    Decode(#[from] ron::error::SpannedError),
    #[error("Invalid record payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Storage is unavailable")]
    Unavailable,
}

pub type StorageResult<T> = Result<T, StorageError>;

pub trait Storage: Send + Sync + 'static {
    fn put(&self, bucket: Bucket, record: Record) -> impl Future<Output = StorageResult<()>> + Send;

    fn get(
        &self,
        bucket: Bucket,
        id: u64,
    ) -> impl Future<Output = StorageResult<Option<Record>>> + Send;

    fn get_all(&self, bucket: Bucket) -> impl Future<Output = StorageResult<Vec<Record>>> + Send;

    fn delete(&self, bucket: Bucket, id: u64) -> impl Future<Output = StorageResult<()>> + Send;

    fn clear(&self, bucket: Bucket) -> impl Future<Output = StorageResult<()>> + Send;
}

impl<S: Storage> Storage for Arc<S> {
    fn put(&self, bucket: Bucket, record: Record) -> impl Future<Output = StorageResult<()>> + Send {
        (**self).put(bucket, record)
    }

    fn get(
        &self,
        bucket: Bucket,
        id: u64,
    ) -> impl Future<Output = StorageResult<Option<Record>>> + Send {
        (**self).get(bucket, id)
    }

    fn get_all(&self, bucket: Bucket) -> impl Future<Output = StorageResult<Vec<Record>>> + Send {
        (**self).get_all(bucket)
    }

    fn delete(&self, bucket: Bucket, id: u64) -> impl Future<Output = StorageResult<()>> + Send {
        (**self).delete(bucket, id)
    }

    fn clear(&self, bucket: Bucket) -> impl Future<Output = StorageResult<()>> + Send {
        (**self).clear(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_types_map_to_buckets() {
        assert_eq!(Bucket::for_window_type(WindowType::Terminal), Some(Bucket::Terminal));
        assert_eq!(Bucket::for_window_type(WindowType::Explorer), Some(Bucket::Explorer));
        assert_eq!(Bucket::for_window_type(WindowType::Chat), Some(Bucket::Chat));
        assert_eq!(Bucket::for_window_type(WindowType::Canvas), Some(Bucket::Canvas));
        assert_eq!(Bucket::for_window_type(WindowType::Dice), None);
        assert_eq!(Bucket::for_window_type(WindowType::Editor), None);
    }

    #[test]
    fn bucket_names_are_snake_case() {
        assert_eq!(Bucket::ActiveWindow.to_string(), "active_window");
        assert_eq!(Bucket::WindowState.to_string(), "window_state");
    }
}
