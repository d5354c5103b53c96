use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::DashMap;
use serde_json::Value;

use super::{Bucket, Record, Storage, StorageError, StorageResult};

#[derive(Debug, Default)]
struct Inner {
    buckets: DashMap<Bucket, BTreeMap<u64, Value>>,
    unavailable: AtomicBool,
    puts: AtomicUsize,
}

/// In-process storage. Cloning shares the same buckets.
#[derive(Clone, Default, Debug)]
pub struct MemoryStorage(Arc<Inner>);

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    /// Makes every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.0.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful `put` calls so far.
    pub fn put_count(&self) -> usize { self.0.puts.load(Ordering::SeqCst) }

    fn check(&self) -> StorageResult<()> {
        if self.0.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    async fn put(&self, bucket: Bucket, record: Record) -> StorageResult<()> {
        self.check()?;
        self.0.buckets.entry(bucket).or_default().insert(record.id, record.data);
        self.0.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, bucket: Bucket, id: u64) -> StorageResult<Option<Record>> {
        self.check()?;
        Ok(self
            .0
            .buckets
            .get(&bucket)
            .and_then(|records| records.get(&id).cloned())
            .map(|data| Record::new(id, data)))
    }

    async fn get_all(&self, bucket: Bucket) -> StorageResult<Vec<Record>> {
        self.check()?;
        Ok(self
            .0
            .buckets
            .get(&bucket)
            .map(|records| {
                records.iter().map(|(id, data)| Record::new(*id, data.clone())).collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, bucket: Bucket, id: u64) -> StorageResult<()> {
        self.check()?;
        if let Some(mut records) = self.0.buckets.get_mut(&bucket) {
            records.remove(&id);
        }
        Ok(())
    }

    async fn clear(&self, bucket: Bucket) -> StorageResult<()> {
        self.check()?;
        self.0.buckets.remove(&bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let storage = MemoryStorage::new();
        storage.put(Bucket::Terminal, Record::new(7, json!({ "history": ["ls"] }))).await.unwrap();

        let record = storage.get(Bucket::Terminal, 7).await.unwrap().unwrap();
        assert_eq!(record.data["history"][0], "ls");
        assert!(storage.get(Bucket::Explorer, 7).await.unwrap().is_none());

        storage.delete(Bucket::Terminal, 7).await.unwrap();
        assert!(storage.get(Bucket::Terminal, 7).await.unwrap().is_none());
        storage.delete(Bucket::Terminal, 7).await.unwrap();
    }

    #[tokio::test]
    async fn get_all_is_ordered_and_clear_empties() {
        let storage = MemoryStorage::new();
        for id in [3, 1, 2] {
            storage.put(Bucket::Workspaces, Record::new(id, json!(id))).await.unwrap();
        }
        let ids: Vec<_> = storage
            .get_all(Bucket::Workspaces)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(storage.put_count(), 3);

        storage.clear(Bucket::Workspaces).await.unwrap();
        assert!(storage.get_all(Bucket::Workspaces).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_storage_fails_every_call() {
        let storage = MemoryStorage::new();
        storage.set_unavailable(true);
        assert!(matches!(
            storage.put(Bucket::Chat, Record::new(1, json!({}))).await,
            Err(StorageError::Unavailable)
        ));
        assert!(storage.get_all(Bucket::Chat).await.is_err());

        storage.set_unavailable(false);
        assert!(storage.get_all(Bucket::Chat).await.unwrap().is_empty());
    }
}
