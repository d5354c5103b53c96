use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Bucket, Record, Storage, StorageResult};

/// Stores each bucket as a RON list of records in `<dir>/<bucket>.ron`.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path(&self, bucket: Bucket) -> PathBuf { self.dir.join(format!("{bucket}.ron")) }

    async fn read_bucket(&self, bucket: Bucket) -> StorageResult<Vec<Record>> {
        match tokio::fs::read_to_string(self.path(bucket)).await {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(ron::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_bucket(&self, bucket: Bucket, records: &[Record]) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let text = ron::ser::to_string_pretty(&records, PrettyConfig::default())?;
        let path = self.path(bucket);
        let tmp = path.with_extension("ron.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(?path, count = records.len(), "wrote bucket");
        Ok(())
    }
}

impl Storage for FileStorage {
    async fn put(&self, bucket: Bucket, record: Record) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_bucket(bucket).await?;
        match records.binary_search_by_key(&record.id, |r| r.id) {
            Ok(i) => records[i] = record,
            Err(i) => records.insert(i, record),
        }
        self.write_bucket(bucket, &records).await
    }

    async fn get(&self, bucket: Bucket, id: u64) -> StorageResult<Option<Record>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_bucket(bucket).await?.into_iter().find(|r| r.id == id))
    }

    async fn get_all(&self, bucket: Bucket) -> StorageResult<Vec<Record>> {
        let _guard = self.lock.lock().await;
        self.read_bucket(bucket).await
    }

    async fn delete(&self, bucket: Bucket, id: u64) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_bucket(bucket).await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() != before {
            self.write_bucket(bucket, &records).await?;
        }
        Ok(())
    }

    async fn clear(&self, bucket: Bucket) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(self.path(bucket)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
