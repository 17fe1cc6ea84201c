use super::Store;
use crate::errors::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::trace;

/// All entries kept as one JSON object in a single file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles issued from this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn read_entries(&self) -> StoreResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        let mut temporary = self.path.clone().into_os_string();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);
        fs::write(&temporary, contents)
            .await
            .map_err(|e| self.io_error(e))?;
        fs::rename(&temporary, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        trace!(path = %self.path.display(), entries = entries.len(), "store file written");
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }

    async fn set_many(&self, batch: &[(&str, String)]) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        for (key, value) in batch {
            entries.insert((*key).to_owned(), value.clone());
        }
        self.write_entries(&entries).await
    }
}
