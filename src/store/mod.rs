//! Persistent key-value storage shared by every session.

use crate::config::StoreConfig;
use crate::errors::StoreResult;
use crate::model::Snapshot;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{trace, warn};

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::sql::SqlStore;

mod file;
mod memory;
mod sql;

pub const COMPANIES_KEY: &str = "companies";
pub const STUDENTS_KEY: &str = "students";
pub const REQUESTS_KEY: &str = "interviewRequests";

/// Key of the logged-in user record of one session.
pub fn current_user_key(session_id: &str) -> String {
    format!("currentUser_{session_id}")
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Write several entries. Backends that can do so write all of them or
    /// none of them.
    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}

pub async fn open(config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
    Ok(match config {
        StoreConfig::Memory => Arc::new(MemoryStore::default()),
        StoreConfig::File { path } => Arc::new(FileStore::new(path)),
        StoreConfig::Sql { url } => Arc::new(SqlStore::connect(url).await?),
    })
}

async fn load_collection<T: DeserializeOwned>(store: &dyn Store, key: &str) -> StoreResult<Vec<T>> {
    match store.get(key).await? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Vec::new()),
    }
}

/// Read the three collections, failing on unreadable or malformed data.
pub(crate) async fn try_load_snapshot(store: &dyn Store) -> StoreResult<Snapshot> {
    Ok(Snapshot::new(
        load_collection(store, COMPANIES_KEY).await?,
        load_collection(store, STUDENTS_KEY).await?,
        load_collection(store, REQUESTS_KEY).await?,
    ))
}

/// Read the three collections. Unreadable or malformed data yields empty
/// collections.
pub async fn load_snapshot(store: &dyn Store) -> Snapshot {
    match try_load_snapshot(store).await {
        Ok(snapshot) => {
            trace!(
                companies = snapshot.companies.len(),
                students = snapshot.students.len(),
                requests = snapshot.requests.len(),
                "snapshot loaded"
            );
            snapshot
        }
        Err(e) => {
            warn!(error = %e, "cannot load stored data, using empty collections");
            Snapshot::default()
        }
    }
}

/// Write the three collections in full, in one batch. Whatever another
/// session wrote to them in the meantime is overwritten.
pub async fn save_snapshot(store: &dyn Store, snapshot: &Snapshot) -> StoreResult<()> {
    let entries = [
        (COMPANIES_KEY, serde_json::to_string(&snapshot.companies)?),
        (STUDENTS_KEY, serde_json::to_string(&snapshot.students)?),
        (REQUESTS_KEY, serde_json::to_string(&snapshot.requests)?),
    ];
    store.set_many(&entries).await
}
