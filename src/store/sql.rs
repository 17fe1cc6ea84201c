use super::Store;
use crate::errors::StoreResult;
use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tracing::{debug, trace};

/// Storage in a two-column table of a MySQL (or, with the `sqlite` feature,
/// SQLite) database.
#[derive(Debug)]
pub struct SqlStore {
    pool: AnyPool,
}

impl SqlStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS slotbook_kv (name VARCHAR(255) PRIMARY KEY, contents TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;
        debug!("connected to sql store");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(
            sqlx::query("SELECT contents FROM slotbook_kv WHERE name = ?")
                .bind(key.to_owned())
                .map(|row: AnyRow| row.get::<String, _>("contents"))
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query("REPLACE INTO slotbook_kv (name, contents) VALUES (?, ?)")
            .bind(key.to_owned())
            .bind(value.to_owned())
            .execute(&self.pool)
            .await?;
        trace!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM slotbook_kv WHERE name = ?")
            .bind(key.to_owned())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        let mut transaction = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query("REPLACE INTO slotbook_kv (name, contents) VALUES (?, ?)")
                .bind((*key).to_owned())
                .bind(value.clone())
                .execute(&mut *transaction)
                .await?;
        }
        transaction.commit().await?;
        trace!(entries = entries.len(), "stored batch");
        Ok(())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("kv.db").display());
        let store = SqlStore::connect(&url).await.unwrap();
        assert!(store.get("companies").await.unwrap().is_none());
        store.set("companies", "[]").await.unwrap();
        store.set("companies", "[1]").await.unwrap();
        assert_eq!(store.get("companies").await.unwrap().as_deref(), Some("[1]"));
        store.remove("companies").await.unwrap();
        assert!(store.get("companies").await.unwrap().is_none());

        store
            .set_many(&[("companies", "[2]".to_owned()), ("students", "[]".to_owned())])
            .await
            .unwrap();
        assert_eq!(store.get("companies").await.unwrap().as_deref(), Some("[2]"));
        assert_eq!(store.get("students").await.unwrap().as_deref(), Some("[]"));
    }
}
