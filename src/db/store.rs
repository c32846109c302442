// Persisted client-side state (what a browser keeps in localStorage)
use async_trait::async_trait;
use rusqlite::params;
use thiserror::Error;

use crate::state::DbPool;

/// Well-known keys in the local store.
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const USERNAME: &str = "username";
    pub const IS_ADMIN: &str = "isAdmin";
    pub const DAILY_QUOTE: &str = "dailyQuote";
    pub const QUOTE_DATE: &str = "quoteDate";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Returns whether a value was present.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

pub struct SqliteLocalStore {
    pool: DbPool,
}

impl SqliteLocalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.pool.get()?;

        let result = conn.query_row(
            "SELECT value FROM local_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO local_store (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value],
        )?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM local_store WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }
}
