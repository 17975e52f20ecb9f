//! SQLite-backed key/value store.
//!
//! Values are stored as JSON text and deserialized on read.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{Row, SqliteExecutor, SqlitePool};

use crate::error::AppError;

#[derive(Clone)]
pub struct KvStore {
    pool: SqlitePool,
}

async fn read_raw<'e>(executor: impl SqliteExecutor<'e>, key: &str) -> Result<Option<String>, AppError> {
    let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
        .bind(key)
        .fetch_optional(executor)
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get("value")?)),
        None => Ok(None),
    }
}

async fn write_raw<'e>(executor: impl SqliteExecutor<'e>, key: &str, raw: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO kv (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(raw)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(())
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::InternalServerError(format!("invalid JSON under key '{key}': {e}")))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::InternalServerError(format!("failed to serialize value: {e}")))
}

impl KvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reads and decodes the value under `key`.
    ///
    /// A missing key is `Ok(None)`. A stored value that no longer decodes as `T`
    /// is reported as an error so the caller can decide how to fall back.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match read_raw(&self.pool, key).await? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Overwrites the whole value under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        write_raw(&self.pool, key, &encode(value)?).await
    }

    /// Reads, edits and rewrites the value under `key` inside one write transaction,
    /// so concurrent callers see each other's edits.
    ///
    /// A missing or undecodable value starts from `T::default()`. `apply` returns
    /// whether the value changed; nothing is written otherwise.
    pub async fn update<T, F>(&self, key: &str, apply: F) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> bool,
    {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let mut value = match read_raw(&mut *tx, key).await? {
            Some(raw) => decode(key, &raw).unwrap_or_else(|e| {
                tracing::warn!("Replacing unreadable value under '{}': {:?}", key, e);
                T::default()
            }),
            None => T::default(),
        };

        if !apply(&mut value) {
            return Ok(false);
        }

        write_raw(&mut *tx, key, &encode(&value)?).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Returns whether a value was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores a raw string without JSON encoding.
    #[cfg(test)]
    pub(crate) async fn set_raw(&self, key: &str, raw: &str) -> Result<(), AppError> {
        write_raw(&self.pool, key, raw).await
    }
}
