// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    config::{Config, LOCAL_OWNER_EMAIL, Tenancy},
    error::AppError,
    proforma::ResponseLog,
    render::Renderer,
    store::KvStore,
    utils::hash::hash_password,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub templates: Arc<Renderer>,
    /// Owner every request acts as when `TENANCY=single`.
    pub local_owner: Option<i64>,
}

impl AppState {
    /// Compiles templates and, in single-tenant mode, seeds the local owner.
    pub async fn build(pool: SqlitePool, config: Config) -> Result<Self, AppError> {
        let templates = Arc::new(Renderer::new()?);

        let local_owner = match config.tenancy {
            Tenancy::Single => Some(seed_local_owner(&pool).await?),
            Tenancy::Multi => None,
        };

        Ok(Self {
            pool,
            config,
            templates,
            local_owner,
        })
    }
}

async fn seed_local_owner(pool: &SqlitePool) -> Result<i64, AppError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(LOCAL_OWNER_EMAIL)
        .fetch_optional(pool)
        .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    tracing::info!("Seeding local owner: {}", LOCAL_OWNER_EMAIL);
    // Nobody logs in as the local owner; the hash only fills the column.
    let password = hash_password(&Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string())?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (email, name, password, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(LOCAL_OWNER_EMAIL)
    .bind("Local owner")
    .bind(password)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Renderer> {
    fn from_ref(state: &AppState) -> Self {
        state.templates.clone()
    }
}

impl FromRef<AppState> for ResponseLog {
    fn from_ref(state: &AppState) -> Self {
        ResponseLog::new(KvStore::new(state.pool.clone()))
    }
}
