//! A small self-hosted photo album.
//!
//! Uploads are stored as blobs in a local bucket directory, labeled through
//! a vision gateway, classified into one of four fixed categories and
//! recorded in a SQLite catalog. Every page is rendered server-side.
//!
//! The crate splits into the layers the binary wires together in `main`:
//! [`services`] for the long-lived collaborators (blob storage, catalog,
//! vision gateway), [`handlers`] + [`routes`] for the HTTP surface,
//! [`classifier`] for the label rules and [`views`] for HTML rendering.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

pub mod classifier;
pub mod config;
pub mod errors;
pub mod flash;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

pub use crate::config::AppConfig;
pub use crate::flash::FlashSigner;
pub use crate::services::catalog_service::CatalogService;
pub use crate::services::storage_service::StorageService;
pub use crate::services::vision_service::{FakeVision, HttpVision, VisionGateway};

/// Shared state handed to every handler: the long-lived collaborators,
/// constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageService,
    pub catalog: CatalogService,
    pub vision: Arc<dyn VisionGateway>,
    pub flash: FlashSigner,
}

/// Assemble the full application router over the given state.
pub fn build_router(state: AppState) -> Router {
    routes::routes::routes().with_state(state)
}

/// Apply the embedded schema. Every statement is idempotent, so this runs
/// on each startup and in test setups alike.
pub async fn run_migrations(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let sql = include_str!("../migrations/0001_init.sql");
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::debug!("running {} migration statements", statements.len());
    for stmt in statements {
        sqlx::query(stmt).execute(db).await?;
    }
    Ok(())
}
