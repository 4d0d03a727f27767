//! src/services/catalog_service.rs
//!
//! CatalogService: CRUD over the picture catalog. Ids are assigned here on
//! insert, callers never supply them. Every operation is a single statement
//! against the shared SQLite pool; the catalog and the blob store are
//! deliberately not linked transactionally.

use crate::classifier::Category;
use crate::models::picture::{PictureEntry, PictureMeta};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// CatalogService records one row per album entry:
/// - Create an entry once its blob is stored and classified
/// - Fetch one entry, or all of them newest first
/// - Update the user-supplied metadata in place
/// - Replace an entry wholesale after a new photo was attached
/// - Delete an entry by id
#[derive(Clone)]
pub struct CatalogService {
    /// Shared SQLite connection pool; the catalog owns no other state.
    pub db: Arc<SqlitePool>,
}

impl CatalogService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a new entry, assigning its id and creation time.
    pub async fn create_picture(
        &self,
        category: Category,
        meta: &PictureMeta,
        blob_name: &str,
        image_public_url: &str,
    ) -> CatalogResult<PictureEntry> {
        let entry = sqlx::query_as::<_, PictureEntry>(
            r#"
            INSERT INTO pictures (id, blob_name, image_public_url, category, name, location, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, blob_name, image_public_url, category, name, location, date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(blob_name)
        .bind(image_public_url)
        .bind(category)
        .bind(&meta.name)
        .bind(&meta.location)
        .bind(&meta.date)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;
        Ok(entry)
    }

    /// Fetch a single entry by id.
    pub async fn get_picture(&self, id: Uuid) -> CatalogResult<Option<PictureEntry>> {
        let entry = sqlx::query_as::<_, PictureEntry>(
            "SELECT id, blob_name, image_public_url, category, name, location, date, created_at
             FROM pictures WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(entry)
    }

    /// Every entry in the catalog, newest first.
    pub async fn list_pictures(&self) -> CatalogResult<Vec<PictureEntry>> {
        let entries = sqlx::query_as::<_, PictureEntry>(
            "SELECT id, blob_name, image_public_url, category, name, location, date, created_at
             FROM pictures ORDER BY created_at DESC, id",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(entries)
    }

    /// Update only the user-supplied metadata fields of an entry. Category,
    /// blob reference and creation time stay untouched. Returns false when
    /// no row carries the id.
    pub async fn update_metadata(&self, id: Uuid, meta: &PictureMeta) -> CatalogResult<bool> {
        let result = sqlx::query("UPDATE pictures SET name = ?, location = ?, date = ? WHERE id = ?")
            .bind(&meta.name)
            .bind(&meta.location)
            .bind(&meta.date)
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace an entry's blob reference, category and metadata in place,
    /// keeping its id and creation time. Returns false when no row carries
    /// the id.
    pub async fn replace_picture(
        &self,
        id: Uuid,
        category: Category,
        meta: &PictureMeta,
        blob_name: &str,
        image_public_url: &str,
    ) -> CatalogResult<bool> {
        let result = sqlx::query(
            "UPDATE pictures
             SET blob_name = ?, image_public_url = ?, category = ?, name = ?, location = ?, date = ?
             WHERE id = ?",
        )
        .bind(blob_name)
        .bind(image_public_url)
        .bind(category)
        .bind(&meta.name)
        .bind(&meta.location)
        .bind(&meta.date)
        .bind(id)
        .execute(&*self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an entry by id. Deleting an id that is already gone is not an
    /// error; the result reports whether a row was actually removed.
    pub async fn delete_picture(&self, id: Uuid) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM pictures WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
