//! src/services/storage_service.rs
//!
//! StorageService: the blob gateway behind uploaded photos. Payloads live on
//! local disk in a single flat bucket directory, keyed by blob name; one
//! metadata row per blob lives in SQLite. Uploads stream through a temporary
//! file and rename into place so a failed request never leaves a
//! half-written payload behind.

use crate::models::blob::Blob;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob `{0}` not found")]
    BlobNotFound(String),
    #[error("invalid blob name `{0}`")]
    InvalidBlobName(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

const MAX_BLOB_NAME_LEN: usize = 1024;

/// StorageService provides the blob operations the album needs:
/// - Put a blob (streams bytes to disk and upserts metadata into SQLite)
/// - Make a blob public so the media route will serve it
/// - Open a blob for reading (metadata from SQLite, payload from disk)
/// - Delete a blob (metadata row and payload together)
///
/// The surface is deliberately small. There is exactly one bucket, chosen at
/// startup, and blob names map one-to-one onto files inside it.
#[derive(Clone)]
pub struct StorageService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Directory on disk holding every payload, keyed by blob name.
    pub bucket_root: PathBuf,

    /// URL prefix under which public blobs are served, no trailing slash.
    public_base_url: String,
}

impl StorageService {
    /// Create a new StorageService over the given pool, rooted at
    /// `base_path/{bucket}` and serving public blobs under
    /// `{public_base_url}/media/{name}`.
    pub fn new(
        db: Arc<SqlitePool>,
        base_path: impl Into<PathBuf>,
        bucket: &str,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            bucket_root: base_path.into().join(bucket),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Basic name validation to avoid trivial path traversal vectors.
    ///
    /// Blob names come from uploaded filenames, so anything path-like is
    /// rejected outright: separators, `..`, control bytes.
    fn ensure_name_safe(&self, name: &str) -> StorageResult<()> {
        if name.is_empty() || name.len() > MAX_BLOB_NAME_LEN {
            return Err(StorageError::InvalidBlobName(name.to_string()));
        }
        if name.contains('/') || name.contains("..") {
            return Err(StorageError::InvalidBlobName(name.to_string()));
        }
        if name
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(StorageError::InvalidBlobName(name.to_string()));
        }
        Ok(())
    }

    /// Physical path of a blob payload. Does not check existence.
    fn blob_path(&self, name: &str) -> PathBuf {
        self.bucket_root.join(name)
    }

    /// Public URL for a blob name. Purely syntactic; it does not check that
    /// the blob exists or has been made public.
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/media/{}", self.public_base_url, name)
    }

    /// Fetch a blob metadata row, mapping a missing row to `BlobNotFound`.
    async fn fetch_blob(&self, name: &str) -> StorageResult<Blob> {
        sqlx::query_as::<_, Blob>(
            "SELECT name, content_type, size_bytes, etag, is_public, created_at
             FROM blobs WHERE name = ?",
        )
        .bind(name)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StorageError::BlobNotFound(name.to_string()),
            other => StorageError::Sqlx(other),
        })
    }

    /// Stream an uploaded payload to disk and upsert its metadata row.
    ///
    /// - Writes bytes incrementally to a temporary file.
    /// - Computes MD5/etag and size while streaming.
    /// - Atomically renames into the final location.
    /// - Upserts the metadata row: re-uploading a name overwrites, it does
    ///   not version. An overwrite resets `is_public`; publication is an
    ///   explicit second step.
    ///
    /// Ensures durable writes (fsync) and cleans up temp files on errors.
    pub async fn put_blob<S>(
        &self,
        name: &str,
        content_type: Option<String>,
        stream: S,
    ) -> StorageResult<Blob>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        self.ensure_name_safe(name)?;
        fs::create_dir_all(&self.bucket_root).await?;

        let file_path = self.blob_path(name);
        let tmp_path = self.bucket_root.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StorageError::Io(err));
                }
            };
            size_bytes += chunk.len() as i64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }

        let etag = format!("{:x}", digest.compute());
        let created_at = Utc::now();

        let insert_result = sqlx::query_as::<_, Blob>(
            r#"
            INSERT INTO blobs (name, content_type, size_bytes, etag, is_public, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            ON CONFLICT(name) DO UPDATE SET
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                is_public = 0,
                created_at = excluded.created_at
            RETURNING name, content_type, size_bytes, etag, is_public, created_at
            "#,
        )
        .bind(name)
        .bind(content_type)
        .bind(size_bytes)
        .bind(&etag)
        .bind(created_at)
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(blob) => Ok(blob),
            Err(err) => {
                let _ = fs::remove_file(&file_path).await;
                Err(StorageError::Sqlx(err))
            }
        }
    }

    /// Mark a stored blob as publicly servable.
    pub async fn make_public(&self, name: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE blobs SET is_public = 1 WHERE name = ?")
            .bind(name)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::BlobNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Fetch a public blob for reading.
    ///
    /// Returns metadata and an opened File handle ready for streaming out.
    /// A blob that exists but was never made public reads as not found, the
    /// media route must not leak private payloads.
    pub async fn blob_reader(&self, name: &str) -> StorageResult<(Blob, File)> {
        self.ensure_name_safe(name)?;
        let blob = self.fetch_blob(name).await?;
        if !blob.is_public {
            return Err(StorageError::BlobNotFound(name.to_string()));
        }

        let file_path = self.blob_path(name);
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::BlobNotFound(name.to_string())
            } else {
                StorageError::Io(err)
            }
        })?;

        Ok((blob, file))
    }

    /// Delete a blob's metadata row and payload.
    ///
    /// Removal of either half alone still counts as a delete; only when
    /// neither the row nor the file existed does this return `BlobNotFound`,
    /// so callers can tell "deleted" from "was never there".
    pub async fn delete_blob(&self, name: &str) -> StorageResult<()> {
        self.ensure_name_safe(name)?;
        let result = sqlx::query("DELETE FROM blobs WHERE name = ?")
            .bind(name)
            .execute(&*self.db)
            .await?;
        let row_existed = result.rows_affected() > 0;

        let file_path = self.blob_path(name);
        let file_existed = match fs::remove_file(&file_path).await {
            Ok(_) => {
                debug!("removed payload {}", file_path.display());
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("payload {} already missing", file_path.display());
                false
            }
            Err(err) => return Err(StorageError::Io(err)),
        };

        if !row_existed && !file_existed {
            return Err(StorageError::BlobNotFound(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::io::AsyncReadExt;

    async fn test_storage() -> (StorageService, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("blobs.db");
        std::fs::File::create(&db_path).expect("create db file");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&format!("sqlite://{}", db_path.display()))
            .await
            .expect("connect sqlite");
        let db = Arc::new(pool);
        crate::run_migrations(&db).await.expect("migrate");
        let storage = StorageService::new(
            db,
            tmp.path().join("objects"),
            "photo-album",
            "http://127.0.0.1:8080/",
        );
        (storage, tmp)
    }

    fn byte_stream(payload: &'static [u8]) -> impl Stream<Item = io::Result<Bytes>> {
        futures::stream::iter([Ok(Bytes::from_static(payload))])
    }

    #[tokio::test]
    async fn test_put_make_public_read_roundtrip() {
        let (storage, _tmp) = test_storage().await;

        let blob = storage
            .put_blob(
                "sunset.jpg",
                Some("image/jpeg".to_string()),
                byte_stream(b"not really a jpeg"),
            )
            .await
            .expect("put blob");
        assert_eq!(blob.name, "sunset.jpg");
        assert_eq!(blob.size_bytes, 17);
        assert!(!blob.is_public);

        storage.make_public("sunset.jpg").await.expect("make public");

        let (meta, mut file) = storage.blob_reader("sunset.jpg").await.expect("read blob");
        assert!(meta.is_public);
        assert_eq!(meta.content_type.as_deref(), Some("image/jpeg"));
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.expect("read payload");
        assert_eq!(contents, b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_private_blob_reads_as_not_found() {
        let (storage, _tmp) = test_storage().await;
        storage
            .put_blob("secret.jpg", None, byte_stream(b"x"))
            .await
            .expect("put blob");

        let err = storage.blob_reader("secret.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::BlobNotFound(_)));
    }

    #[tokio::test]
    async fn test_overwrite_updates_metadata_and_resets_public() {
        let (storage, _tmp) = test_storage().await;
        let first = storage
            .put_blob("photo.jpg", None, byte_stream(b"aaaa"))
            .await
            .expect("first put");
        storage.make_public("photo.jpg").await.expect("make public");

        let second = storage
            .put_blob("photo.jpg", None, byte_stream(b"bbbbbbbb"))
            .await
            .expect("second put");
        assert_eq!(second.size_bytes, 8);
        assert_ne!(first.etag, second.etag);
        assert!(!second.is_public);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_reports_not_found() {
        let (storage, _tmp) = test_storage().await;
        storage
            .put_blob("gone.jpg", None, byte_stream(b"payload"))
            .await
            .expect("put blob");

        storage.delete_blob("gone.jpg").await.expect("first delete");
        let err = storage.delete_blob("gone.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::BlobNotFound(_)));
    }

    #[tokio::test]
    async fn test_path_like_names_rejected() {
        let (storage, _tmp) = test_storage().await;
        for name in ["", "../evil", "a/b.jpg", "back\\slash", "nul\0byte"] {
            let err = storage
                .put_blob(name, None, byte_stream(b"x"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidBlobName(_)),
                "name {name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_public_url_shape() {
        let (storage, _tmp) = test_storage().await;
        assert_eq!(
            storage.public_url("cat.png"),
            "http://127.0.0.1:8080/media/cat.png"
        );
    }
}
