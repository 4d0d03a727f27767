//! Represents a stored payload in the photo bucket.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Metadata row for a single blob held by the storage gateway.
///
/// A blob is addressed by its name, which is derived from the uploaded
/// filename. The struct tracks everything needed to serve the payload back;
/// the bytes themselves live on disk next to this row.
#[derive(Clone, FromRow, Debug)]
pub struct Blob {
    /// Blob name, unique within the bucket.
    pub name: String,

    /// Content type (MIME type) reported by the uploader, if any.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// MD5 checksum computed while the payload was written.
    pub etag: String,

    /// Whether the blob may be served over the public media route.
    pub is_public: bool,

    /// Timestamp of the most recent write under this name.
    pub created_at: DateTime<Utc>,
}
