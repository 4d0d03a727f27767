//! Represents one catalog entry behind an uploaded photo.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::classifier::Category;

/// User-supplied descriptive fields, captured verbatim from the upload form.
///
/// The `date` stays a plain string: it is whatever the user typed into the
/// form, not a value the service interprets.
#[derive(Clone, FromRow, Debug, PartialEq)]
pub struct PictureMeta {
    /// Display name for the photo.
    pub name: String,

    /// Where the photo was taken.
    pub location: String,

    /// When the photo was taken, as entered by the user.
    pub date: String,
}

/// A single entry in the picture catalog.
///
/// An entry only exists once its blob was stored and the vision call
/// succeeded, so every row here points at a classified image. The id is
/// assigned by the catalog on insert; `created_at` is set once and never
/// touched by later edits.
#[derive(Clone, FromRow, Debug)]
pub struct PictureEntry {
    /// Catalog-assigned identifier.
    pub id: Uuid,

    /// Name of the backing blob in the storage gateway. Derived from the
    /// uploaded filename, so not guaranteed unique across entries.
    pub blob_name: String,

    /// Public URL under which the blob is served.
    pub image_public_url: String,

    /// Classification outcome for the image content.
    pub category: Category,

    /// User-supplied metadata.
    #[sqlx(flatten)]
    pub meta: PictureMeta,

    /// Creation time of the entry, immutable for its whole life.
    pub created_at: DateTime<Utc>,
}
