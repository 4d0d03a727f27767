//! Core data models for the photo album service.
//!
//! These entities cover the two sides of an upload: the stored blob
//! (payload metadata) and the catalog entry shown in the album. They map
//! cleanly to database tables via `sqlx::FromRow`; the label types mirror
//! the vision gateway's wire format via `serde`.

pub mod blob;
pub mod label;
pub mod picture;
