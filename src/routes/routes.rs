//! Defines the routes for the photo album.
//!
//! ## Structure
//! - **Pages**
//!   - `GET  /`                  — landing page with the upload form
//!   - `GET  /photo_album`       — album of every recorded entry
//!   - `GET  /post/{id}`         — detail page for one entry
//!   - `GET  /edit/{id}`         — edit form for one entry
//!
//! - **Mutating flows**
//!   - `GET|POST /upload_photo`            — upload orchestration
//!   - `POST /{blob_name}/{id}/edit_photo` — edit orchestration
//!   - `GET  /delete/{blob_name}/{id}`     — delete orchestration
//!
//! - **Plumbing**
//!   - `GET /media/{blob_name}` — stream a public blob payload
//!   - `GET /healthz`, `GET /readyz` — probes

use crate::{
    AppState,
    handlers::{
        gallery_handlers::{edit_form, homepage, media, photo_album, post_detail},
        health_handlers::{healthz, readyz},
        photo_handlers::{delete_photo, edit_photo, upload_photo},
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Largest accepted request body. Phone photos run tens of megabytes, well
/// above axum's 2 MB default limit.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build and return the router for every album route.
///
/// The router carries the shared `AppState` (storage, catalog, vision
/// gateway, flash signer) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // pages
        .route("/", get(homepage))
        .route("/photo_album", get(photo_album))
        .route("/post/{id}", get(post_detail))
        .route("/edit/{id}", get(edit_form))
        // mutating flows
        .route("/upload_photo", get(upload_photo).post(upload_photo))
        .route("/{blob_name}/{id}/edit_photo", post(edit_photo))
        .route("/delete/{blob_name}/{id}", get(delete_photo))
        // blob payloads
        .route("/media/{blob_name}", get(media))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
