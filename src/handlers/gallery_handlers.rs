//! HTTP handlers for the read-only pages: landing, album, detail, edit form
//! and the media route that streams blob payloads back out.

use crate::{
    AppState,
    errors::AppError,
    models::blob::Blob,
    views,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// `GET /` — landing page with the upload form. Shows and clears a pending
/// flash message.
pub async fn homepage(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let flash = state.flash.read(&headers);
    let html = views::landing(flash.as_deref(), None);
    page_response(html, flash.is_some(), &state)
}

/// `GET /photo_album` — every recorded entry, newest first.
pub async fn photo_album(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entries = state.catalog.list_pictures().await?;
    let flash = state.flash.read(&headers);
    let html = views::photo_album(&entries, flash.as_deref());
    Ok(page_response(html, flash.is_some(), &state))
}

/// `GET /post/{id}` — detail page for one entry. A malformed or unknown id
/// renders the empty state with 200 rather than a 404.
pub async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let entry = lookup_entry(&state, &id).await?;
    Ok(Html(views::post_detail(entry.as_ref())))
}

/// `GET /edit/{id}` — edit form for one entry, same empty-state behavior as
/// the detail page. Edit submissions redirect back here, so the page also
/// shows and clears a pending flash message.
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let entry = lookup_entry(&state, &id).await?;
    let flash = state.flash.read(&headers);
    let html = views::edit_form(entry.as_ref(), flash.as_deref());
    Ok(page_response(html, flash.is_some(), &state))
}

/// `GET /media/{blob_name}` — stream a public blob payload.
pub async fn media(
    State(state): State<AppState>,
    Path(blob_name): Path<String>,
) -> Result<Response, AppError> {
    let (blob, file) = state.storage.blob_reader(&blob_name).await?;
    let stream = ReaderStream::new(file);

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    set_blob_headers(response.headers_mut(), &blob);
    Ok(response)
}

async fn lookup_entry(
    state: &AppState,
    id: &str,
) -> Result<Option<crate::models::picture::PictureEntry>, AppError> {
    match Uuid::parse_str(id) {
        Ok(id) => Ok(state.catalog.get_picture(id).await?),
        Err(_) => Ok(None),
    }
}

/// Wrap a rendered page, clearing the flash cookie when one was displayed.
fn page_response(html: String, clear_flash: bool, state: &AppState) -> Response {
    let mut response = Html(html).into_response();
    if clear_flash {
        if let Ok(value) = HeaderValue::from_str(&state.flash.clear_cookie()) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

fn set_blob_headers(headers: &mut HeaderMap, blob: &Blob) {
    let content_type = blob
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&blob.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    let quoted = format!("\"{}\"", blob.etag);
    if let Ok(value) = HeaderValue::from_str(&quoted) {
        headers.insert(header::ETAG, value);
    }
}
