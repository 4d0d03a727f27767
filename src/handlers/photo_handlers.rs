//! HTTP handlers for the mutating flows: upload, edit and delete.
//!
//! Each flow buffers the multipart form first, so a malformed request fails
//! before any storage or gateway call. The happy path is always
//! store blob, make it public, detect labels, classify, touch the catalog.

use crate::{
    AppState, classifier,
    classifier::Category,
    errors::AppError,
    models::label::LabelAnnotation,
    models::picture::PictureMeta,
    services::storage_service::StorageError,
    views,
};
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use futures::stream;
use std::io;
use tracing::{debug, info};
use uuid::Uuid;

/// Fields collected from the upload and edit multipart forms.
#[derive(Default)]
struct PhotoForm {
    file: Option<UploadedFile>,
    name: Option<String>,
    location: Option<String>,
    date: Option<String>,
    policy: Option<String>,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    payload: Bytes,
}

/// `GET|POST /upload_photo` — store the photo, label it, record the entry.
///
/// The form must carry a file part plus `name`, `location` and `date`. The
/// catalog entry is only recorded once the blob write and the vision call
/// both succeeded; a vision failure therefore leaves a stored blob with no
/// entry behind, which the flow accepts rather than compensating for.
pub async fn upload_photo(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let form = read_photo_form(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::new(StatusCode::BAD_REQUEST, "missing photo file"))?;
    let meta = PictureMeta {
        name: required(form.name, "name")?,
        location: required(form.location, "location")?,
        date: required(form.date, "date")?,
    };

    let stored = store_and_classify(&state, &file).await?;
    let entry = state
        .catalog
        .create_picture(stored.category, &meta, &stored.blob_name, &stored.public_url)
        .await?;
    info!(
        entry = %entry.id,
        blob = %entry.blob_name,
        category = entry.category.as_str(),
        "recorded new photo"
    );

    Ok(Html(views::landing(None, Some(&stored.labels))))
}

/// `POST /{blob_name}/{id}/edit_photo` — update an entry.
///
/// Without a new file this is a metadata-only update: name, location and
/// date change, everything else stays. With a new file the old blob is
/// dropped and the full upload pipeline runs again; the `policy` field then
/// decides whether the existing entry is replaced in place or kept while a
/// brand-new entry is recorded (the default).
pub async fn edit_photo(
    State(state): State<AppState>,
    Path((blob_name, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_photo_form(multipart).await?;
    let meta = PictureMeta {
        name: required(form.name, "name")?,
        location: required(form.location, "location")?,
        date: required(form.date, "date")?,
    };
    let entry_id = Uuid::parse_str(&id).ok();

    let message = match form.file {
        None => {
            let updated = match entry_id {
                Some(entry_id) => state.catalog.update_metadata(entry_id, &meta).await?,
                None => false,
            };
            if updated {
                "Photo details updated.".to_string()
            } else {
                "No album entry found to update.".to_string()
            }
        }
        Some(file) => {
            match state.storage.delete_blob(&blob_name).await {
                Ok(()) => {}
                Err(StorageError::BlobNotFound(_)) => {
                    debug!(blob = %blob_name, "previous blob already gone");
                }
                Err(err) => return Err(err.into()),
            }

            let stored = store_and_classify(&state, &file).await?;
            match form.policy.as_deref() {
                Some("replace") => {
                    let replaced = match entry_id {
                        Some(entry_id) => {
                            state
                                .catalog
                                .replace_picture(
                                    entry_id,
                                    stored.category,
                                    &meta,
                                    &stored.blob_name,
                                    &stored.public_url,
                                )
                                .await?
                        }
                        None => false,
                    };
                    if replaced {
                        "Photo replaced.".to_string()
                    } else {
                        "No album entry found to replace.".to_string()
                    }
                }
                _ => {
                    // Default policy: the old entry is deliberately kept; it
                    // now points at a blob that no longer exists.
                    let entry = state
                        .catalog
                        .create_picture(
                            stored.category,
                            &meta,
                            &stored.blob_name,
                            &stored.public_url,
                        )
                        .await?;
                    info!(entry = %entry.id, blob = %entry.blob_name, "recorded replacement photo as new entry");
                    "New photo recorded.".to_string()
                }
            }
        }
    };

    Ok(flash_redirect(&state, &format!("/edit/{id}"), &message))
}

/// `GET /delete/{blob_name}/{id}` — remove the blob, then the entry.
///
/// A blob that is already gone is reported in the flash message but never
/// blocks the entry removal; the user always lands back on the album.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path((blob_name, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let blob_missing = match state.storage.delete_blob(&blob_name).await {
        Ok(()) => false,
        Err(StorageError::BlobNotFound(_)) => true,
        Err(err) => return Err(err.into()),
    };

    if let Ok(entry_id) = Uuid::parse_str(&id) {
        state.catalog.delete_picture(entry_id).await?;
    }

    let message = if blob_missing {
        format!("Stored photo `{blob_name}` was already gone; the album entry was removed.")
    } else {
        format!("Deleted `{blob_name}` from the album.")
    };
    info!(blob = %blob_name, blob_missing, "deleted photo");
    Ok(flash_redirect(&state, "/photo_album", &message))
}

struct StoredPhoto {
    blob_name: String,
    public_url: String,
    category: Category,
    labels: Vec<LabelAnnotation>,
}

/// The shared middle of the upload and edit flows: write the blob, make it
/// public, detect labels over its public URL and classify them.
async fn store_and_classify(state: &AppState, file: &UploadedFile) -> Result<StoredPhoto, AppError> {
    let payload = file.payload.clone();
    let stream = stream::iter([Ok::<_, io::Error>(payload)]);
    let blob = state
        .storage
        .put_blob(&file.filename, file.content_type.clone(), stream)
        .await?;
    state.storage.make_public(&blob.name).await?;
    let public_url = state.storage.public_url(&blob.name);

    let labels = state.vision.detect_labels(&public_url).await?;
    let category = classifier::classify(&labels);
    debug!(
        blob = %blob.name,
        labels = labels.len(),
        category = category.as_str(),
        "classified photo"
    );

    Ok(StoredPhoto {
        blob_name: blob.name,
        public_url,
        category,
        labels,
    })
}

/// Drain the multipart form into plain fields. File parts without a
/// filename or without bytes count as "no file attached".
async fn read_photo_form(mut multipart: Multipart) -> Result<PhotoForm, AppError> {
    let mut form = PhotoForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let payload = field.bytes().await.map_err(bad_multipart)?;
                if !filename.is_empty() && !payload.is_empty() {
                    form.file = Some(UploadedFile {
                        filename,
                        content_type,
                        payload,
                    });
                }
            }
            "name" => form.name = Some(field.text().await.map_err(bad_multipart)?),
            "location" => form.location = Some(field.text().await.map_err(bad_multipart)?),
            "date" => form.date = Some(field.text().await.map_err(bad_multipart)?),
            "policy" => form.policy = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }
    Ok(form)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, format!("malformed upload form: {err}"))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value.ok_or_else(|| {
        AppError::new(
            StatusCode::BAD_REQUEST,
            format!("missing form field `{field}`"),
        )
    })
}

/// Redirect carrying a signed flash message for the next page render.
fn flash_redirect(state: &AppState, location: &str, message: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    if let Ok(cookie) = HeaderValue::from_str(&state.flash.set_cookie(message)) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}
