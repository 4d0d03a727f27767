//! Server-rendered pages for the album.
//!
//! No template engine: each page is small enough that format!-assembled
//! HTML stays readable. Everything user-supplied goes through
//! `html_escape` before interpolation; blob names additionally go through
//! `url_segment_escape` when they end up inside an href.

use crate::models::label::LabelAnnotation;
use crate::models::picture::PictureEntry;

/// Escape text for interpolation into HTML bodies and attribute values.
pub fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Percent-escape one URL path segment so blob names survive inside hrefs.
/// The router decodes the segment back before it reaches a handler.
pub fn url_segment_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title} - Photo Album</title></head><body>\
<nav><a href=\"/\">Upload</a> | <a href=\"/photo_album\">Album</a></nav>\
{body}\
</body></html>",
        title = html_escape(title),
    )
}

fn flash_block(flash: Option<&str>) -> String {
    match flash {
        Some(message) => format!("<p class=\"flash\"><em>{}</em></p>", html_escape(message)),
        None => String::new(),
    }
}

/// Landing page: the upload form, optionally preceded by a flash message
/// and followed by the labels detected for the photo just uploaded.
pub fn landing(flash: Option<&str>, detected: Option<&[LabelAnnotation]>) -> String {
    let mut body = flash_block(flash);
    body.push_str(
        "<h1>Upload a photo</h1>\
<form method=\"post\" action=\"/upload_photo\" enctype=\"multipart/form-data\">\
<p><label>Photo <input type=\"file\" name=\"file\" required></label></p>\
<p><label>Name <input type=\"text\" name=\"name\" required></label></p>\
<p><label>Location <input type=\"text\" name=\"location\" required></label></p>\
<p><label>Date <input type=\"date\" name=\"date\" required></label></p>\
<p><button type=\"submit\">Upload</button></p>\
</form>",
    );
    if let Some(labels) = detected {
        body.push_str("<h2>Detected labels</h2><ul>");
        if labels.is_empty() {
            body.push_str("<li>No labels detected.</li>");
        }
        for label in labels {
            body.push_str(&format!(
                "<li>{} ({:.2})</li>",
                html_escape(&label.description),
                label.score
            ));
        }
        body.push_str("</ul>");
    }
    page("Upload", &body)
}

/// Album page: every catalog entry, newest first, with per-entry links.
pub fn photo_album(entries: &[PictureEntry], flash: Option<&str>) -> String {
    let mut body = flash_block(flash);
    body.push_str("<h1>Photo album</h1>");
    if entries.is_empty() {
        body.push_str("<p>No photos uploaded yet.</p>");
    } else {
        body.push_str("<ul class=\"gallery\">");
        for entry in entries {
            body.push_str(&entry_card(entry));
        }
        body.push_str("</ul>");
    }
    page("Album", &body)
}

fn entry_card(entry: &PictureEntry) -> String {
    let blob_segment = url_segment_escape(&entry.blob_name);
    format!(
        "<li>\
<img src=\"{src}\" alt=\"{alt}\" width=\"240\">\
<p>{name} ({location}, {date})</p>\
<p>Category: {category}</p>\
<p><a href=\"/post/{id}\">View</a> \
<a href=\"/edit/{id}\">Edit</a> \
<a href=\"/delete/{blob}/{id}\">Delete</a></p>\
</li>",
        src = html_escape(&entry.image_public_url),
        alt = html_escape(&entry.meta.name),
        name = html_escape(&entry.meta.name),
        location = html_escape(&entry.meta.location),
        date = html_escape(&entry.meta.date),
        category = entry.category.as_str(),
        id = entry.id,
        blob = html_escape(&blob_segment),
    )
}

/// Detail page for one entry. An unknown id renders the empty state, it is
/// not an error.
pub fn post_detail(entry: Option<&PictureEntry>) -> String {
    let body = match entry {
        Some(entry) => format!(
            "<h1>{name}</h1>\
<img src=\"{src}\" alt=\"{name}\" width=\"640\">\
<p>Location: {location}</p>\
<p>Date: {date}</p>\
<p>Category: {category}</p>\
<p>Uploaded: {uploaded}</p>\
<p><a href=\"/edit/{id}\">Edit</a></p>",
            name = html_escape(&entry.meta.name),
            src = html_escape(&entry.image_public_url),
            location = html_escape(&entry.meta.location),
            date = html_escape(&entry.meta.date),
            category = entry.category.as_str(),
            uploaded = entry.created_at.to_rfc3339(),
            id = entry.id,
        ),
        None => "<h1>Photo</h1><p>No photo found for this id.</p>".to_string(),
    };
    page("Photo", &body)
}

/// Edit form for one entry, prefilled with the current metadata. Attaching
/// a new file is optional; the policy radios choose what happens to the
/// existing entry if one is attached. Edit submissions redirect back here,
/// so the page also surfaces their flash message.
pub fn edit_form(entry: Option<&PictureEntry>, flash: Option<&str>) -> String {
    let mut body = flash_block(flash);
    body += &match entry {
        Some(entry) => format!(
            "<h1>Edit {name}</h1>\
<img src=\"{src}\" alt=\"{name}\" width=\"240\">\
<form method=\"post\" action=\"/{blob}/{id}/edit_photo\" enctype=\"multipart/form-data\">\
<p><label>Name <input type=\"text\" name=\"name\" value=\"{name}\" required></label></p>\
<p><label>Location <input type=\"text\" name=\"location\" value=\"{location}\" required></label></p>\
<p><label>Date <input type=\"date\" name=\"date\" value=\"{date}\" required></label></p>\
<p><label>Replace photo <input type=\"file\" name=\"file\"></label></p>\
<p><label><input type=\"radio\" name=\"policy\" value=\"create\" checked> Keep the old entry and record a new one</label><br>\
<label><input type=\"radio\" name=\"policy\" value=\"replace\"> Replace this entry in place</label></p>\
<p><button type=\"submit\">Save</button></p>\
</form>",
            name = html_escape(&entry.meta.name),
            src = html_escape(&entry.image_public_url),
            location = html_escape(&entry.meta.location),
            date = html_escape(&entry.meta.date),
            blob = html_escape(&url_segment_escape(&entry.blob_name)),
            id = entry.id,
        ),
        None => "<h1>Edit</h1><p>No photo found for this id.</p>".to_string(),
    };
    page("Edit", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;
    use crate::models::picture::PictureMeta;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(name: &str, blob_name: &str) -> PictureEntry {
        PictureEntry {
            id: Uuid::new_v4(),
            blob_name: blob_name.to_string(),
            image_public_url: format!("http://localhost/media/{blob_name}"),
            category: Category::Animals,
            meta: PictureMeta {
                name: name.to_string(),
                location: "Porto".to_string(),
                date: "2024-06-01".to_string(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_html_escape_covers_markup_characters() {
        assert_eq!(
            html_escape(r#"<img src="x" onerror='a&b'>"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;a&amp;b&#39;&gt;"
        );
    }

    #[test]
    fn test_url_segment_escape_keeps_unreserved() {
        assert_eq!(url_segment_escape("my-photo_1.jpg"), "my-photo_1.jpg");
        assert_eq!(url_segment_escape("two words.jpg"), "two%20words.jpg");
        assert_eq!(url_segment_escape("a+b.png"), "a%2Bb.png");
    }

    #[test]
    fn test_landing_renders_form_and_labels() {
        let labels = vec![LabelAnnotation {
            description: "Mammal".to_string(),
            score: 0.91,
        }];
        let html = landing(None, Some(&labels));
        assert!(html.contains("action=\"/upload_photo\""));
        assert!(html.contains("name=\"location\""));
        assert!(html.contains("Mammal (0.91)"));
    }

    #[test]
    fn test_album_escapes_user_metadata() {
        let rendered = photo_album(&[entry("<script>alert(1)</script>", "x.jpg")], None);
        assert!(!rendered.contains("<script>alert(1)</script>"));
        assert!(rendered.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_album_links_use_escaped_blob_segment() {
        let e = entry("walk", "two words.jpg");
        let rendered = photo_album(&[e.clone()], None);
        assert!(rendered.contains(&format!("/delete/two%20words.jpg/{}", e.id)));
    }

    #[test]
    fn test_album_empty_state() {
        let rendered = photo_album(&[], None);
        assert!(rendered.contains("No photos uploaded yet."));
    }

    #[test]
    fn test_flash_is_rendered_and_escaped() {
        let rendered = photo_album(&[], Some("deleted <b>x</b>"));
        assert!(rendered.contains("deleted &lt;b&gt;x&lt;/b&gt;"));
    }

    #[test]
    fn test_detail_and_edit_empty_states() {
        assert!(post_detail(None).contains("No photo found for this id."));
        assert!(edit_form(None, None).contains("No photo found for this id."));
    }

    #[test]
    fn test_edit_form_prefills_current_values() {
        let e = entry("sunset", "sunset.jpg");
        let html = edit_form(Some(&e), Some("Photo details updated."));
        assert!(html.contains("Photo details updated."));
        assert!(html.contains("value=\"sunset\""));
        assert!(html.contains("value=\"Porto\""));
        assert!(html.contains(&format!("action=\"/sunset.jpg/{}/edit_photo\"", e.id)));
        assert!(html.contains("name=\"policy\" value=\"replace\""));
    }
}
