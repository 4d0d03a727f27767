//! One-shot flash messages carried in a signed cookie.
//!
//! Mutating flows redirect and surface their outcome on the next page
//! render. The message travels in a `flash` cookie as
//! `base64url(message).base64url(hmac-sha256 tag)`; a cookie whose tag does
//! not verify under the configured secret is silently ignored. Pages that
//! display a flash clear the cookie in the same response.

use axum::http::{HeaderMap, header};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const COOKIE_NAME: &str = "flash";

/// Signs and verifies flash cookies with the service secret.
#[derive(Clone)]
pub struct FlashSigner {
    secret: Vec<u8>,
}

impl FlashSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length")
    }

    /// `Set-Cookie` value carrying a signed message.
    pub fn set_cookie(&self, message: &str) -> String {
        let encoded = URL_SAFE_NO_PAD.encode(message.as_bytes());
        let mut mac = self.mac();
        mac.update(message.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{COOKIE_NAME}={encoded}.{tag}; Path=/; HttpOnly; SameSite=Lax")
    }

    /// `Set-Cookie` value that clears the flash once it was displayed.
    pub fn clear_cookie(&self) -> String {
        format!("{COOKIE_NAME}=; Path=/; HttpOnly; Max-Age=0")
    }

    /// Extract and verify the flash message from request headers, if any.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        for cookie_header in headers.get_all(header::COOKIE) {
            let Ok(cookies) = cookie_header.to_str() else {
                continue;
            };
            for pair in cookies.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                if name != COOKIE_NAME || value.is_empty() {
                    continue;
                }
                if let Some(message) = self.verify(value) {
                    return Some(message);
                }
            }
        }
        None
    }

    fn verify(&self, value: &str) -> Option<String> {
        let (encoded, tag) = value.split_once('.')?;
        let message = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
        let mut mac = self.mac();
        mac.update(&message);
        mac.verify_slice(&tag).ok()?;
        String::from_utf8(message).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).expect("cookie"));
        headers
    }

    fn cookie_value(set_cookie: &str) -> &str {
        set_cookie.split(';').next().expect("cookie pair")
    }

    #[test]
    fn test_sign_then_read_roundtrip() {
        let signer = FlashSigner::new("secret");
        let set = signer.set_cookie("Deleted `dog.jpg` from the album.");
        let headers = headers_with_cookie(cookie_value(&set));
        assert_eq!(
            signer.read(&headers).as_deref(),
            Some("Deleted `dog.jpg` from the album.")
        );
    }

    #[test]
    fn test_tampered_tag_is_ignored() {
        let signer = FlashSigner::new("secret");
        let set = signer.set_cookie("hello");
        let mut value = cookie_value(&set).to_string();
        // Flip the last character of the tag.
        let last = value.pop().expect("nonempty");
        value.push(if last == 'A' { 'B' } else { 'A' });
        assert_eq!(signer.read(&headers_with_cookie(&value)), None);
    }

    #[test]
    fn test_wrong_secret_is_ignored() {
        let signer = FlashSigner::new("secret");
        let other = FlashSigner::new("different");
        let set = signer.set_cookie("hello");
        assert_eq!(other.read(&headers_with_cookie(cookie_value(&set))), None);
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let signer = FlashSigner::new("secret");
        for cookie in ["flash=", "flash=nodot", "flash=a.b", "other=x"] {
            assert_eq!(signer.read(&headers_with_cookie(cookie)), None, "{cookie}");
        }
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let signer = FlashSigner::new("secret");
        let clear = signer.clear_cookie();
        assert!(clear.starts_with("flash=;"));
        assert!(clear.contains("Max-Age=0"));
    }
}
