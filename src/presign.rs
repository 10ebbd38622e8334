//! Upload URL presigning
//!
//! `POST /files/upload` hands the client a short-lived signed upload URL and
//! the final public URL for the object. The token is a SHA-256 digest over
//! the secret, the object key, the content type and the expiry timestamp,
//! encoded URL-safe without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Issued upload grant
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
    pub file_url: String,
}

/// Signed upload-URL issuer
#[derive(Debug, Clone)]
pub struct UploadPresigner {
    secret: Vec<u8>,
    base_url: String,
    ttl: Duration,
}

impl UploadPresigner {
    pub fn new(secret: &str, base_url: &str, ttl_secs: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Mint an upload grant for one object
    pub fn presign(&self, filename: &str, content_type: &str) -> PresignedUpload {
        let key = format!("uploads/{}/{}", Uuid::new_v4(), sanitize(filename));
        let expires = (Utc::now() + self.ttl).timestamp();
        let token = self.sign(&format!("{key}\n{content_type}\n{expires}"));

        PresignedUpload {
            upload_url: format!(
                "{base}/upload/{key}?expires={expires}&token={token}",
                base = self.base_url
            ),
            file_url: format!("{base}/{key}", base = self.base_url),
            key,
        }
    }

    fn sign(&self, message: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(message.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// Keep object keys to a conservative character set
fn sanitize(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presigner() -> UploadPresigner {
        UploadPresigner::new("test-secret", "http://files.example.com/", 900)
    }

    #[test]
    fn test_presign_shapes_key_and_urls() {
        let grant = presigner().presign("brief.pdf", "application/pdf");
        assert!(grant.key.starts_with("uploads/"));
        assert!(grant.key.ends_with("/brief.pdf"));
        assert_eq!(
            grant.file_url,
            format!("http://files.example.com/{}", grant.key)
        );
        assert!(grant
            .upload_url
            .starts_with(&format!("http://files.example.com/upload/{}?", grant.key)));
        assert!(grant.upload_url.contains("token="));
        assert!(grant.upload_url.contains("expires="));
    }

    #[test]
    fn test_keys_are_unique_per_grant() {
        let p = presigner();
        let a = p.presign("brief.pdf", "application/pdf");
        let b = p.presign("brief.pdf", "application/pdf");
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_filename_sanitization() {
        let grant = presigner().presign("../etc/pass wd?.pdf", "application/pdf");
        assert!(grant.key.ends_with("/.._etc_pass_wd_.pdf"));
        let grant = presigner().presign("", "application/pdf");
        assert!(grant.key.ends_with("/file"));
    }
}
