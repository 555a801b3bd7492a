//! Upload form parsing.
//!
//! Upload tools post a multipart form with the release metadata, the archive
//! in a `content` part, and HTTP Basic credentials.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use simplepypi_registry::{Credentials, DigestAlgorithm, ReleaseRecord};

use crate::error::WebError;

/// The only supported value of the `:action` field.
pub const UPLOAD_ACTION: &str = "file_upload";

/// Credentials from an `Authorization: Basic ...` header, if present and well formed.
pub fn basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::new(username, password))
}

/// Final path component of a client-supplied file name.
pub fn base_name(raw: &str) -> &str {
    raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(raw)
}

/// The fields of an upload request.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub action: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub sha256_digest: Option<String>,
    pub md5_digest: Option<String>,
    pub summary: String,
    pub description: String,
    pub author: String,
    pub author_email: String,
    /// Declared file name and bytes of the `content` part.
    pub content: Option<(String, Bytes)>,
}

impl UploadForm {
    /// Drain a multipart body into a form.
    pub async fn read(mut multipart: Multipart) -> Result<Self, WebError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| WebError::BadRequest(format!("malformed upload: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "content" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::BadRequest(format!("reading file: {e}")))?;
                form.content = Some((filename, data));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| WebError::BadRequest(format!("reading field {name}: {e}")))?;
                form.set_field(&name, value);
            }
        }
        Ok(form)
    }

    /// Record one text field. Unknown fields are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            ":action" => self.action = Some(value),
            "name" => self.name = Some(value),
            "version" => self.version = Some(value),
            "sha256_digest" => self.sha256_digest = Some(value),
            "md5_digest" => self.md5_digest = Some(value),
            "summary" => self.summary = value,
            "description" => self.description = value,
            "author" => self.author = value,
            "author_email" => self.author_email = value,
            _ => {}
        }
    }

    /// Check required fields and build the record to publish, along with the
    /// algorithm its declared digest was computed with. `sha256_digest` wins
    /// when both digests are sent.
    pub fn into_release(self) -> Result<(ReleaseRecord, DigestAlgorithm, Bytes), WebError> {
        let declared = match (self.sha256_digest, self.md5_digest) {
            (Some(digest), _) => Some((digest, DigestAlgorithm::Sha256)),
            (None, Some(digest)) => Some((digest, DigestAlgorithm::Md5)),
            (None, None) => None,
        };
        let (Some(name), Some(version), Some((digest, algorithm))) =
            (self.name, self.version, declared)
        else {
            return Err(WebError::BadRequest(
                "name, version, :action and sha256_digest are all required".to_string(),
            ));
        };
        if self.action.as_deref() != Some(UPLOAD_ACTION) {
            return Err(WebError::BadRequest(format!(
                "only actions of {UPLOAD_ACTION} are supported"
            )));
        }
        let Some((filename, data)) = self.content else {
            return Err(WebError::BadRequest("no file content uploaded".to_string()));
        };

        let mut record = ReleaseRecord::new(name, version, base_name(&filename), digest);
        record.summary = self.summary;
        record.description = self.description;
        record.author = self.author;
        record.author_email = self.author_email;
        Ok((record, algorithm, data))
    }
}
