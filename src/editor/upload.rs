//! Shared file-upload service client.
//!
//! Uploads go to a cross-project file service rather than the Kolesa API
//! itself. Each request is signed with a derived access token: a
//! millisecond timestamp joined with the base64 SHA-256 digest of
//! `project|fileType|timestamp|secret`, the pair base64-wrapped again.
//! The service answers `{url, projectName, fileType}`.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::pipeline::{ImageFile, ImageUploader};
use crate::config::Config;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the upload; carries its error message.
    #[error("{0}")]
    Rejected(String),

    #[error("invalid file part: {0}")]
    InvalidPart(String),
}

/// Successful upload: the durable URL plus the echo of where it landed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub url: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}

#[derive(Deserialize)]
struct UploadErrorBody {
    error: Option<String>,
}

/// Derive the service access token for one upload.
///
/// Format: `base64("{timestamp}|{base64(sha256(project|fileType|timestamp|secret))}")`.
/// The digest is base64 of the raw hash bytes, not of a hex string.
pub fn generate_access_token(project: &str, file_kind: &str, secret: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let data = format!("{}|{}|{}|{}", project, file_kind, timestamp, secret);
    let digest = Sha256::digest(data.as_bytes());
    let hash_b64 = STANDARD.encode(digest);

    STANDARD.encode(format!("{}|{}", timestamp, hash_b64))
}

/// Production uploader over the shared file service.
pub struct FileUploadService {
    client: reqwest::Client,
    base_url: String,
    project: String,
    file_kind: String,
    secret: String,
    auth_token: Option<String>,
}

impl FileUploadService {
    pub fn new(config: &Config, auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            project: config.upload_project.clone(),
            file_kind: config.upload_file_kind.clone(),
            secret: config.upload_secret.clone(),
            auth_token,
        }
    }
}

impl ImageUploader for FileUploadService {
    async fn upload(&self, file: &ImageFile) -> Result<UploadResult, UploadError> {
        let access_token = generate_access_token(&self.project, &self.file_kind, &self.secret);

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| UploadError::InvalidPart(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("projectName", self.project.clone())
            .text("fileType", self.file_kind.clone())
            .text("accessToken", access_token);

        let url = format!("{}/api/files/upload-to-project", self.base_url);
        let mut builder = self.client.post(&url).multipart(form);
        if let Some(ref token) = self.auth_token {
            builder = builder.bearer_auth(token);
        }

        log::info!("Uploading {} ({} bytes) to {}", file.name, file.bytes.len(), url);
        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp
                .json::<UploadErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("File upload failed ({})", status));
            return Err(UploadError::Rejected(message));
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_is_double_base64_with_timestamp_prefix() {
        let token = generate_access_token("kolesa", "publication-images", "secret");

        let outer = STANDARD.decode(&token).expect("outer layer is base64");
        let outer = String::from_utf8(outer).expect("outer layer is utf-8");

        let (timestamp, hash_b64) = outer.split_once('|').expect("timestamp|hash shape");
        assert!(timestamp.parse::<u128>().is_ok());

        // Inner layer is the base64 of a raw 32-byte SHA-256 digest.
        let digest = STANDARD.decode(hash_b64).expect("digest is base64");
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn access_token_binds_project_and_file_kind() {
        // Same inputs within one millisecond may collide, but different
        // project names must always produce different digests.
        let a = generate_access_token("kolesa", "publication-images", "secret");
        let b = generate_access_token("other", "publication-images", "secret");

        let inner = |token: &str| {
            let outer = String::from_utf8(STANDARD.decode(token).unwrap()).unwrap();
            outer.split_once('|').unwrap().1.to_string()
        };
        assert_ne!(inner(&a), inner(&b));
    }

    #[test]
    fn upload_result_decodes_service_response() {
        let result: UploadResult = serde_json::from_str(
            r#"{"url":"https://cdn/x.png","projectName":"kolesa","fileType":"publication-images"}"#,
        )
        .unwrap();
        assert_eq!(result.url, "https://cdn/x.png");
        assert_eq!(result.project_name.as_deref(), Some("kolesa"));
    }
}
