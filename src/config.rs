//! Environment-driven configuration.
//!
//! Reads `.env` via dotenvy so the CLI and any embedding host share the
//! same variables. Every value has a production default matching the
//! deployed Kolesa backend.

/// Shared secret for the file-upload service token derivation.
///
/// Must match the key configured on the upload backend. Overridable via
/// `KOLESA_UPLOAD_SECRET` for non-production deployments.
const DEFAULT_UPLOAD_SECRET: &str = "95e6a68e941573ef7188f07bb213ee05";

/// Runtime configuration for the API client and upload service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Kolesa REST API (includes the `/api` prefix).
    pub api_base_url: String,

    /// Base URL of the shared file-upload service (no `/api` prefix;
    /// the upload path carries it).
    pub upload_base_url: String,

    /// Project name the upload service files land under.
    pub upload_project: String,

    /// File-type bucket for editor images.
    pub upload_file_kind: String,

    /// Shared secret for deriving upload access tokens.
    pub upload_secret: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `KOLESA_API_URL` > `VITE_API_URL` > production default, mirroring
    /// the precedence the web client used.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let api_base_url = std::env::var("KOLESA_API_URL")
            .or_else(|_| std::env::var("VITE_API_URL"))
            .unwrap_or_else(|_| "https://api-kolesa.javazhan.tech/api".to_string());

        let upload_base_url = std::env::var("KOLESA_UPLOAD_URL")
            .unwrap_or_else(|_| "https://api-todo.javazhan.tech".to_string());

        let upload_project =
            std::env::var("KOLESA_UPLOAD_PROJECT").unwrap_or_else(|_| "kolesa".to_string());

        let upload_file_kind = std::env::var("KOLESA_UPLOAD_FILE_TYPE")
            .unwrap_or_else(|_| "publication-images".to_string());

        let upload_secret = std::env::var("KOLESA_UPLOAD_SECRET")
            .unwrap_or_else(|_| DEFAULT_UPLOAD_SECRET.to_string());

        Self {
            api_base_url,
            upload_base_url,
            upload_project,
            upload_file_kind,
            upload_secret,
        }
    }
}
