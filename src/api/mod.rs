//! Authenticated API layer for the Kolesa backend.
//!
//! `client` owns bearer attachment and the refresh-and-retry-once flow;
//! `http` is the buffered transport seam it runs on; `auth`, `users` and
//! `publications` are the thin domain operations the UI calls.

pub mod auth;
pub mod client;
pub mod http;
pub mod publications;
pub mod types;
pub mod users;

use thiserror::Error;

use http::{ApiResponse, TransportError};

/// Errors surfaced to callers of the domain operations.
///
/// Transport failures propagate as-is; non-ok responses become `Api` with
/// a human-readable message extracted from the error body (or a fixed
/// per-operation fallback when the body has no usable `message`).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Build a domain error from a non-ok response.
    pub(crate) fn from_response(resp: &ApiResponse, fallback: &str) -> Self {
        ApiError::Api {
            status: resp.status(),
            message: resp.error_message(fallback),
        }
    }
}
