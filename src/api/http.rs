//! Buffered HTTP transport.
//!
//! The request client needs to inspect a 401 body for the expiry signal
//! and still hand the untouched response to its caller, so responses are
//! buffered up front: status plus body bytes, readable any number of
//! times. `HttpTransport` is the seam tests mock; `ReqwestTransport` is
//! the production implementation.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// One physical HTTP exchange about to be issued.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Connection-level failure reported by a non-reqwest transport.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// A fully-buffered response: status and body bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: Vec<u8>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// 2xx check, same contract as `Response.ok` in the web client.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. Reads the buffer, never consumes it.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Whether this response carries the server's explicit expiry signal:
    /// a JSON object whose `error` field is exactly `"Token expired"`.
    /// Any other body shape (different message, missing field, unparsable
    /// JSON) does not count.
    pub fn is_token_expired(&self) -> bool {
        match self.json::<serde_json::Value>() {
            Ok(serde_json::Value::Object(map)) => {
                map.get("error").and_then(|v| v.as_str()) == Some("Token expired")
            }
            _ => false,
        }
    }

    /// Best-effort extraction of the error body's `message` field.
    /// Parse failures fall back to the supplied per-operation message.
    pub fn error_message(&self, fallback: &str) -> String {
        self.json::<ErrorBody>()
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Seam between the request client and the network.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    /// Issue one physical request and buffer its response.
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport over a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expired_requires_exact_error_value() {
        let expired = ApiResponse::new(401, br#"{"error":"Token expired"}"#.to_vec());
        assert!(expired.is_token_expired());

        let other = ApiResponse::new(401, br#"{"error":"Invalid credentials"}"#.to_vec());
        assert!(!other.is_token_expired());

        let missing = ApiResponse::new(401, br#"{"message":"Token expired"}"#.to_vec());
        assert!(!missing.is_token_expired());

        let unparsable = ApiResponse::new(401, b"Unauthorized".to_vec());
        assert!(!unparsable.is_token_expired());

        let non_object = ApiResponse::new(401, br#""Token expired""#.to_vec());
        assert!(!non_object.is_token_expired());
    }

    #[test]
    fn body_stays_readable_after_expiry_check() {
        let resp = ApiResponse::new(401, br#"{"error":"Invalid credentials"}"#.to_vec());
        assert!(!resp.is_token_expired());
        // The buffer is untouched by the check.
        assert_eq!(resp.text(), r#"{"error":"Invalid credentials"}"#);
    }

    #[test]
    fn error_message_uses_message_field_or_fallback() {
        let with_message = ApiResponse::new(400, br#"{"message":"Title is required"}"#.to_vec());
        assert_eq!(with_message.error_message("fallback"), "Title is required");

        let without_message = ApiResponse::new(400, br#"{"error":"Bad request"}"#.to_vec());
        assert_eq!(without_message.error_message("fallback"), "fallback");

        let garbage = ApiResponse::new(500, b"<html>oops</html>".to_vec());
        assert_eq!(garbage.error_message("fallback"), "fallback");
    }

    #[test]
    fn ok_matches_2xx_only() {
        assert!(ApiResponse::new(200, vec![]).ok());
        assert!(ApiResponse::new(204, vec![]).ok());
        assert!(!ApiResponse::new(301, vec![]).ok());
        assert!(!ApiResponse::new(401, vec![]).ok());
    }
}
