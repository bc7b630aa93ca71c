//! Authenticated request client with refresh-and-retry-once.
//!
//! Wraps every outbound call: resolves the access token from the session
//! store (current key, then legacy aliases), attaches the bearer header,
//! and when the server answers 401 with the explicit `"Token expired"`
//! body, refreshes the credential pair and re-issues the same request
//! exactly once. Everything else is returned to the caller unchanged.

use reqwest::Method;
use serde::Serialize;
use thiserror::Error;

use super::http::{ApiResponse, HttpRequest, HttpTransport, ReqwestTransport, TransportError};
use super::types::AuthResponse;
use crate::session::SessionStore;

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("failed to refresh token (status {0})")]
    Failed(u16),

    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid refresh response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Method, body and extra headers for one logical API invocation.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// API client bound to a base URL, a session store and a transport.
///
/// Generic over the transport so tests can drive it with a scripted fake;
/// production code uses the `ReqwestTransport` default.
pub struct ApiClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client over the production reqwest transport.
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self::with_transport(ReqwestTransport::new(), base_url, session)
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn with_transport(transport: T, base_url: &str, session: SessionStore) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers for one physical attempt: the spec's extra headers, a JSON
    /// content type unless one is already present, and a bearer header
    /// only when a token was resolved.
    fn build_headers(&self, spec: &RequestSpec, token: Option<&str>) -> Vec<(String, String)> {
        let mut headers = spec.headers.clone();
        if let Some(token) = token {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {}", token)));
        }
        if !spec.has_header(CONTENT_TYPE) {
            headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        headers
    }

    /// Perform an authenticated call with automatic refresh-and-retry.
    ///
    /// The token is the explicit override if given, else the session's
    /// ordered lookup. On a 401 carrying the exact expiry signal, refresh
    /// runs once; on refresh success the identical request is re-issued
    /// with the new token and that second response is returned whatever
    /// its status. On refresh failure the original 401 is returned.
    /// Transport failures propagate.
    pub async fn send(
        &self,
        path: &str,
        spec: RequestSpec,
        explicit_token: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let token = explicit_token
            .map(str::to_string)
            .or_else(|| self.session.access_token());

        let request = HttpRequest {
            method: spec.method.clone(),
            url: self.url(path),
            headers: self.build_headers(&spec, token.as_deref()),
            body: spec.body.clone(),
        };
        let response = self.transport.execute(request).await?;

        if response.status() != 401 || !response.is_token_expired() {
            return Ok(response);
        }

        match self.refresh().await {
            Ok(auth) => {
                log::info!("Access token refreshed, retrying {} {}", spec.method, path);
                let retry = HttpRequest {
                    method: spec.method.clone(),
                    url: self.url(path),
                    headers: self.build_headers(&spec, Some(&auth.access_token)),
                    body: spec.body,
                };
                self.transport.execute(retry).await
            }
            Err(e) => {
                // Refresh failures fall back to the original 401.
                log::warn!("Token refresh failed, returning original 401: {}", e);
                Ok(response)
            }
        }
    }

    /// Perform a call that must never carry an Authorization header,
    /// even when a stale token sits in the session (sign-in, sign-up).
    pub async fn send_unauthenticated(
        &self,
        path: &str,
        spec: RequestSpec,
    ) -> Result<ApiResponse, TransportError> {
        let request = HttpRequest {
            method: spec.method.clone(),
            url: self.url(path),
            headers: self.build_headers(&spec, None),
            body: spec.body,
        };
        self.transport.execute(request).await
    }

    /// Mint a new credential pair from the stored refresh token.
    ///
    /// Fails without a network call when no refresh token is stored.
    /// On success the new pair is persisted (current and legacy keys) and
    /// returned for immediate use. Deliberately not serialized across
    /// concurrent callers: overlapping refreshes each round-trip and the
    /// last write to the session wins.
    pub async fn refresh(&self) -> Result<AuthResponse, RefreshError> {
        let refresh_token = self
            .session
            .refresh_token()
            .ok_or(RefreshError::NoRefreshToken)?;

        let request = HttpRequest {
            method: Method::POST,
            url: self.url("/auth/refresh"),
            headers: vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())],
            body: Some(
                serde_json::json!({ "refreshToken": refresh_token }).to_string(),
            ),
        };

        let response = self.transport.execute(request).await?;
        if !response.ok() {
            return Err(RefreshError::Failed(response.status()));
        }

        let auth: AuthResponse = response.json()?;
        self.session.store_auth(&auth);
        Ok(auth)
    }
}
