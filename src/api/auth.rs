//! Authentication operations.
//!
//! Sign-in and sign-up precede authentication, so they go through the
//! unauthenticated path and never carry a bearer header, even when a
//! stale token is still sitting in the session.

use super::client::{ApiClient, RequestSpec};
use super::http::HttpTransport;
use super::types::{AuthResponse, ChangePasswordRequest, SignInRequest, SignUpRequest};
use super::ApiError;

/// POST /auth/signin. Persists the returned credential pair on success.
pub async fn sign_in<T: HttpTransport>(
    client: &ApiClient<T>,
    request: &SignInRequest,
) -> Result<AuthResponse, ApiError> {
    let spec = RequestSpec::post().json(request)?;
    let resp = client.send_unauthenticated("/auth/signin", spec).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Sign in failed"));
    }
    let auth: AuthResponse = resp.json()?;
    client.session().store_auth(&auth);
    Ok(auth)
}

/// POST /auth/signup. Persists the returned credential pair on success.
pub async fn sign_up<T: HttpTransport>(
    client: &ApiClient<T>,
    request: &SignUpRequest,
) -> Result<AuthResponse, ApiError> {
    let spec = RequestSpec::post().json(request)?;
    let resp = client.send_unauthenticated("/auth/signup", spec).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Sign up failed"));
    }
    let auth: AuthResponse = resp.json()?;
    client.session().store_auth(&auth);
    Ok(auth)
}

/// Best-effort POST /auth/logout, then local session teardown. The
/// session is cleared even when the server is unreachable.
pub async fn logout<T: HttpTransport>(client: &ApiClient<T>) {
    if let Err(e) = client.send("/auth/logout", RequestSpec::post(), None).await {
        log::warn!("Logout request failed (continuing local cleanup): {}", e);
    }
    client.session().clear();
    log::info!("Session cleared");
}

/// POST /auth/change-password.
pub async fn change_password<T: HttpTransport>(
    client: &ApiClient<T>,
    request: &ChangePasswordRequest,
) -> Result<(), ApiError> {
    let spec = RequestSpec::post().json(request)?;
    let resp = client.send("/auth/change-password", spec, None).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to change password"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::api::http::{ApiResponse, HttpRequest, HttpTransport, TransportError};
    use crate::session::SessionStore;

    struct SingleResponse {
        response: ApiResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl HttpTransport for &SingleResponse {
        async fn execute(&self, request: HttpRequest) -> Result<ApiResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn transport(status: u16, body: &[u8]) -> SingleResponse {
        SingleResponse {
            response: ApiResponse::new(status, body.to_vec()),
            requests: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn sign_in_persists_tokens_and_sends_no_auth_header() {
        let transport = transport(
            200,
            br#"{"accessToken":"a","refreshToken":"r","user":{"id":"u-1"}}"#,
        );
        let session = SessionStore::in_memory();
        session.store_tokens("stale", "stale-refresh");
        let client = ApiClient::with_transport(&transport, "https://api.test/api", session.clone());

        let auth = sign_in(
            &client,
            &SignInRequest {
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(auth.access_token, "a");
        assert_eq!(session.access_token().as_deref(), Some("a"));

        let requests = transport.requests.lock().unwrap();
        assert!(requests[0]
            .headers
            .iter()
            .all(|(name, _)| !name.eq_ignore_ascii_case("Authorization")));
    }

    #[tokio::test]
    async fn sign_up_failure_surfaces_server_message() {
        let transport = transport(409, br#"{"message":"Username already taken"}"#);
        let client = ApiClient::with_transport(
            &transport,
            "https://api.test/api",
            SessionStore::in_memory(),
        );

        let err = sign_up(
            &client,
            &SignUpRequest {
                username: "driver".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Username already taken");
    }

    #[tokio::test]
    async fn logout_clears_session_even_on_server_error() {
        let transport = transport(500, b"{}");
        let session = SessionStore::in_memory();
        session.store_tokens("acc", "ref");
        let client = ApiClient::with_transport(&transport, "https://api.test/api", session.clone());

        logout(&client).await;
        assert!(session.access_token().is_none());
        assert!(session.refresh_token().is_none());
    }
}
