//! Profile operations.

use super::client::{ApiClient, RequestSpec};
use super::http::HttpTransport;
use super::types::{UpdateProfileRequest, User};
use super::ApiError;

/// GET /users/profile.
pub async fn get_profile<T: HttpTransport>(client: &ApiClient<T>) -> Result<User, ApiError> {
    let resp = client.send("/users/profile", RequestSpec::get(), None).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to fetch profile"));
    }
    Ok(resp.json()?)
}

/// PUT /users/profile. Name and avatar updates, including avatar removal.
pub async fn update_profile<T: HttpTransport>(
    client: &ApiClient<T>,
    request: &UpdateProfileRequest,
) -> Result<User, ApiError> {
    let spec = RequestSpec::put().json(request)?;
    let resp = client.send("/users/profile", spec, None).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to update profile"));
    }
    Ok(resp.json()?)
}

/// POST /users/to-sell: upgrade the current account to a seller.
pub async fn become_seller<T: HttpTransport>(client: &ApiClient<T>) -> Result<(), ApiError> {
    let resp = client.send("/users/to-sell", RequestSpec::post(), None).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to become seller"));
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

    #[tokio::test]
    async fn update_profile_serializes_avatar_removal_as_null() {
        let transport = SingleResponse {
            response: ApiResponse::new(200, br#"{"id":"u-1"}"#.to_vec()),
            requests: Mutex::new(Vec::new()),
        };
        let client = ApiClient::with_transport(
            &transport,
            "https://api.test/api",
            SessionStore::in_memory(),
        );

        let request = UpdateProfileRequest {
            avatar_url: Some(None),
            ..Default::default()
        };
        update_profile(&client, &request).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"avatarUrl":null}"#));
    }

    #[tokio::test]
    async fn get_profile_maps_failure_to_fallback_message() {
        let transport = SingleResponse {
            response: ApiResponse::new(500, b"oops".to_vec()),
            requests: Mutex::new(Vec::new()),
        };
        let client = ApiClient::with_transport(
            &transport,
            "https://api.test/api",
            SessionStore::in_memory(),
        );

        let err = get_profile(&client).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch profile");
    }
}
