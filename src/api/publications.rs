//! Publication CRUD and status transitions.
//!
//! Each operation is a thin wrapper over `ApiClient::send`: method, path
//! and body, an `ok` check, and a per-operation fallback message when the
//! error body carries no usable `message`.

use super::client::{ApiClient, RequestSpec};
use super::http::{ApiResponse, HttpTransport};
use super::types::{
    CreatePublicationRequest, Publication, PublicationFilter, UpdatePublicationRequest,
};
use super::ApiError;

fn decode_publication(resp: &ApiResponse, fallback: &str) -> Result<Publication, ApiError> {
    if !resp.ok() {
        return Err(ApiError::from_response(resp, fallback));
    }
    Ok(resp.json()?)
}

/// GET /publications: the public feed.
pub async fn list<T: HttpTransport>(client: &ApiClient<T>) -> Result<Vec<Publication>, ApiError> {
    let resp = client.send("/publications", RequestSpec::get(), None).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to fetch publications"));
    }
    Ok(resp.json()?)
}

/// GET /publications/{id}.
pub async fn get<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
) -> Result<Publication, ApiError> {
    let resp = client
        .send(&format!("/publications/{}", id), RequestSpec::get(), None)
        .await?;
    decode_publication(&resp, "Failed to fetch publication")
}

/// GET /publications/my: everything owned by the current user.
pub async fn list_mine<T: HttpTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<Publication>, ApiError> {
    let resp = client
        .send("/publications/my", RequestSpec::get(), None)
        .await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to fetch my publications"));
    }
    Ok(resp.json()?)
}

/// GET /publications/my/filter/{type}.
pub async fn list_mine_filtered<T: HttpTransport>(
    client: &ApiClient<T>,
    filter: PublicationFilter,
) -> Result<Vec<Publication>, ApiError> {
    let path = format!("/publications/my/filter/{}", filter.as_path_segment());
    let resp = client.send(&path, RequestSpec::get(), None).await?;
    if !resp.ok() {
        return Err(ApiError::from_response(
            &resp,
            "Failed to fetch filtered publications",
        ));
    }
    Ok(resp.json()?)
}

/// POST /publications.
pub async fn create<T: HttpTransport>(
    client: &ApiClient<T>,
    request: &CreatePublicationRequest,
) -> Result<Publication, ApiError> {
    let spec = RequestSpec::post().json(request)?;
    let resp = client.send("/publications", spec, None).await?;
    decode_publication(&resp, "Failed to create publication")
}

/// PUT /publications/{id}.
pub async fn update<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
    request: &UpdatePublicationRequest,
) -> Result<Publication, ApiError> {
    let spec = RequestSpec::put().json(request)?;
    let resp = client.send(&format!("/publications/{}", id), spec, None).await?;
    decode_publication(&resp, "Failed to update publication")
}

/// DELETE /publications/{id}.
pub async fn delete<T: HttpTransport>(client: &ApiClient<T>, id: &str) -> Result<(), ApiError> {
    let resp = client
        .send(&format!("/publications/{}", id), RequestSpec::delete(), None)
        .await?;
    if !resp.ok() {
        return Err(ApiError::from_response(&resp, "Failed to delete publication"));
    }
    Ok(())
}

async fn transition<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
    verb: &str,
    fallback: &str,
) -> Result<Publication, ApiError> {
    let path = format!("/publications/{}/{}", id, verb);
    let resp = client.send(&path, RequestSpec::put(), None).await?;
    decode_publication(&resp, fallback)
}

/// PUT /publications/{id}/archive.
pub async fn archive<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
) -> Result<Publication, ApiError> {
    transition(client, id, "archive", "Failed to archive publication").await
}

/// PUT /publications/{id}/publish.
pub async fn publish<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
) -> Result<Publication, ApiError> {
    transition(client, id, "publish", "Failed to publish publication").await
}

/// PUT /publications/{id}/reject.
pub async fn reject<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
) -> Result<Publication, ApiError> {
    transition(client, id, "reject", "Failed to reject publication").await
}

/// PUT /publications/{id}/review: submit for moderation.
pub async fn review<T: HttpTransport>(
    client: &ApiClient<T>,
    id: &str,
) -> Result<Publication, ApiError> {
    transition(client, id, "review", "Failed to submit publication for review").await
}
