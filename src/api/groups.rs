use crate::api::client::{ApiClient, ApiRequest};
use crate::error::ClientResult;

pub async fn delete_group(client: &ApiClient, group_id: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::delete(format!("/groups/{}", group_id)))
        .await
        .map_err(|e| {
            tracing::error!("Error deleting group {}: {}", group_id, e);
            e
        })
}

pub async fn delete_group_post(client: &ApiClient, group_id: &str, post_id: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::delete(format!("/groups/{}/posts/{}", group_id, post_id)))
        .await
        .map_err(|e| {
            tracing::error!("Error deleting post {} from group {}: {}", post_id, group_id, e);
            e
        })
}
