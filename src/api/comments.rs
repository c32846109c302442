use crate::api::client::{ApiClient, ApiRequest};
use crate::api::models::{Comment, NewComment};
use crate::error::ClientResult;

pub async fn get_comments(client: &ApiClient, post_id: &str) -> ClientResult<Vec<Comment>> {
    client.get_json(&format!("/posts/{}/comments", post_id)).await
}

/// Returns the stored comment as the server echoes it back.
pub async fn post_comment(
    client: &ApiClient,
    post_id: &str,
    author: &str,
    content: &str,
) -> ClientResult<Comment> {
    let request = ApiRequest::post(format!("/posts/{}/comments", post_id))
        .json(&NewComment { author, content })?;
    client.send_json(request).await
}

pub async fn delete_comment(client: &ApiClient, comment_id: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::delete(format!("/comments/{}", comment_id)))
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete comment with ID {}: {}", comment_id, e);
            e
        })
}
