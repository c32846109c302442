use crate::api::client::{ApiClient, ApiRequest};
use crate::api::models::{Ack, LikeRequest, Post, Trending};
use crate::error::ClientResult;

pub const POSTS_PATH: &str = "/posts";

pub async fn get_posts(client: &ApiClient) -> ClientResult<Vec<Post>> {
    client.get_json(POSTS_PATH).await
}

/// Server-side topic filter. Returns posts tagged with any of `topics`.
pub async fn get_filtered_posts(client: &ApiClient, topics: &[String]) -> ClientResult<Vec<Post>> {
    let request = topics
        .iter()
        .fold(ApiRequest::get("/posts/filter"), |req, topic| {
            req.query("topics", topic.as_str())
        });
    client.send_json(request).await.map_err(|e| {
        tracing::error!("Error fetching filtered posts: {}", e);
        e
    })
}

pub async fn get_trending(client: &ApiClient) -> ClientResult<Trending> {
    client.get_json("/posts/trending").await
}

/// Toggle `username`'s like on a post.
pub async fn toggle_like(client: &ApiClient, post_id: &str, username: &str) -> ClientResult<Ack> {
    let request =
        ApiRequest::post(format!("/posts/{}/like", post_id)).json(&LikeRequest { username })?;
    client.send_json(request).await
}

pub async fn delete_post(client: &ApiClient, post_id: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::delete(format!("/posts/{}", post_id)))
        .await
        .map_err(|e| {
            tracing::error!("Error deleting post {}: {}", post_id, e);
            e
        })
}
