//! In-process fake of the community backend, served by axum on an
//! ephemeral port so the real HTTP client can be driven against it.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use vetsoc::api::models::{Comment, FitnessTask, Post};
use vetsoc::config::Config;
use vetsoc::db::{self, keys, LocalStore, SqliteLocalStore};
use vetsoc::state::AppContext;

pub const GOOD_TOKEN: &str = "fresh-token";
pub const STALE_TOKEN: &str = "stale-token";

#[derive(Default)]
pub struct Backend {
    pub valid_token: String,
    pub refresh_ok: bool,
    pub refresh_calls: usize,
    pub refreshed_token: String,
    pub requests: Vec<(String, Option<String>)>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub tasks: Vec<FitnessTask>,
    pub avatars: Vec<(String, String)>,
    pub admins: Vec<String>,
    pub fail_like: bool,
    pub fail_delete: bool,
    pub fail_toggle: bool,
    pub like_delay: Option<Duration>,
    pub verify_tokens: Vec<String>,
    pub known_emails: Vec<String>,
    pub next_id: usize,
}

pub type Shared = Arc<Mutex<Backend>>;

impl Backend {
    pub fn new() -> Self {
        Self {
            valid_token: GOOD_TOKEN.to_string(),
            refreshed_token: GOOD_TOKEN.to_string(),
            refresh_ok: true,
            ..Default::default()
        }
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.iter().filter(|(p, _)| p == path).count()
    }
}

pub fn sample_post(id: &str, author: &str, ts: &str, topics: &[&str]) -> Post {
    Post {
        post_id: id.to_string(),
        author: author.to_string(),
        content: format!("post {}", id),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        images: vec![],
        likes: 0,
        liked_by: vec![],
        timestamp: ts.to_string(),
    }
}

pub fn sample_task(id: &str, owner: &str, done: bool) -> FitnessTask {
    FitnessTask {
        username: owner.to_string(),
        task_id: id.to_string(),
        description: format!("task {}", id),
        is_finished: done,
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

/// Record the call and reject it unless it carries the valid token.
fn guard(state: &Shared, path: String, headers: &HeaderMap) -> Result<(), Response> {
    let mut backend = state.lock().unwrap();
    let token = bearer(headers);
    let ok = token.as_deref() == Some(backend.valid_token.as_str());
    backend.requests.push((path, token));
    if ok {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response())
    }
}

fn fail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn refresh(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    backend.refresh_calls += 1;
    let presented = bearer(&headers);
    if backend.refresh_ok && presented.is_some() {
        Json(json!({ "access_token": backend.refreshed_token })).into_response()
    } else {
        fail(StatusCode::UNAUTHORIZED, "Refresh token expired")
    }
}

async fn login(State(state): State<Shared>, Json(body): Json<serde_json::Value>) -> Response {
    let backend = state.lock().unwrap();
    if body["password"] == "hunter2" {
        Json(json!({ "access_token": backend.valid_token, "token_type": "bearer" })).into_response()
    } else {
        fail(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn get_user(State(state): State<Shared>, Path(username): Path<String>) -> Response {
    let backend = state.lock().unwrap();
    let is_veteran = !backend.admins.contains(&username);
    Json(json!({ "username": username, "isVeteran": is_veteran })).into_response()
}

async fn profile_pic(State(state): State<Shared>, Path(username): Path<String>) -> Response {
    let backend = state.lock().unwrap();
    let pic = backend
        .avatars
        .iter()
        .find(|(u, _)| *u == username)
        .map(|(_, p)| p.clone());
    Json(json!({ "profilePic": pic })).into_response()
}

async fn list_posts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(r) = guard(&state, "/posts".into(), &headers) {
        return r;
    }
    Json(state.lock().unwrap().posts.clone()).into_response()
}

async fn filter_posts(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    if let Err(r) = guard(&state, "/posts/filter".into(), &headers) {
        return r;
    }
    let topics: Vec<String> = params
        .into_iter()
        .filter(|(k, _)| k == "topics")
        .map(|(_, v)| v)
        .collect();
    let posts: Vec<Post> = state
        .lock()
        .unwrap()
        .posts
        .iter()
        .filter(|p| p.topics.iter().any(|t| topics.contains(t)))
        .cloned()
        .collect();
    Json(posts).into_response()
}

async fn trending(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(r) = guard(&state, "/posts/trending".into(), &headers) {
        return r;
    }
    Json(json!({ "topics": ["Employment"], "keywords": ["resume", "housing"] })).into_response()
}

async fn like(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Err(r) = guard(&state, format!("/posts/{}/like", post_id), &headers) {
        return r;
    }
    let delay = state.lock().unwrap().like_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut backend = state.lock().unwrap();
    if backend.fail_like {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Like service unavailable");
    }
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let Some(post) = backend.posts.iter_mut().find(|p| p.post_id == post_id) else {
        return fail(StatusCode::NOT_FOUND, "Post not found");
    };
    if let Some(i) = post.liked_by.iter().position(|u| *u == username) {
        post.liked_by.remove(i);
    } else {
        post.liked_by.push(username);
    }
    // The server count is derived from membership only.
    post.likes = post.liked_by.len() as i64;
    Json(json!({ "success": true })).into_response()
}

async fn delete_post(State(state): State<Shared>, headers: HeaderMap, Path(post_id): Path<String>) -> Response {
    if let Err(r) = guard(&state, format!("/posts/{}", post_id), &headers) {
        return r;
    }
    let mut backend = state.lock().unwrap();
    if backend.fail_delete {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Delete failed");
    }
    backend.posts.retain(|p| p.post_id != post_id);
    Json(json!({ "message": "Post deleted" })).into_response()
}

async fn list_comments(State(state): State<Shared>, headers: HeaderMap, Path(post_id): Path<String>) -> Response {
    if let Err(r) = guard(&state, format!("/posts/{}/comments", post_id), &headers) {
        return r;
    }
    let comments: Vec<Comment> = state
        .lock()
        .unwrap()
        .comments
        .iter()
        .filter(|c| c.post_id == post_id)
        .cloned()
        .collect();
    Json(comments).into_response()
}

async fn add_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Err(r) = guard(&state, format!("/posts/{}/comments", post_id), &headers) {
        return r;
    }
    let mut backend = state.lock().unwrap();
    let comment = Comment {
        comment_id: backend.id("c"),
        post_id,
        author: body["author"].as_str().map(|s| s.to_string()),
        content: body["content"].as_str().unwrap_or_default().to_string(),
        profile_pic: None,
    };
    backend.comments.push(comment.clone());
    Json(comment).into_response()
}

async fn delete_comment(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(r) = guard(&state, format!("/comments/{}", id), &headers) {
        return r;
    }
    state.lock().unwrap().comments.retain(|c| c.comment_id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_tasks(State(state): State<Shared>, headers: HeaderMap, Path(username): Path<String>) -> Response {
    if let Err(r) = guard(&state, format!("/fitness/{}", username), &headers) {
        return r;
    }
    let tasks: Vec<FitnessTask> = state
        .lock()
        .unwrap()
        .tasks
        .iter()
        .filter(|t| t.username == username)
        .cloned()
        .collect();
    if tasks.is_empty() && username == "ghost" {
        return fail(StatusCode::NOT_FOUND, "User not found");
    }
    Json(tasks).into_response()
}

async fn check_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((username, task_id)): Path<(String, String)>,
) -> Response {
    if let Err(r) = guard(&state, format!("/fitness/{}/{}/check", username, task_id), &headers) {
        return r;
    }
    let mut backend = state.lock().unwrap();
    if backend.fail_toggle {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Update failed");
    }
    match backend
        .tasks
        .iter_mut()
        .find(|t| t.username == username && t.task_id == task_id)
    {
        Some(task) => {
            task.is_finished = !task.is_finished;
            Json(json!({ "Attributes": { "is_finished": task.is_finished } })).into_response()
        }
        None => fail(StatusCode::NOT_FOUND, "Task not found"),
    }
}

async fn add_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Err(r) = guard(&state, format!("/fitness/{}/task/add", username), &headers) {
        return r;
    }
    let mut backend = state.lock().unwrap();
    let task = FitnessTask {
        username,
        task_id: backend.id("t"),
        description: body["description"].as_str().unwrap_or_default().to_string(),
        is_finished: false,
    };
    backend.tasks.push(task.clone());
    Json(task).into_response()
}

async fn delete_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((username, task_id)): Path<(String, String)>,
) -> Response {
    if let Err(r) = guard(&state, format!("/fitness/{}/{}/delete", username, task_id), &headers) {
        return r;
    }
    let mut backend = state.lock().unwrap();
    if backend.fail_delete {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Delete failed");
    }
    backend
        .tasks
        .retain(|t| !(t.username == username && t.task_id == task_id));
    Json(json!({ "message": "Task deleted successfully" })).into_response()
}

async fn delete_user(State(state): State<Shared>, headers: HeaderMap, Path(username): Path<String>) -> Response {
    if let Err(r) = guard(&state, format!("/users/admin/{}", username), &headers) {
        return r;
    }
    Json(json!({ "message": format!("User {} deleted", username) })).into_response()
}

async fn delete_group(State(state): State<Shared>, headers: HeaderMap, Path(group_id): Path<String>) -> Response {
    if let Err(r) = guard(&state, format!("/groups/{}", group_id), &headers) {
        return r;
    }
    Json(json!({ "message": "Group deleted" })).into_response()
}

async fn delete_group_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((group_id, post_id)): Path<(String, String)>,
) -> Response {
    if let Err(r) = guard(&state, format!("/groups/{}/posts/{}", group_id, post_id), &headers) {
        return r;
    }
    Json(json!({ "message": "Post removed" })).into_response()
}

async fn verify_email(State(state): State<Shared>, Query(params): Query<Vec<(String, String)>>) -> Response {
    let backend = state.lock().unwrap();
    let token = params
        .into_iter()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v)
        .unwrap_or_default();
    if backend.verify_tokens.contains(&token) {
        Json(json!({ "message": "Email verified successfully" })).into_response()
    } else {
        fail(StatusCode::BAD_REQUEST, "Invalid or expired verification token")
    }
}

async fn resend_verification(
    State(state): State<Shared>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let backend = state.lock().unwrap();
    let email = params
        .into_iter()
        .find(|(k, _)| k == "email")
        .map(|(_, v)| v)
        .unwrap_or_default();
    if backend.known_emails.contains(&email) {
        Json(json!({ "message": "sent" })).into_response()
    } else {
        fail(StatusCode::NOT_FOUND, "No account with that email")
    }
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/users/auth/refresh", post(refresh))
        .route("/users/login", post(login))
        .route("/users/verify-email", get(verify_email))
        .route("/users/resend-verification", post(resend_verification))
        .route("/users/admin/{username}", delete(delete_user))
        .route("/users/{username}", get(get_user))
        .route("/users/{username}/profile-pic", get(profile_pic))
        .route("/posts", get(list_posts))
        .route("/posts/filter", get(filter_posts))
        .route("/posts/trending", get(trending))
        .route("/posts/{post_id}", delete(delete_post))
        .route("/posts/{post_id}/like", post(like))
        .route("/posts/{post_id}/comments", get(list_comments).post(add_comment))
        .route("/comments/{comment_id}", delete(delete_comment))
        .route("/groups/{group_id}", delete(delete_group))
        .route("/groups/{group_id}/posts/{post_id}", delete(delete_group_post))
        .route("/fitness/{username}", get(list_tasks))
        .route("/fitness/{username}/{task_id}/check", post(check_task))
        .route("/fitness/{username}/task/add", post(add_task))
        .route("/fitness/{username}/{task_id}/delete", delete(delete_task))
        .with_state(state)
}

/// Serve `backend` on an ephemeral port. Returns the base URL.
pub async fn spawn(backend: Backend) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(backend));
    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

pub fn memory_store() -> Arc<dyn LocalStore> {
    let pool = db::memory_pool().unwrap();
    db::run_migrations(&pool).unwrap();
    Arc::new(SqliteLocalStore::new(pool))
}

/// Client context against `base` with a persisted session for `user`.
pub async fn context(base: &str, user: Option<(&str, bool)>, token: &str) -> AppContext {
    let store = memory_store();
    if !token.is_empty() {
        store.set(keys::AUTH_TOKEN, token).await.unwrap();
    }
    if let Some((username, is_admin)) = user {
        store.set(keys::USERNAME, username).await.unwrap();
        store
            .set(keys::IS_ADMIN, if is_admin { "true" } else { "false" })
            .await
            .unwrap();
    }

    let mut config = Config::default();
    config.api.base_url = base.to_string();
    config.api.timeout_secs = 5;
    config.ui.redirect_delay_secs = 0;
    AppContext::with_store(config, store).await.unwrap()
}
