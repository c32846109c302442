use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

use crate::api::models::{ErrorBody, TokenResponse};
use crate::auth::Session;
use crate::db::keys;
use crate::error::{ClientError, ClientResult};

pub const REFRESH_PATH: &str = "/users/auth/refresh";

/// One outbound call. Kept around so it can be re-issued after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// HTTP client for the backend. Attaches the persisted bearer token and
/// recovers from a 401 with a single refresh-and-retry. When that fails the
/// session is ended and the user is sent to login.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: Session,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> ClientResult<Self> {
        let base = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        Ok(Self {
            http,
            base,
            session,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a path on the backend, used as the cache key too.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.execute(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send and discard the body.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<()> {
        self.execute(request).await?;
        Ok(())
    }

    /// Issue a request, refreshing the token once on 401.
    pub async fn execute(&self, mut request: ApiRequest) -> ClientResult<Response> {
        loop {
            let token = self.token().await?;
            let response = self.dispatch(&request, token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return check_status(response).await;
            }

            if request.retried {
                tracing::warn!("{} {} still unauthorized after refresh", request.method, request.path);
                self.session.expire().await?;
                return Err(ClientError::Unauthorized);
            }
            request.retried = true;

            if let Err(e) = self.refresh(token.as_deref()).await {
                tracing::warn!("Token refresh failed: {}", e);
                self.session.expire().await?;
                return Err(e);
            }
        }
    }

    async fn token(&self) -> ClientResult<Option<String>> {
        Ok(self.session.store().get(keys::AUTH_TOKEN).await?)
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        let url = self.url(&request.path)?;
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Exchange the expiring token for a new one. Concurrent callers that
    /// failed with the same token share a single refresh.
    async fn refresh(&self, failed_token: Option<&str>) -> ClientResult<()> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.token().await?;
        if current.is_some() && current.as_deref() != failed_token {
            tracing::debug!("Token already refreshed by another request");
            return Ok(());
        }

        let mut builder = self.http.post(self.url(REFRESH_PATH)?);
        if let Some(ref token) = current {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Unauthorized);
        }

        let refreshed: TokenResponse = response.json().await?;
        self.session
            .store()
            .set(keys::AUTH_TOKEN, &refreshed.access_token)
            .await?;
        tracing::info!("Access token refreshed");
        Ok(())
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message());
    Err(ClientError::from_status(status, detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, SqliteLocalStore};
    use crate::nav::Navigator;

    fn client(base: &str) -> ApiClient {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        let session = Session::new(Arc::new(SqliteLocalStore::new(pool)), Navigator::new());
        ApiClient::new(base, Duration::from_secs(1), session).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("http://localhost:8000/");
        assert_eq!(c.url("/posts").unwrap().as_str(), "http://localhost:8000/posts");
        assert_eq!(c.url("posts").unwrap().as_str(), "http://localhost:8000/posts");
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let c = client("https://example.org/api");
        assert_eq!(
            c.url("/fitness/alice").unwrap().as_str(),
            "https://example.org/api/fitness/alice"
        );
    }

    #[test]
    fn request_builder_collects_query_and_body() {
        let req = ApiRequest::get("/posts/filter")
            .query("topics", "Shelter")
            .query("topics", "Employment");
        assert_eq!(req.query.len(), 2);
        assert!(!req.retried);

        let req = ApiRequest::post("/posts/p1/like")
            .json(&serde_json::json!({"username": "alice"}))
            .unwrap();
        assert_eq!(req.body.unwrap()["username"], "alice");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let c = client("http://127.0.0.1:9");
        let err = c.get_json::<serde_json::Value>("/posts").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)), "got {:?}", err);
    }
}
