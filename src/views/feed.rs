use std::sync::Arc;

use crate::api::models::{sort_newest_first, Post, Trending};
use crate::api::posts::{self, POSTS_PATH};
use crate::api::ApiClient;
use crate::auth::SessionReader;
use crate::cache::{FetchCache, Mutation};
use crate::error::{ClientError, ClientResult};
use crate::notice::{Notice, Notifier};
use crate::state::AppContext;
use crate::views::{Mount, MountHandle, OptimisticList, SyncState};

/// The post feed: cached post list, topic filter, likes and deletion.
pub struct FeedView {
    client: ApiClient,
    session: SessionReader,
    notifier: Notifier,
    cache: Arc<FetchCache<Vec<Post>>>,
    mount: Mount,
    topics: Vec<String>,
    selected: Vec<String>,
    posts: OptimisticList<Post>,
    trending: Trending,
    trending_loading: bool,
    load_failed: bool,
}

impl FeedView {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: ctx.client.clone(),
            session: ctx.session.reader(),
            notifier: ctx.notifier.clone(),
            cache: ctx.posts.clone(),
            mount: Mount::new(),
            topics: ctx.config.feed.topics.clone(),
            selected: Vec::new(),
            posts: OptimisticList::default(),
            trending: Trending::default(),
            trending_loading: false,
            load_failed: false,
        }
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mount.handle()
    }

    /// Posts as displayed, newest first.
    pub fn posts(&self) -> &[Post] {
        self.posts.items()
    }

    pub fn post(&self, post_id: &str) -> Option<&Post> {
        self.posts.get(post_id)
    }

    pub fn state(&self, post_id: &str) -> SyncState {
        self.posts.state(post_id)
    }

    pub fn available_topics(&self) -> &[String] {
        &self.topics
    }

    pub fn selected_topics(&self) -> &[String] {
        &self.selected
    }

    pub fn trending(&self) -> &Trending {
        &self.trending
    }

    pub fn is_loading_trending(&self) -> bool {
        self.trending_loading
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn is_liked(&self, post_id: &str) -> bool {
        match (self.posts.get(post_id), self.session.username()) {
            (Some(post), Some(username)) => post.is_liked_by(&username),
            _ => false,
        }
    }

    /// Authors may delete their own posts; administrators may delete any.
    pub fn can_delete(&self, post: &Post) -> bool {
        self.session.is_admin() || self.session.username().as_deref() == Some(post.author.as_str())
    }

    fn posts_key(&self) -> ClientResult<String> {
        Ok(self.client.url(POSTS_PATH)?.to_string())
    }

    fn fetch_sorted(&self) -> impl std::future::Future<Output = ClientResult<Vec<Post>>> + Send + 'static {
        let client = self.client.clone();
        async move {
            let mut posts = posts::get_posts(&client).await?;
            sort_newest_first(&mut posts);
            Ok(posts)
        }
    }

    /// Read the post list through the cache.
    pub async fn load(&mut self) {
        let result = match self.posts_key() {
            Ok(key) => {
                let fetch = self.fetch_sorted();
                self.cache.read(&key, move || fetch).await
            }
            Err(e) => Err(e),
        };
        if !self.mount.is_live() {
            tracing::debug!("Feed unmounted, dropping post list");
            return;
        }

        match result {
            Ok(mut posts) => {
                sort_newest_first(&mut posts);
                self.load_failed = false;
                if self.selected.is_empty() {
                    self.posts.replace_all(posts);
                }
            }
            Err(e) => {
                self.load_failed = true;
                self.notifier
                    .push(e.notice("Failed to load posts. Please try again later."));
            }
        }
    }

    pub fn toggle_topic(&mut self, topic: &str) {
        if let Some(i) = self.selected.iter().position(|t| t == topic) {
            self.selected.remove(i);
        } else {
            self.selected.push(topic.to_string());
        }
    }

    /// Show every cached post when no topic is selected, otherwise the
    /// server's filtered result. Both are sorted newest first.
    pub async fn apply_filter(&mut self) {
        if self.selected.is_empty() {
            let cached = self
                .posts_key()
                .ok()
                .and_then(|key| self.cache.peek(&key));
            match cached {
                Some(mut posts) => {
                    sort_newest_first(&mut posts);
                    self.posts.replace_all(posts);
                }
                None => self.load().await,
            }
            return;
        }

        let result = posts::get_filtered_posts(&self.client, &self.selected).await;
        if !self.mount.is_live() {
            return;
        }
        match result {
            Ok(mut posts) => {
                sort_newest_first(&mut posts);
                self.posts.replace_all(posts);
            }
            Err(e) => self
                .notifier
                .push(e.notice("Failed to filter posts. Please try again.")),
        }
    }

    /// Fresh server state for whatever the feed is showing. The unfiltered
    /// list is written back to the cache without triggering revalidation.
    async fn fetch_authoritative(&self) -> ClientResult<Vec<Post>> {
        let all = self
            .cache
            .mutate(&self.posts_key()?, Mutation::recompute(self.fetch_sorted()), false)
            .await?;

        if self.selected.is_empty() {
            return Ok(all);
        }
        let mut filtered = posts::get_filtered_posts(&self.client, &self.selected).await?;
        sort_newest_first(&mut filtered);
        Ok(filtered)
    }

    /// Re-fetch after an outside change (for example a newly created post).
    pub async fn refresh(&mut self) {
        let result = self.fetch_authoritative().await;
        if !self.mount.is_live() {
            return;
        }
        match result {
            Ok(posts) => self.posts.replace_all(posts),
            Err(e) => tracing::error!("Error fetching new posts: {}", e),
        }
    }

    pub async fn load_trending(&mut self) {
        self.trending_loading = true;
        let result = posts::get_trending(&self.client).await;
        if !self.mount.is_live() {
            return;
        }
        match result {
            Ok(trending) => {
                self.trending = trending;
                if let Ok(key) = self.posts_key() {
                    self.cache.invalidate(&key);
                }
            }
            Err(e) => self.notifier.push(e.notice("Failed to load trending data")),
        }
        self.trending_loading = false;
    }

    /// Like or unlike a post. The count moves by one immediately and is then
    /// replaced by the server's figure.
    pub async fn toggle_like(&mut self, post_id: &str) -> SyncState {
        let Some(username) = self.session.username() else {
            return SyncState::Synced;
        };

        let ticket = self.posts.begin_update(post_id, |post| {
            if let Some(i) = post.liked_by.iter().position(|u| *u == username) {
                post.liked_by.remove(i);
                post.likes -= 1;
            } else {
                post.liked_by.push(username.clone());
                post.likes += 1;
            }
        });
        let Some(ticket) = ticket else {
            return SyncState::Synced;
        };

        let result = posts::toggle_like(&self.client, post_id, &username).await;
        let outcome = match result {
            Ok(ack) if ack.success => Ok(self.fetch_authoritative().await),
            Ok(_) => Err(ClientError::Internal("like was not recorded".to_string())),
            Err(e) => Err(e),
        };

        if !self.mount.is_live() {
            return SyncState::OptimisticPending;
        }
        match outcome {
            Ok(Ok(authoritative)) => {
                self.posts.reconcile(ticket, authoritative);
            }
            Ok(Err(e)) => {
                tracing::warn!("Like saved but refresh failed: {}", e);
                self.posts.confirm(ticket);
            }
            Err(e) => {
                tracing::error!("Error toggling like: {}", e);
                self.posts.rollback(ticket);
                self.notifier.push(e.notice("Failed to update like"));
            }
        }
        self.posts.state(post_id)
    }

    /// Remove a post right away, then confirm with the server.
    pub async fn delete_post(&mut self, post_id: &str) -> SyncState {
        let allowed = self.posts.get(post_id).map(|p| self.can_delete(p));
        match allowed {
            None => return SyncState::Synced,
            Some(false) => {
                self.notifier.push(
                    ClientError::Forbidden("You can only delete your own posts".into())
                        .notice("Failed to delete post"),
                );
                return SyncState::Synced;
            }
            Some(true) => {}
        }

        let Some(ticket) = self.posts.begin_remove(post_id) else {
            return SyncState::Synced;
        };

        let result = posts::delete_post(&self.client, post_id).await;
        let refreshed = match result {
            Ok(()) => Ok(self.fetch_authoritative().await),
            Err(e) => Err(e),
        };

        if !self.mount.is_live() {
            return SyncState::OptimisticPending;
        }
        match refreshed {
            Ok(fresh) => {
                self.notifier
                    .push(Notice::success("Success", "Post deleted successfully"));
                match fresh {
                    Ok(posts) => self.posts.reconcile(ticket, posts),
                    Err(e) => {
                        tracing::warn!("Post deleted but refresh failed: {}", e);
                        self.posts.confirm(ticket)
                    }
                };
            }
            Err(e) => {
                self.posts.rollback(ticket);
                self.notifier
                    .push(e.notice("Failed to delete post. Please try again."));
            }
        }
        self.posts.state(post_id)
    }
}
