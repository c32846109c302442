use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;

use crate::api::models::Comment;
use crate::api::{comments, ApiClient};
use crate::auth::SessionReader;
use crate::cache::FetchCache;
use crate::error::ClientError;
use crate::notice::Notifier;
use crate::state::AppContext;
use crate::views::{avatar, Mount, MountHandle};

/// Comment thread under one post.
pub struct CommentsView {
    client: ApiClient,
    session: SessionReader,
    notifier: Notifier,
    avatars: Arc<FetchCache<String>>,
    mount: Mount,
    post_id: String,
    comments: Vec<Comment>,
    draft: String,
    loading: bool,
}

impl CommentsView {
    pub fn new(ctx: &AppContext, post_id: impl Into<String>) -> Self {
        Self {
            client: ctx.client.clone(),
            session: ctx.session.reader(),
            notifier: ctx.notifier.clone(),
            avatars: ctx.avatars.clone(),
            mount: Mount::new(),
            post_id: post_id.into(),
            comments: Vec::new(),
            draft: String::new(),
            loading: false,
        }
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mount.handle()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn can_delete(&self, comment: &Comment) -> bool {
        match (comment.author.as_deref(), self.session.username()) {
            (Some(author), Some(me)) => author == me,
            _ => false,
        }
    }

    /// Fetch the thread, then each distinct author's avatar concurrently.
    pub async fn load(&mut self) {
        self.loading = true;
        let result = comments::get_comments(&self.client, &self.post_id).await;

        let loaded = match result {
            Ok(mut thread) => {
                let authors: BTreeSet<String> =
                    thread.iter().filter_map(|c| c.author.clone()).collect();
                let pics = join_all(authors.into_iter().map(|author| {
                    let client = &self.client;
                    let avatars = &self.avatars;
                    async move {
                        let pic = avatar(client, avatars, &author).await;
                        (author, pic)
                    }
                }))
                .await;
                let pics: HashMap<String, String> = pics.into_iter().collect();

                for comment in &mut thread {
                    comment.profile_pic = comment
                        .author
                        .as_ref()
                        .and_then(|a| pics.get(a).cloned());
                }
                Some(thread)
            }
            Err(e) => {
                tracing::error!("Failed to fetch comments for {}: {}", self.post_id, e);
                None
            }
        };

        if !self.mount.is_live() {
            return;
        }
        if let Some(thread) = loaded {
            self.comments = thread;
        }
        self.loading = false;
    }

    /// Post the draft. Blank drafts are ignored.
    pub async fn add_comment(&mut self) -> bool {
        let content = self.draft.trim().to_string();
        if content.is_empty() {
            return false;
        }
        let Some(username) = self.session.username() else {
            self.notifier
                .push(ClientError::Unauthorized.notice("Log in to comment"));
            return false;
        };

        let result = comments::post_comment(&self.client, &self.post_id, &username, &content).await;
        let result = match result {
            Ok(comment) => Ok((comment, avatar(&self.client, &self.avatars, &username).await)),
            Err(e) => Err(e),
        };

        if !self.mount.is_live() {
            return false;
        }
        match result {
            Ok((mut comment, pic)) => {
                comment.profile_pic = Some(pic);
                self.comments.push(comment);
                self.draft.clear();
                true
            }
            Err(e) => {
                self.notifier.push(e.notice("Failed to add comment"));
                false
            }
        }
    }

    /// Delete one of your own comments once the server agrees.
    pub async fn delete_comment(&mut self, comment_id: &str) -> bool {
        let owned = self
            .comments
            .iter()
            .find(|c| c.comment_id == comment_id)
            .map(|c| self.can_delete(c));
        if owned != Some(true) {
            return false;
        }

        let result = comments::delete_comment(&self.client, comment_id).await;
        if !self.mount.is_live() {
            return false;
        }
        match result {
            Ok(()) => {
                self.comments.retain(|c| c.comment_id != comment_id);
                true
            }
            Err(e) => {
                self.notifier.push(e.notice("Failed to delete comment"));
                false
            }
        }
    }
}
