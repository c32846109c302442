use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{Session, SessionReader};
use crate::cache::FetchCache;
use crate::error::ClientResult;
use crate::nav::{Navigator, Route};
use crate::state::AppContext;
use crate::views::{avatar, avatar_key, Mount, MountHandle};

/// Side navigation: menu entries, the user's avatar and role badge.
pub struct NavDrawer {
    client: ApiClient,
    session: SessionReader,
    navigator: Navigator,
    avatars: Arc<FetchCache<String>>,
    mount: Mount,
    profile_pic: String,
    seen_version: Option<u64>,
    open: bool,
}

impl NavDrawer {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: ctx.client.clone(),
            session: ctx.session.reader(),
            navigator: ctx.navigator.clone(),
            avatars: ctx.avatars.clone(),
            mount: Mount::new(),
            profile_pic: String::new(),
            seen_version: None,
            open: false,
        }
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mount.handle()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn profile_pic(&self) -> &str {
        &self.profile_pic
    }

    pub fn badge(&self) -> Option<&'static str> {
        if !self.session.is_authenticated() {
            return None;
        }
        Some(if self.session.is_admin() { "admin" } else { "veteran" })
    }

    pub fn menu(&self) -> Vec<(&'static str, Route)> {
        let mut items = vec![("Home", Route::Home)];
        if self.session.is_authenticated() {
            items.extend([
                ("Feed", Route::Feed),
                ("Groups", Route::Groups),
                ("Tasks", Route::Fitness),
                ("Users", Route::Users),
            ]);
            if self.session.is_admin() {
                items.push(("Dashboard", Route::Dashboard));
            }
        } else {
            items.extend([("Login", Route::Login), ("Register", Route::Register)]);
        }
        items
    }

    pub fn select(&mut self, route: Route) {
        self.navigator.redirect(route);
        self.close();
    }

    /// Refetch the avatar when the profile version moved since last time.
    pub async fn sync_profile_pic(&mut self) {
        let state = self.session.snapshot();
        if self.seen_version == Some(state.profile_version) {
            return;
        }
        let Some(username) = state.username else {
            self.profile_pic.clear();
            self.seen_version = Some(state.profile_version);
            return;
        };

        if self.seen_version.is_some() {
            if let Some(key) = avatar_key(&self.client, &username) {
                self.avatars.invalidate(&key);
            }
        }
        let pic = avatar(&self.client, &self.avatars, &username).await;
        if !self.mount.is_live() {
            return;
        }
        self.profile_pic = pic;
        self.seen_version = Some(state.profile_version);
    }

    pub async fn logout(&mut self, session: &Session) -> ClientResult<()> {
        session.logout().await?;
        self.profile_pic.clear();
        self.close();
        Ok(())
    }
}
