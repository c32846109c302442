use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::{users, ApiClient};
use crate::db::{keys, LocalStore};
use crate::error::ClientResult;
use crate::nav::{Navigator, Route};

/// Who is logged in. Lives for the process; only the token is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub username: Option<String>,
    pub is_admin: bool,
    /// Bumped whenever derived profile data (avatar) must be refetched.
    pub profile_version: u64,
}

/// Read-only view of the session handed to views.
#[derive(Debug, Clone)]
pub struct SessionReader {
    state: Arc<RwLock<SessionState>>,
}

impl SessionReader {
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn username(&self) -> Option<String> {
        self.read().username.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().username.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.read().is_admin
    }

    pub fn profile_version(&self) -> u64 {
        self.read().profile_version
    }
}

/// Owner of the session. Only this handle can log in, log out or bump the
/// profile version. The HTTP client keeps a clone so it can end the session
/// when the backend stops accepting the token.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    store: Arc<dyn LocalStore>,
    navigator: Navigator,
}

impl Session {
    /// Rebuild the session from persisted state. A username without a
    /// token counts as logged out.
    pub async fn restore(store: Arc<dyn LocalStore>, navigator: Navigator) -> ClientResult<Self> {
        let session = Self::new(store, navigator);
        let store = &session.store;
        let token = store.get(keys::AUTH_TOKEN).await?;
        let username = store.get(keys::USERNAME).await?;
        let is_admin = store.get(keys::IS_ADMIN).await?.as_deref() == Some("true");

        let state = match (token, username) {
            (Some(_), Some(username)) => {
                tracing::debug!("Restored session for {}", username);
                SessionState {
                    username: Some(username),
                    is_admin,
                    profile_version: 0,
                }
            }
            _ => SessionState::default(),
        };

        *session.write() = state;
        Ok(session)
    }

    /// A logged-out session over `store`.
    pub fn new(store: Arc<dyn LocalStore>, navigator: Navigator) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            store,
            navigator,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            state: self.state.clone(),
        }
    }

    /// Exchange credentials for a token, then look up the role.
    pub async fn login(&self, client: &ApiClient, username: &str, password: &str) -> ClientResult<()> {
        let token = users::login(client, username, password).await?;
        self.store.set(keys::AUTH_TOKEN, &token.access_token).await?;

        let is_admin = match users::get_user(client, username).await {
            Ok(profile) => !profile.is_veteran,
            Err(e) => {
                tracing::warn!("Could not load profile for {}: {}", username, e);
                false
            }
        };

        self.establish(username, is_admin).await?;
        self.navigator.redirect(Route::Feed);
        Ok(())
    }

    /// Record an authenticated user whose token is already persisted.
    pub async fn establish(&self, username: &str, is_admin: bool) -> ClientResult<()> {
        self.store.set(keys::USERNAME, username).await?;
        self.store
            .set(keys::IS_ADMIN, if is_admin { "true" } else { "false" })
            .await?;

        let mut state = self.write();
        state.username = Some(username.to_string());
        state.is_admin = is_admin;
        state.profile_version += 1;
        tracing::info!("Logged in as {}{}", username, if is_admin { " (admin)" } else { "" });
        Ok(())
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.store.remove(keys::AUTH_TOKEN).await?;
        self.store.remove(keys::USERNAME).await?;
        self.store.remove(keys::IS_ADMIN).await?;

        {
            let mut state = self.write();
            let version = state.profile_version;
            *state = SessionState {
                profile_version: version + 1,
                ..SessionState::default()
            };
        }

        self.navigator.redirect(Route::Login);
        Ok(())
    }

    /// The backend no longer accepts our credentials. Same teardown as an
    /// explicit logout.
    pub async fn expire(&self) -> ClientResult<()> {
        if let Some(username) = self.reader().username() {
            tracing::warn!("Session for {} expired", username);
        }
        self.logout().await
    }

    pub fn bump_profile_version(&self) -> u64 {
        let mut state = self.write();
        state.profile_version += 1;
        state.profile_version
    }
}
