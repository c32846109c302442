pub mod admin;
pub mod comments;
pub mod drawer;
pub mod feed;
pub mod fitness;
pub mod sync;
pub mod verify;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::{users, ApiClient};
use crate::cache::FetchCache;

pub use sync::{Keyed, OptimisticList, SyncState, Ticket};

/// Lifetime guard for a view. Async results are applied only while the
/// view is still mounted.
#[derive(Debug)]
pub struct Mount {
    generation: Arc<AtomicU64>,
    mounted_at: u64,
}

/// Detachable handle used to tear a view down from elsewhere.
#[derive(Debug, Clone)]
pub struct MountHandle {
    generation: Arc<AtomicU64>,
}

impl Mount {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            mounted_at: 0,
        }
    }

    pub fn handle(&self) -> MountHandle {
        MountHandle {
            generation: self.generation.clone(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.mounted_at
    }
}

impl Default for Mount {
    fn default() -> Self {
        Self::new()
    }
}

impl MountHandle {
    pub fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Profile picture for `username` through the shared avatar cache. Failures
/// degrade to an empty URL.
pub(crate) async fn avatar(client: &ApiClient, avatars: &FetchCache<String>, username: &str) -> String {
    let Some(key) = avatar_key(client, username) else {
        return String::new();
    };
    let client = client.clone();
    let username = username.to_string();
    avatars
        .read(&key, move || async move {
            users::get_profile_pic(&client, &username).await
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch profile picture: {}", e);
            String::new()
        })
}

pub(crate) fn avatar_key(client: &ApiClient, username: &str) -> Option<String> {
    client
        .url(&format!("/users/{}/profile-pic", username))
        .ok()
        .map(|u| u.to_string())
}
