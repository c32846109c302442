use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::models::{completion_percent, FitnessTask};
use crate::api::{fitness, ApiClient};
use crate::auth::SessionReader;
use crate::cache::FetchCache;
use crate::db::LocalStore;
use crate::error::{ClientError, ClientResult};
use crate::notice::{Notice, Notifier};
use crate::quotes::{self, DailyQuote};
use crate::state::AppContext;
use crate::views::{Mount, MountHandle, OptimisticList, SyncState};

pub const ADMIN_HINT: &str =
    "Please navigate to the Users page and click on their profile to view their task progress.";

/// Personal task tracker with a completion bar and a daily quote.
pub struct FitnessView {
    client: ApiClient,
    session: SessionReader,
    notifier: Notifier,
    store: Arc<dyn LocalStore>,
    cache: Arc<FetchCache<Vec<FitnessTask>>>,
    mount: Mount,
    tasks: OptimisticList<FitnessTask>,
    quote: Option<DailyQuote>,
    draft: String,
}

impl FitnessView {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: ctx.client.clone(),
            session: ctx.session.reader(),
            notifier: ctx.notifier.clone(),
            store: ctx.store.clone(),
            cache: ctx.tasks.clone(),
            mount: Mount::new(),
            tasks: OptimisticList::default(),
            quote: None,
            draft: String::new(),
        }
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mount.handle()
    }

    pub fn tasks(&self) -> &[FitnessTask] {
        self.tasks.items()
    }

    pub fn state(&self, task_id: &str) -> SyncState {
        self.tasks.state(task_id)
    }

    /// Always derived from the current list.
    pub fn progress(&self) -> u8 {
        completion_percent(self.tasks.items())
    }

    pub fn completed_ids(&self) -> Vec<&str> {
        self.tasks
            .items()
            .iter()
            .filter(|t| t.is_finished)
            .map(|t| t.task_id.as_str())
            .collect()
    }

    pub fn quote(&self) -> Option<&DailyQuote> {
        self.quote.as_ref()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Administrators have no tracker of their own.
    pub fn admin_hint(&self) -> Option<&'static str> {
        self.session.is_admin().then_some(ADMIN_HINT)
    }

    fn key(&self, username: &str) -> ClientResult<String> {
        Ok(self.client.url(&fitness::tasks_path(username))?.to_string())
    }

    async fn fetch(&self, username: &str, force: bool) -> ClientResult<Vec<FitnessTask>> {
        let key = self.key(username)?;
        let client = self.client.clone();
        let user = username.to_string();
        let fetch = move || async move { fitness::get_tasks(&client, &user).await };
        if force {
            self.cache.revalidate(&key, fetch).await
        } else {
            self.cache.read(&key, fetch).await
        }
    }

    pub async fn load(&mut self) {
        let Some(username) = self.session.username() else {
            return;
        };
        let result = self.fetch(&username, false).await;
        if !self.mount.is_live() {
            return;
        }
        match result {
            Ok(tasks) => self.tasks.replace_all(tasks),
            Err(e) => tracing::error!("Error fetching fitness tasks: {}", e),
        }
    }

    pub async fn load_quote(&mut self, today: NaiveDate) {
        match quotes::daily_quote(self.store.as_ref(), today).await {
            Ok(quote) => self.quote = Some(quote),
            Err(e) => tracing::warn!("Could not load daily quote: {}", e),
        }
    }

    /// Flip completion locally, then sync with the server.
    pub async fn toggle_task(&mut self, task_id: &str) -> SyncState {
        let Some(username) = self.session.username() else {
            return SyncState::Synced;
        };
        let Some(ticket) = self
            .tasks
            .begin_update(task_id, |t| t.is_finished = !t.is_finished)
        else {
            return SyncState::Synced;
        };

        let result = match fitness::toggle_task(&self.client, &username, task_id).await {
            Ok(()) => Ok(self.fetch(&username, true).await),
            Err(e) => Err(e),
        };

        if !self.mount.is_live() {
            return SyncState::OptimisticPending;
        }
        match result {
            Ok(Ok(tasks)) => {
                self.tasks.reconcile(ticket, tasks);
            }
            Ok(Err(e)) => {
                tracing::warn!("Task toggled but refresh failed: {}", e);
                self.tasks.confirm(ticket);
            }
            Err(e) => {
                tracing::error!("Error toggling task: {}", e);
                self.tasks.rollback(ticket);
                self.notifier.push(e.notice("Error toggling task"));
            }
        }
        self.tasks.state(task_id)
    }

    /// Create a task from the draft. The server assigns the id.
    pub async fn add_task(&mut self) -> bool {
        let description = self.draft.trim().to_string();
        let Some(username) = self.session.username().filter(|_| !description.is_empty()) else {
            self.notifier.push(
                ClientError::Invalid("Task cannot be empty".into()).notice("Task cannot be empty"),
            );
            return false;
        };

        let created = fitness::add_task(&self.client, &username, &description).await;
        if !self.mount.is_live() {
            return false;
        }
        let task = match created {
            Ok(task) => task,
            Err(e) => {
                self.notifier.push(e.notice("Couldn't add new task"));
                return false;
            }
        };

        self.tasks.push(task);
        self.draft.clear();
        self.notifier
            .push(Notice::success("Success", "Task added successfully"));

        let fresh = self.fetch(&username, true).await;
        if !self.mount.is_live() {
            return true;
        }
        match fresh {
            Ok(tasks) => self.tasks.replace_all(tasks),
            Err(e) => tracing::warn!("Task added but refresh failed: {}", e),
        }
        true
    }

    /// Remove a task right away, then confirm with the server.
    pub async fn delete_task(&mut self, task_id: &str) -> SyncState {
        let Some(username) = self.session.username() else {
            return SyncState::Synced;
        };
        let Some(ticket) = self.tasks.begin_remove(task_id) else {
            return SyncState::Synced;
        };

        let result = match fitness::delete_task(&self.client, &username, task_id).await {
            Ok(()) => Ok(self.fetch(&username, true).await),
            Err(e) => Err(e),
        };

        if !self.mount.is_live() {
            return SyncState::OptimisticPending;
        }
        match result {
            Ok(fresh) => {
                self.notifier
                    .push(Notice::success_title("Task deleted successfully"));
                match fresh {
                    Ok(tasks) => self.tasks.reconcile(ticket, tasks),
                    Err(e) => {
                        tracing::warn!("Task deleted but refresh failed: {}", e);
                        self.tasks.confirm(ticket)
                    }
                };
            }
            Err(e) => {
                self.tasks.rollback(ticket);
                self.notifier.push(e.notice("Error deleting task"));
            }
        }
        self.tasks.state(task_id)
    }
}
