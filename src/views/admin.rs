use crate::api::{groups, users, ApiClient};
use crate::auth::SessionReader;
use crate::error::{ClientError, ClientResult};
use crate::notice::{Notice, Notifier};
use crate::state::AppContext;

/// Administrator-only deletions.
pub struct AdminView {
    client: ApiClient,
    session: SessionReader,
    notifier: Notifier,
}

impl AdminView {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: ctx.client.clone(),
            session: ctx.session.reader(),
            notifier: ctx.notifier.clone(),
        }
    }

    fn require_admin(&self) -> ClientResult<()> {
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(ClientError::Forbidden("Administrator access required".into()))
        }
    }

    fn report(&self, result: ClientResult<()>, success: &str, fallback: &str) -> bool {
        match result {
            Ok(()) => {
                self.notifier.push(Notice::success("Success", success));
                true
            }
            Err(e) => {
                self.notifier.push(e.notice(fallback));
                false
            }
        }
    }

    pub async fn delete_user(&self, username: &str) -> bool {
        let result = match self.require_admin() {
            Ok(()) => users::delete_user(&self.client, username).await,
            Err(e) => Err(e),
        };
        self.report(
            result,
            &format!("User {} deleted", username),
            &format!("Failed to delete user {}", username),
        )
    }

    pub async fn delete_group(&self, group_id: &str) -> bool {
        let result = match self.require_admin() {
            Ok(()) => groups::delete_group(&self.client, group_id).await,
            Err(e) => Err(e),
        };
        self.report(result, "Group deleted", "Failed to delete group")
    }

    pub async fn delete_group_post(&self, group_id: &str, post_id: &str) -> bool {
        let result = match self.require_admin() {
            Ok(()) => groups::delete_group_post(&self.client, group_id, post_id).await,
            Err(e) => Err(e),
        };
        self.report(result, "Post removed from group", "Failed to delete post from group")
    }
}
