use crate::api::client::{ApiClient, ApiRequest};
use crate::api::models::{FitnessTask, NewTask};
use crate::error::ClientResult;

pub fn tasks_path(username: &str) -> String {
    format!("/fitness/{}", username)
}

pub async fn get_tasks(client: &ApiClient, username: &str) -> ClientResult<Vec<FitnessTask>> {
    client.get_json(&tasks_path(username)).await
}

/// Flip `is_finished` on the server. The response body is not used.
pub async fn toggle_task(client: &ApiClient, username: &str, task_id: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::post(format!("/fitness/{}/{}/check", username, task_id)))
        .await
}

pub async fn add_task(client: &ApiClient, username: &str, description: &str) -> ClientResult<FitnessTask> {
    let request = ApiRequest::post(format!("/fitness/{}/task/add", username))
        .json(&NewTask { description })?;
    client.send_json(request).await
}

pub async fn delete_task(client: &ApiClient, username: &str, task_id: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::delete(format!("/fitness/{}/{}/delete", username, task_id)))
        .await
}
