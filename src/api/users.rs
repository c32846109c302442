use crate::api::client::{ApiClient, ApiRequest};
use crate::api::models::{LoginRequest, MessageResponse, ProfilePicResponse, TokenResponse, UserProfile};
use crate::error::ClientResult;

pub async fn login(client: &ApiClient, username: &str, password: &str) -> ClientResult<TokenResponse> {
    let request = ApiRequest::post("/users/login").json(&LoginRequest { username, password })?;
    client.send_json(request).await
}

pub async fn get_user(client: &ApiClient, username: &str) -> ClientResult<UserProfile> {
    client.get_json(&format!("/users/{}", username)).await
}

/// Profile picture URL, or an empty string when the user has none.
pub async fn get_profile_pic(client: &ApiClient, username: &str) -> ClientResult<String> {
    let response: ProfilePicResponse = client
        .get_json(&format!("/users/{}/profile-pic", username))
        .await?;
    Ok(response.profile_pic.unwrap_or_default())
}

pub async fn delete_user(client: &ApiClient, username: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::delete(format!("/users/admin/{}", username)))
        .await
        .map_err(|e| {
            tracing::error!("Error deleting user {}: {}", username, e);
            e
        })
}

pub async fn verify_email(client: &ApiClient, token: &str) -> ClientResult<MessageResponse> {
    client
        .send_json(ApiRequest::get("/users/verify-email").query("token", token))
        .await
}

pub async fn resend_verification(client: &ApiClient, email: &str) -> ClientResult<()> {
    client
        .send(ApiRequest::post("/users/resend-verification").query("email", email))
        .await
}
