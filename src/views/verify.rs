use std::time::Duration;

use crate::api::{users, ApiClient};
use crate::nav::{Navigator, Route};
use crate::notice::{Notice, Notifier};
use crate::state::AppContext;

const VERIFIED_NOTICE_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Success,
    Error,
}

/// Landing view for the link in a verification email.
pub struct EmailVerificationView {
    client: ApiClient,
    navigator: Navigator,
    notifier: Notifier,
    redirect_delay: Duration,
    status: VerificationStatus,
    message: String,
    verifying: bool,
}

impl EmailVerificationView {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: ctx.client.clone(),
            navigator: ctx.navigator.clone(),
            notifier: ctx.notifier.clone(),
            redirect_delay: ctx.config.redirect_delay(),
            status: VerificationStatus::Pending,
            message: String::new(),
            verifying: false,
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    /// Offered after a failure.
    pub fn can_request_new_link(&self) -> bool {
        self.status == VerificationStatus::Error
    }

    pub fn request_new_link(&self) {
        self.navigator.redirect(Route::ResendVerification);
    }

    /// Verify `token` and, on success, send the user to login after the
    /// configured delay.
    pub async fn verify(&mut self, token: Option<&str>) -> VerificationStatus {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            self.status = VerificationStatus::Error;
            self.message = "Invalid verification link".to_string();
            return self.status;
        };

        self.verifying = true;
        let result = users::verify_email(&self.client, token).await;
        self.verifying = false;

        match result {
            Ok(response) => {
                self.status = VerificationStatus::Success;
                self.message = response.message;
                self.notifier.push(
                    Notice::success(
                        "Email Verified!",
                        "Your email has been successfully verified.",
                    )
                    .with_duration(VERIFIED_NOTICE_DURATION),
                );
                tokio::time::sleep(self.redirect_delay).await;
                self.navigator.redirect(Route::Login);
            }
            Err(e) => {
                tracing::warn!("Email verification failed: {}", e);
                self.status = VerificationStatus::Error;
                self.message = e.detail_or("Verification failed");
            }
        }
        self.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendStatus {
    Success,
    Error,
}

pub struct ResendVerificationView {
    client: ApiClient,
    email: String,
    status: Option<ResendStatus>,
    message: String,
    loading: bool,
}

impl ResendVerificationView {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            client: ctx.client.clone(),
            email: String::new(),
            status: None,
            message: String::new(),
            loading: false,
        }
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn status(&self) -> Option<ResendStatus> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub async fn submit(&mut self) -> ResendStatus {
        self.loading = true;
        self.status = None;
        self.message.clear();

        let result = users::resend_verification(&self.client, self.email.trim()).await;
        let status = match result {
            Ok(()) => {
                self.message = "Verification email sent! Please check your inbox.".to_string();
                ResendStatus::Success
            }
            Err(e) => {
                tracing::warn!("Resend verification failed: {}", e);
                self.message = e.detail_or("Failed to send verification email");
                ResendStatus::Error
            }
        };

        self.status = Some(status);
        self.loading = false;
        status
    }
}
