use std::fmt;
use std::sync::{Arc, Mutex};

/// Views the client can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Feed,
    Groups,
    Fitness,
    Users,
    Dashboard,
    ResendVerification,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Feed => "/feed",
            Route::Groups => "/groups",
            Route::Fitness => "/fitness",
            Route::Users => "/users",
            Route::Dashboard => "/dashboard",
            Route::ResendVerification => "/resend-verification",
        };
        f.write_str(path)
    }
}

/// Navigation history shared by everything that can redirect.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    history: Arc<Mutex<Vec<Route>>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect(&self, route: Route) {
        tracing::info!("Navigating to {}", route);
        if let Ok(mut history) = self.history.lock() {
            history.push(route);
        }
    }

    pub fn current(&self) -> Option<Route> {
        self.history.lock().ok().and_then(|h| h.last().copied())
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}
