//! Navigation capability used for the login redirect on session expiry.
//!
//! The session interceptor does not touch any global location object. It asks
//! the injected [`Navigator`] where the user currently is, picks the matching
//! login surface with [`login_surface_for`], and calls [`Navigator::go_to`].

use crate::config::SessionConfig;
use std::sync::Mutex;

pub trait Navigator: Send + Sync {
    /// Path of the route the user is on, e.g. `/admin/users`.
    fn current_path(&self) -> String;

    fn go_to(&self, path: &str);
}

/// Login route for the area the user is currently in.
///
/// ```
/// # use courier::config::SessionConfig;
/// # use courier::navigate::login_surface_for;
/// let session = SessionConfig::default();
/// assert_eq!(login_surface_for("/admin/m/42", &session), "/admin/login");
/// assert_eq!(login_surface_for("/profile", &session), "/login");
/// ```
pub fn login_surface_for<'a>(current_path: &str, session: &'a SessionConfig) -> &'a str {
    if current_path.starts_with(&session.admin_prefix) {
        &session.admin_login_path
    } else {
        &session.login_path
    }
}

/// Remembers the current route and every redirect requested.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    current: Mutex<String>,
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(path.into()),
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.visited
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn go_to(&self, path: &str) {
        if let Ok(mut current) = self.current.lock() {
            *current = path.to_string();
        }
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(path.to_string());
        }
    }
}
