//! Sessions, routes and the sign-in guard.
//!
//! Guarded flows call [`require_auth`] before touching storage. An anonymous
//! session yields [`ReviewError::Unauthenticated`] carrying the sign-in URL
//! that returns the user to the route they asked for.

use crate::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Source of the current user.
pub trait Session: Send + Sync {
    fn user(&self) -> Option<User>;

    fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// A session whose user is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct LocalSession {
    user: Option<User>,
}

impl LocalSession {
    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            user: Some(User::new(username)),
        }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// Treats a blank name as anonymous.
    pub fn from_username(username: Option<&str>) -> Self {
        match username.map(str::trim) {
            Some(name) if !name.is_empty() => Self::signed_in(name),
            _ => Self::anonymous(),
        }
    }
}

impl Session for LocalSession {
    fn user(&self) -> Option<User> {
        self.user.clone()
    }
}

/// Application routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Upload,
    Resume(Uuid),
    Wipe,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Upload => "/upload".to_string(),
            Route::Resume(id) => format!("/resume/{id}"),
            Route::Wipe => "/wipe".to_string(),
        }
    }

    /// Sign-in entry point that comes back to this route.
    pub fn auth_redirect(&self) -> String {
        format!("/auth?next={}", self.path())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Precondition for every guarded flow.
pub fn require_auth(session: &dyn Session, route: Route) -> Result<User, ReviewError> {
    session.user().ok_or_else(|| {
        tracing::info!("Anonymous access to {}, redirecting to sign-in", route);
        ReviewError::Unauthenticated {
            redirect: route.auth_redirect(),
        }
    })
}
