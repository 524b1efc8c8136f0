//! Request handlers for the web layer.

pub mod auth;
pub mod board;

pub use auth::*;
pub use board::*;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono_tz::Tz;

use crate::auth::SessionManager;
use crate::board::BoardService;
use crate::config::{Config, SessionConfig};
use crate::{Database, Result};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Database,
    /// Server time zone for formatting and parsing timestamps.
    pub tz: Tz,
    /// Session cookie settings.
    pub session: SessionConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database, tz: Tz, session: SessionConfig) -> Self {
        Self { db, tz, session }
    }

    /// Create the application state from the loaded configuration.
    pub fn from_config(db: Database, config: &Config) -> Result<Self> {
        Ok(Self::new(db, config.timezone()?, config.session.clone()))
    }

    /// Session manager using the configured session lifetime.
    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::with_duration(&self.db, self.session.max_age_secs)
    }

    /// Board service in the server time zone.
    pub fn board(&self) -> BoardService<'_> {
        BoardService::new(&self.db, self.tz)
    }

    /// Build the cookie that carries a session id.
    pub fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        Cookie::build((self.session.cookie_name.clone(), session_id))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.session.secure)
            .build()
    }
}
