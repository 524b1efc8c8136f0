//! Authentication session management for noticeboard.
//!
//! Sessions live in the database and are identified by an opaque UUID v4
//! carried in a cookie. Each session tracks the logged-in user, the set of
//! password-protected threads it has unlocked, and pending flash messages.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::board::Thread;
use crate::db::{Database, Flash, Session, SessionRepository, User, UserRepository};
use crate::{BoardError, Result};

/// Session-related errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid credentials (unknown username or wrong password).
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// Wrong thread password.
    #[error("Incorrect password.")]
    IncorrectPassword,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<BoardError> for SessionError {
    fn from(e: BoardError) -> Self {
        SessionError::Database(e.to_string())
    }
}

impl From<SessionError> for BoardError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidCredentials | SessionError::IncorrectPassword => {
                BoardError::Auth(e.to_string())
            }
            SessionError::Database(msg) => BoardError::Database(msg),
        }
    }
}

/// Default session duration (two weeks).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 14 * 24 * 60 * 60;

/// Per-session access state of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadAccess {
    /// Password-protected and not yet unlocked by this session.
    Locked,
    /// Public, or unlocked by this session.
    Unlocked,
}

/// The user a session resolves to.
#[derive(Debug, Clone)]
pub enum CurrentUser {
    /// No one is logged in.
    Anonymous,
    /// A logged-in user.
    User(User),
    /// The session referenced a user that no longer exists.
    Unknown,
}

impl CurrentUser {
    /// Name shown in page headers.
    pub fn display_name(&self) -> &str {
        match self {
            CurrentUser::Anonymous => "",
            CurrentUser::User(user) => &user.username,
            CurrentUser::Unknown => "Unknown",
        }
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            CurrentUser::User(user) => Some(user),
            _ => None,
        }
    }
}

/// Session manager backed by the session tables.
pub struct SessionManager<'a> {
    db: &'a Database,
    duration_secs: i64,
}

impl<'a> SessionManager<'a> {
    /// Create a session manager with the default session duration.
    pub fn new(db: &'a Database) -> Self {
        Self::with_duration(db, DEFAULT_SESSION_DURATION_SECS)
    }

    /// Create a session manager with a custom session duration.
    pub fn with_duration(db: &'a Database, duration_secs: u64) -> Self {
        Self {
            db,
            duration_secs: i64::try_from(duration_secs).unwrap_or(i64::MAX / 2),
        }
    }

    fn repo(&self) -> SessionRepository<'a> {
        SessionRepository::new(self.db.pool())
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    /// Create a fresh session, optionally already carrying a user.
    pub async fn create(&self, user_id: Option<i64>) -> Result<Session> {
        let now = Self::now();
        let id = Uuid::new_v4().to_string();
        let session = self
            .repo()
            .create(&id, user_id, now, now.saturating_add(self.duration_secs))
            .await?;

        debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Load a live session by id.
    pub async fn load(&self, id: &str) -> Result<Option<Session>> {
        self.repo().get_valid(id, Self::now()).await
    }

    /// Start a session in memory only.
    ///
    /// The row is written by the first operation that stores something
    /// for the session (a flash message or an unlock grant).
    pub fn start(&self) -> Session {
        let now = Self::now();
        Session {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            created_at: now,
            expires_at: now.saturating_add(self.duration_secs),
            transient: true,
        }
    }

    /// Load the session named by the cookie, or start a transient one.
    pub async fn load_or_start(&self, id: Option<&str>) -> Result<Session> {
        if let Some(id) = id {
            if let Some(session) = self.load(id).await? {
                return Ok(session);
            }
        }
        Ok(self.start())
    }

    /// Write a transient session to storage.
    async fn persist(&self, session: &Session) -> Result<()> {
        if session.transient {
            self.repo().persist(session).await?;
            debug!(session_id = %session.id, "Session stored");
        }
        Ok(())
    }

    /// Check credentials and start an authenticated session.
    ///
    /// The same error is returned for an unknown username and a wrong
    /// password. On success the current session is discarded with its
    /// unlock grants and flash messages, and a new session id is issued.
    pub async fn login(
        &self,
        current: &Session,
        username: &str,
        password: &str,
    ) -> std::result::Result<(Session, User), SessionError> {
        let user = UserRepository::new(self.db.pool())
            .get_by_username(username)
            .await?;

        // An unknown user costs a full hash verification as well.
        let user = match user {
            Some(user) => {
                if crate::auth::verify_password(password, &user.password).is_err() {
                    warn!(username = %username, "Login failed: wrong password");
                    return Err(SessionError::InvalidCredentials);
                }
                user
            }
            None => {
                crate::auth::verify_dummy_password(password);
                warn!(username = %username, "Login failed: user not found");
                return Err(SessionError::InvalidCredentials);
            }
        };

        self.repo().delete(&current.id).await?;
        let session = self.create(Some(user.id)).await?;

        info!(username = %user.username, user_id = user.id, "Login successful");
        Ok((session, user))
    }

    /// Clear the identity from the session.
    ///
    /// The session and its unlocked threads are kept. Returns whether a
    /// user was logged in.
    pub async fn logout(&self, session: &mut Session) -> Result<bool> {
        let Some(user_id) = session.user_id.take() else {
            debug!(session_id = %session.id, "Logout: no user in session");
            return Ok(false);
        };

        self.repo().set_user(&session.id, None).await?;
        info!(user_id = user_id, "Session logged out");
        Ok(true)
    }

    /// Resolve the session's user.
    ///
    /// A session pointing at a deleted user is reported as `Unknown` and
    /// its identity is cleared.
    pub async fn current_user(&self, session: &mut Session) -> Result<CurrentUser> {
        let Some(user_id) = session.user_id else {
            return Ok(CurrentUser::Anonymous);
        };

        match UserRepository::new(self.db.pool()).get_by_id(user_id).await? {
            Some(user) => Ok(CurrentUser::User(user)),
            None => {
                warn!(user_id = user_id, "Session references a missing user");
                session.user_id = None;
                self.repo().set_user(&session.id, None).await?;
                Ok(CurrentUser::Unknown)
            }
        }
    }

    /// Access state of a thread for this session.
    pub async fn access(&self, session: &Session, thread: &Thread) -> Result<ThreadAccess> {
        if !thread.is_protected() || self.repo().is_unlocked(&session.id, thread.id).await? {
            Ok(ThreadAccess::Unlocked)
        } else {
            Ok(ThreadAccess::Locked)
        }
    }

    /// Grant the session access to a thread without a password check.
    pub async fn grant(&self, session: &Session, thread_id: i64) -> Result<()> {
        self.persist(session).await?;
        self.repo().add_unlock(&session.id, thread_id).await
    }

    /// Unlock a password-protected thread for this session.
    ///
    /// Public threads need no unlocking and always succeed.
    pub async fn unlock(
        &self,
        session: &Session,
        thread: &Thread,
        password: &str,
    ) -> std::result::Result<(), SessionError> {
        if !thread.is_protected() {
            return Ok(());
        }

        if crate::auth::verify_password(password, &thread.password).is_err() {
            warn!(slug = %thread.slug, "Thread unlock failed: wrong password");
            return Err(SessionError::IncorrectPassword);
        }

        self.grant(session, thread.id).await?;
        info!(slug = %thread.slug, "Thread unlocked for session");
        Ok(())
    }

    /// Queue a flash message for the next page view.
    pub async fn flash(&self, session: &Session, flash: Flash) -> Result<()> {
        self.persist(session).await?;
        self.repo().push_flash(&session.id, &flash).await
    }

    /// Take the pending flash messages.
    pub async fn take_flashes(&self, session: &Session) -> Result<Vec<Flash>> {
        if session.transient {
            return Ok(Vec::new());
        }
        self.repo().take_flashes(&session.id).await
    }
}
