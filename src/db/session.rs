//! Server-side session storage.
//!
//! A session row carries the logged-in user (if any). Unlocked threads and
//! pending flash messages hang off it in their own tables and go away with it.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::{BoardError, Result};

/// Session entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    /// Opaque session id (the cookie value).
    pub id: String,
    /// Logged-in user, if any.
    pub user_id: Option<i64>,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: i64,
    /// Expiry time, seconds since the Unix epoch.
    pub expires_at: i64,
    /// Not yet written to storage.
    #[sqlx(skip)]
    pub transient: bool,
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    /// Convert to the stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for FlashLevel {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(FlashLevel::Success),
            "error" => Ok(FlashLevel::Error),
            other => Err(BoardError::Database(format!("unknown flash level: {other}"))),
        }
    }
}

/// A one-shot message shown on the next page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Repository for session rows, unlock grants and flash messages.
pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new session.
    pub async fn create(
        &self,
        id: &str,
        user_id: Option<i64>,
        now: i64,
        expires_at: i64,
    ) -> Result<Session> {
        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind(now)
            .bind(expires_at)
            .execute(self.pool)
            .await?;

        Ok(Session {
            id: id.to_string(),
            user_id,
            created_at: now,
            expires_at,
            transient: false,
        })
    }

    /// Store a transient session. A row that already exists is left alone.
    pub async fn persist(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Count stored sessions, expired ones included.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Get a session that has not expired at `now`.
    ///
    /// An expired row is deleted and reported as absent.
    pub async fn get_valid(&self, id: &str, now: i64) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match session {
            Some(s) if s.expires_at <= now => {
                self.delete(&s.id).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Set or clear the logged-in user.
    pub async fn set_user(&self, id: &str, user_id: Option<i64>) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET user_id = ? WHERE id = ?")
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a session with its unlock grants and flash messages.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every session that expired at or before `now`.
    pub async fn purge_expired(&self, now: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Record that the session may access a thread. Idempotent.
    pub async fn add_unlock(&self, session_id: &str, thread_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO session_unlocks (session_id, thread_id) VALUES (?, ?)")
            .bind(session_id)
            .bind(thread_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Check whether the session has unlocked a thread.
    pub async fn is_unlocked(&self, session_id: &str, thread_id: i64) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM session_unlocks WHERE session_id = ? AND thread_id = ?)",
        )
        .bind(session_id)
        .bind(thread_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// List thread ids unlocked by the session.
    pub async fn unlocked_threads(&self, session_id: &str) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT thread_id FROM session_unlocks WHERE session_id = ? ORDER BY thread_id",
        )
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Queue a flash message.
    pub async fn push_flash(&self, session_id: &str, flash: &Flash) -> Result<()> {
        sqlx::query("INSERT INTO session_flashes (session_id, level, message) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(flash.level.as_str())
            .bind(&flash.message)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Remove and return queued flash messages in the order they were added.
    pub async fn take_flashes(&self, session_id: &str) -> Result<Vec<Flash>> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT level, message FROM session_flashes WHERE session_id = ? ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM session_flashes WHERE session_id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        rows.into_iter()
            .map(|(level, message)| {
                Ok(Flash {
                    level: level.parse()?,
                    message,
                })
            })
            .collect()
    }
}
