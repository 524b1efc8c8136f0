//! Thread repository for noticeboard.
//!
//! This module provides CRUD operations for threads in the database.

use chrono::Utc;
use sqlx::SqlitePool;

use super::thread::{NewThread, Thread};
use crate::db::Session;
use crate::{BoardError, Result};

const THREAD_COLUMNS: &str = "id, thread_name, slug, password, created_at";

/// Repository for thread CRUD operations.
pub struct ThreadRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ThreadRepository<'a> {
    /// Create a new ThreadRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new thread in the database.
    ///
    /// Returns the created thread with the assigned ID. A duplicate slug
    /// is rejected by the unique index.
    pub async fn create(&self, new_thread: &NewThread) -> Result<Thread> {
        let created_at = Utc::now().timestamp_micros();
        let result = sqlx::query(
            "INSERT INTO threads (thread_name, slug, password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_thread.thread_name)
        .bind(&new_thread.slug)
        .bind(&new_thread.password_hash)
        .bind(created_at)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| BoardError::NotFound("thread".to_string()))
    }

    /// Create a thread and unlock it for `session` in one transaction.
    ///
    /// A public thread needs no grant. A transient session is stored
    /// along with its grant.
    pub async fn create_granted(&self, new_thread: &NewThread, session: &Session) -> Result<Thread> {
        let created_at = Utc::now().timestamp_micros();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO threads (thread_name, slug, password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_thread.thread_name)
        .bind(&new_thread.slug)
        .bind(&new_thread.password_hash)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        if !new_thread.password_hash.is_empty() {
            sqlx::query(
                "INSERT OR IGNORE INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&mut *tx)
            .await?;
            sqlx::query("INSERT OR IGNORE INTO session_unlocks (session_id, thread_id) VALUES (?, ?)")
                .bind(&session.id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| BoardError::NotFound("thread".to_string()))
    }

    /// Get a thread by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?");
        let thread = sqlx::query_as::<_, Thread>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(thread)
    }

    /// Get a thread by its slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE slug = ?");
        let thread = sqlx::query_as::<_, Thread>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(thread)
    }

    /// Check whether a slug is taken.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM threads WHERE slug = ?)")
            .bind(slug)
            .fetch_one(self.pool)
            .await?;

        Ok(exists)
    }

    /// List every thread in storage order.
    pub async fn list_all(&self) -> Result<Vec<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads ORDER BY id");
        let threads = sqlx::query_as::<_, Thread>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(threads)
    }

    /// Delete a thread together with its comments and unlock grants.
    ///
    /// Everything is removed in one transaction. Returns false if the
    /// thread did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM session_unlocks WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all threads.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM threads")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
