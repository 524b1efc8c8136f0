//! Comment repository for noticeboard.
//!
//! Comments are always listed in `(created_at, id)` order. Creation times
//! never go backwards in insertion order, and the autoincrement id breaks
//! ties between equal times.

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool};

use super::comment::{Comment, NewComment};
use crate::{BoardError, Result};

const COMMENT_SELECT: &str = "SELECT c.id, c.thread_id, c.user_id, c.content, c.created_at, u.username
     FROM comments c LEFT JOIN users u ON u.id = c.user_id";

/// Repository for comment operations.
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new CommentRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a comment.
    ///
    /// The stored time is the requested time (or now), raised to the
    /// newest existing comment's time so it never decreases.
    pub async fn create(&self, new_comment: &NewComment) -> Result<Comment> {
        let requested = new_comment
            .created_at
            .unwrap_or_else(|| Utc::now().timestamp_micros());

        let result = sqlx::query(
            "INSERT INTO comments (thread_id, user_id, content, created_at)
             VALUES (?, ?, ?, MAX(?, COALESCE((SELECT MAX(created_at) FROM comments), 0)))",
        )
        .bind(new_comment.thread_id)
        .bind(new_comment.user_id)
        .bind(&new_comment.content)
        .bind(requested)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| BoardError::NotFound("comment".to_string()))
    }

    /// Get a comment by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = ?");
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(comment)
    }

    /// List every comment in a thread.
    pub async fn list_by_thread(&self, thread_id: i64) -> Result<Vec<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.thread_id = ? ORDER BY c.created_at, c.id");
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(thread_id)
            .fetch_all(self.pool)
            .await?;

        Ok(comments)
    }

    /// List comments in a thread created strictly after `since`
    /// (microseconds since the epoch).
    pub async fn list_since(&self, thread_id: i64, since: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "{COMMENT_SELECT} WHERE c.thread_id = ? AND c.created_at > ? ORDER BY c.created_at, c.id"
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(thread_id)
            .bind(since)
            .fetch_all(self.pool)
            .await?;

        Ok(comments)
    }

    /// Get the most recent comment in a thread.
    pub async fn latest_in_thread(&self, thread_id: i64) -> Result<Option<Comment>> {
        let sql = format!(
            "{COMMENT_SELECT} WHERE c.thread_id = ? ORDER BY c.created_at DESC, c.id DESC LIMIT 1"
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(thread_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(comment)
    }

    /// Count comments in a thread.
    pub async fn count_by_thread(&self, thread_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Delete several comments at once (administrative bulk deletion).
    ///
    /// Returns the number of comments removed.
    pub async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("DELETE FROM comments WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query.build().execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{NewThread, ThreadRepository};
    use crate::db::{Database, NewUser, UserRepository};

    const SECOND: i64 = 1_000_000;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let thread = ThreadRepository::new(db.pool())
            .create(&NewThread::new("General", "general"))
            .await
            .unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "hash"))
            .await
            .unwrap();
        (db, thread.id, user.id)
    }

    #[tokio::test]
    async fn test_create_comment() {
        let (db, thread_id, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());

        let comment = repo
            .create(&NewComment::new(thread_id, user_id, "hi"))
            .await
            .unwrap();

        assert_eq!(comment.content, "hi");
        assert_eq!(comment.thread_id, thread_id);
        assert_eq!(comment.author_name(), "alice");
        assert!(comment.created_at > 0);
    }

    #[tokio::test]
    async fn test_anonymous_comment() {
        let (db, thread_id, _) = setup().await;
        let repo = CommentRepository::new(db.pool());

        let comment = repo
            .create(&NewComment::anonymous(thread_id, "legacy"))
            .await
            .unwrap();
        assert_eq!(comment.author_name(), "Anonymous");
    }

    #[tokio::test]
    async fn test_deleted_author_becomes_anonymous() {
        let (db, thread_id, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());

        let comment = repo
            .create(&NewComment::new(thread_id, user_id, "hi"))
            .await
            .unwrap();
        UserRepository::new(db.pool()).delete(user_id).await.unwrap();

        let reloaded = repo.get_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(reloaded.user_id, None);
        assert_eq!(reloaded.author_name(), "Anonymous");
    }

    #[tokio::test]
    async fn test_created_at_never_decreases() {
        let (db, thread_id, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());

        let first = repo
            .create(&NewComment::new(thread_id, user_id, "first").at(10 * SECOND))
            .await
            .unwrap();
        // The clock stepped backwards.
        let second = repo
            .create(&NewComment::new(thread_id, user_id, "second").at(5 * SECOND))
            .await
            .unwrap();

        assert_eq!(first.created_at, 10 * SECOND);
        assert_eq!(second.created_at, 10 * SECOND);
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_equal_times_ordered_by_insertion() {
        let (db, thread_id, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());

        for content in ["a", "b", "c"] {
            repo.create(&NewComment::new(thread_id, user_id, content).at(SECOND))
                .await
                .unwrap();
        }

        let contents: Vec<_> = repo
            .list_by_thread(thread_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);

        let latest = repo.latest_in_thread(thread_id).await.unwrap().unwrap();
        assert_eq!(latest.content, "c");
    }

    #[tokio::test]
    async fn test_list_since_is_strict() {
        let (db, thread_id, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());
        let t = 100 * SECOND;

        for (content, at) in [("before", t - SECOND), ("at", t), ("after", t + SECOND)] {
            repo.create(&NewComment::new(thread_id, user_id, content).at(at))
                .await
                .unwrap();
        }

        let newer = repo.list_since(thread_id, t).await.unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].content, "after");

        assert_eq!(repo.list_since(thread_id, 0).await.unwrap().len(), 3);
        assert_eq!(repo.list_by_thread(thread_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_comments_scoped_to_thread() {
        let (db, thread_id, user_id) = setup().await;
        let other = ThreadRepository::new(db.pool())
            .create(&NewThread::new("Other", "other"))
            .await
            .unwrap();
        let repo = CommentRepository::new(db.pool());

        repo.create(&NewComment::new(thread_id, user_id, "here"))
            .await
            .unwrap();
        repo.create(&NewComment::new(other.id, user_id, "there"))
            .await
            .unwrap();

        assert_eq!(repo.count_by_thread(thread_id).await.unwrap(), 1);
        assert_eq!(repo.list_by_thread(other.id).await.unwrap()[0].content, "there");
        assert!(repo.latest_in_thread(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_many() {
        let (db, thread_id, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());

        let mut ids = Vec::new();
        for content in ["a", "b", "c"] {
            let comment = repo
                .create(&NewComment::new(thread_id, user_id, content))
                .await
                .unwrap();
            ids.push(comment.id);
        }

        assert_eq!(repo.delete_many(&[]).await.unwrap(), 0);
        assert_eq!(repo.delete_many(&[ids[0], ids[2], 999]).await.unwrap(), 2);

        let remaining = repo.list_by_thread(thread_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "b");
    }

    #[tokio::test]
    async fn test_comment_requires_existing_thread() {
        let (db, _, user_id) = setup().await;
        let repo = CommentRepository::new(db.pool());

        let result = repo.create(&NewComment::new(999, user_id, "orphan")).await;
        assert!(result.is_err());
    }
}
