//! Comment model for noticeboard.

/// Name shown for comments that have no associated user.
pub const ANONYMOUS: &str = "Anonymous";

/// Comment entity, joined with its author's username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID. Also the insertion sequence.
    pub id: i64,
    /// ID of the thread the comment belongs to.
    pub thread_id: i64,
    /// ID of the author, if any.
    pub user_id: Option<i64>,
    /// Comment text.
    pub content: String,
    /// Creation time in microseconds since the Unix epoch.
    pub created_at: i64,
    /// Author's username, if the author still exists.
    pub username: Option<String>,
}

impl Comment {
    /// Author name for display.
    pub fn author_name(&self) -> &str {
        self.username.as_deref().unwrap_or(ANONYMOUS)
    }
}

/// Data for creating a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    /// ID of the thread to post in.
    pub thread_id: i64,
    /// ID of the author.
    pub user_id: Option<i64>,
    /// Comment text.
    pub content: String,
    /// Requested creation time; defaults to now.
    pub created_at: Option<i64>,
}

impl NewComment {
    /// Create a new comment by a user.
    pub fn new(thread_id: i64, user_id: i64, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            user_id: Some(user_id),
            content: content.into(),
            created_at: None,
        }
    }

    /// Create a comment with no author.
    pub fn anonymous(thread_id: i64, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            user_id: None,
            content: content.into(),
            created_at: None,
        }
    }

    /// Request a specific creation time (microseconds since the epoch).
    ///
    /// The stored time is still raised to the newest existing comment's
    /// time if it would be earlier.
    pub fn at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment() {
        let comment = NewComment::new(1, 2, "hi");
        assert_eq!(comment.thread_id, 1);
        assert_eq!(comment.user_id, Some(2));
        assert_eq!(comment.content, "hi");
        assert_eq!(comment.created_at, None);
    }

    #[test]
    fn test_anonymous_comment_at() {
        let comment = NewComment::anonymous(1, "hi").at(42);
        assert_eq!(comment.user_id, None);
        assert_eq!(comment.created_at, Some(42));
    }

    #[test]
    fn test_author_name() {
        let mut comment = Comment {
            id: 1,
            thread_id: 1,
            user_id: Some(1),
            content: "hi".to_string(),
            created_at: 0,
            username: Some("alice".to_string()),
        };
        assert_eq!(comment.author_name(), "alice");

        comment.username = None;
        assert_eq!(comment.author_name(), "Anonymous");
    }
}
