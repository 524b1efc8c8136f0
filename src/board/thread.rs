//! Thread model for noticeboard.

/// Thread entity representing a discussion topic.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Thread {
    /// Unique thread ID.
    pub id: i64,
    /// Display name.
    pub thread_name: String,
    /// Unique URL slug.
    pub slug: String,
    /// Argon2 hash of the thread password, or empty for a public thread.
    pub password: String,
    /// Creation time in microseconds since the Unix epoch.
    pub created_at: i64,
}

impl Thread {
    /// Check whether the thread is password-gated.
    pub fn is_protected(&self) -> bool {
        !self.password.is_empty()
    }
}

/// Data for creating a new thread.
#[derive(Debug, Clone)]
pub struct NewThread {
    /// Display name.
    pub thread_name: String,
    /// Unique URL slug.
    pub slug: String,
    /// Pre-hashed password, or empty for a public thread.
    pub password_hash: String,
}

impl NewThread {
    /// Create a public thread.
    pub fn new(thread_name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
            slug: slug.into(),
            password_hash: String::new(),
        }
    }

    /// Gate the thread behind an already-hashed password.
    pub fn with_password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = password_hash.into();
        self
    }
}
