//! Request and outcome types shared by the board service and its callers.

use std::fmt;
use std::str::FromStr;

use super::{Comment, Thread};

/// How the caller wants a board operation answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Full page flow: redirects and rendered pages.
    #[default]
    Page,
    /// Asynchronous client expecting a JSON fragment.
    Json,
}

impl ResponseMode {
    /// Convert to the `format` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Page => "page",
            ResponseMode::Json => "json",
        }
    }

    pub fn is_json(&self) -> bool {
        *self == ResponseMode::Json
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "page" | "html" => Ok(ResponseMode::Page),
            "json" => Ok(ResponseMode::Json),
            _ => Err(format!("unknown response mode: {s}")),
        }
    }
}

/// Form data for creating a thread.
#[derive(Debug, Clone, Default)]
pub struct CreateThreadRequest {
    /// Display name.
    pub thread_name: String,
    /// Explicit slug; derived from the name when empty.
    pub slug: String,
    /// Thread password in clear text; empty for a public thread.
    pub password: String,
}

impl CreateThreadRequest {
    /// Create a request for a public thread with a derived slug.
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
            ..Self::default()
        }
    }

    /// Use an explicit slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Gate the thread behind a password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }
}

/// Result of viewing a thread.
#[derive(Debug, Clone)]
pub enum ThreadView {
    /// The session must unlock the thread first.
    Locked(Thread),
    /// The thread with all of its comments.
    Open {
        thread: Thread,
        comments: Vec<Comment>,
        /// Creation time of the newest comment, in microseconds.
        last_timestamp: Option<i64>,
    },
}

/// Result of posting a comment.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    /// The session must unlock the thread first; nothing was stored.
    Locked(Thread),
    /// The content was empty; nothing was stored and the board is shown.
    Empty(ThreadView),
    /// Stored; page callers are redirected back to the board.
    Redirect { slug: String },
    /// Stored; asynchronous callers get the comment itself.
    Json(Comment),
}
