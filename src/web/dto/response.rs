//! Page models and JSON fragments returned by the web layer.

use chrono_tz::Tz;
use serde::Serialize;

use crate::board::{Comment, Thread};
use crate::datetime::{format_comment_time, to_rfc3339};
use crate::db::Flash;

/// Thread as listed on the index and shown on the board page.
#[derive(Debug, Serialize)]
pub struct ThreadSummary {
    pub name: String,
    pub slug: String,
    /// Whether a password gates the thread.
    pub protected: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl ThreadSummary {
    pub fn new(thread: &Thread, tz: Tz) -> Self {
        Self {
            name: thread.thread_name.clone(),
            slug: thread.slug.clone(),
            protected: thread.is_protected(),
            created_at: to_rfc3339(thread.created_at, tz),
        }
    }
}

/// Comment as sent to clients.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub content: String,
    /// `%Y/%m/%d %H:%M:%S` in the server time zone.
    pub created_at: String,
    /// Author, or "Anonymous".
    pub username: String,
}

impl CommentResponse {
    pub fn new(comment: &Comment, tz: Tz) -> Self {
        Self {
            content: comment.content.clone(),
            created_at: format_comment_time(comment.created_at, tz),
            username: comment.author_name().to_string(),
        }
    }
}

/// `GET /` page model.
#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub threads: Vec<ThreadSummary>,
    /// Empty when anonymous, "Unknown" for a vanished user.
    pub username: String,
    pub messages: Vec<Flash>,
}

/// `GET /board/<slug>/` page model.
#[derive(Debug, Serialize)]
pub struct BoardPage {
    pub thread: ThreadSummary,
    pub comments: Vec<CommentResponse>,
    pub board_slug: String,
    /// RFC 3339 time of the newest comment, the client's first poll cursor.
    pub last_timestamp: Option<String>,
    /// Logged-in user id.
    pub current_user: Option<i64>,
    pub messages: Vec<Flash>,
}

/// Polling response.
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub comments: Vec<CommentResponse>,
}

/// Descriptor of an HTML form a template would render.
#[derive(Debug, Serialize)]
pub struct FormPage {
    /// Form name, such as `login`.
    pub form: &'static str,
    /// Where the form posts to.
    pub action: String,
    /// Expected field names.
    pub fields: &'static [&'static str],
    pub messages: Vec<Flash>,
}

impl FormPage {
    pub fn new(
        form: &'static str,
        action: impl Into<String>,
        fields: &'static [&'static str],
        messages: Vec<Flash>,
    ) -> Self {
        Self {
            form,
            action: action.into(),
            fields,
            messages,
        }
    }
}
