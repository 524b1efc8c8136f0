//! Board service for noticeboard.
//!
//! Combines the thread and comment repositories with the session's access
//! state. Presentation (flash messages, redirects, JSON shapes) is left to
//! the caller.

use chrono_tz::Tz;
use tracing::{debug, info};

use super::slug::{is_valid_slug, slugify, MAX_SLUG_LENGTH, MAX_THREAD_NAME_LENGTH};
use super::{
    Comment, CommentRepository, CreateThreadRequest, NewComment, NewThread, PostOutcome,
    ResponseMode, Thread, ThreadRepository, ThreadView,
};
use crate::auth::{hash_password, SessionManager, ThreadAccess, MAX_PASSWORD_LENGTH};
use crate::datetime::{parse_since, to_micros};
use crate::db::{Database, Session, User};
use crate::error::FieldErrors;
use crate::{BoardError, Result};

/// Error text for a poll without the asynchronous signal.
pub const INVALID_REQUEST: &str = "Invalid request";

/// Error text for an unparseable `last_timestamp`.
pub const INVALID_TIMESTAMP: &str = "Invalid timestamp format";

/// Error text when posting without being logged in.
pub const LOGIN_REQUIRED: &str = "You must be logged in to post a comment.";

const REQUIRED: &str = "This field is required.";

fn too_long(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {max} characters (it has {actual}).")
}

/// Service for thread and comment operations.
pub struct BoardService<'a> {
    db: &'a Database,
    tz: Tz,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService; `tz` interprets naive poll timestamps.
    pub fn new(db: &'a Database, tz: Tz) -> Self {
        Self { db, tz }
    }

    fn sessions(&self) -> SessionManager<'a> {
        SessionManager::new(self.db)
    }

    /// List every thread in storage order.
    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        ThreadRepository::new(self.db.pool()).list_all().await
    }

    /// Get a thread by slug.
    pub async fn get_thread(&self, slug: &str) -> Result<Thread> {
        ThreadRepository::new(self.db.pool())
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| BoardError::NotFound("thread".to_string()))
    }

    /// Create a thread.
    ///
    /// The slug is derived from the name when not given. A protected
    /// thread is unlocked for the creating session straight away.
    pub async fn create_thread(
        &self,
        session: &Session,
        request: CreateThreadRequest,
    ) -> Result<Thread> {
        let thread_name = request.thread_name.trim();
        let explicit_slug = request.slug.trim();
        let mut errors = FieldErrors::new();

        let name_len = thread_name.chars().count();
        if name_len == 0 {
            errors.add("thread_name", REQUIRED);
        } else if name_len > MAX_THREAD_NAME_LENGTH {
            errors.add("thread_name", too_long(MAX_THREAD_NAME_LENGTH, name_len));
        }

        let slug = if explicit_slug.is_empty() {
            let derived = slugify(thread_name);
            if derived.is_empty() && name_len > 0 {
                errors.add(
                    "slug",
                    "Could not derive a slug from the thread name. Please enter one.",
                );
            }
            derived
        } else {
            let slug_len = explicit_slug.chars().count();
            if slug_len > MAX_SLUG_LENGTH {
                errors.add("slug", too_long(MAX_SLUG_LENGTH, slug_len));
            } else if !is_valid_slug(explicit_slug) {
                errors.add(
                    "slug",
                    "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.",
                );
            }
            explicit_slug.to_string()
        };

        let password_len = request.password.chars().count();
        if password_len > MAX_PASSWORD_LENGTH {
            errors.add("password", too_long(MAX_PASSWORD_LENGTH, password_len));
        }

        let repo = ThreadRepository::new(self.db.pool());
        if errors.get("slug").is_none() && !slug.is_empty() && repo.slug_exists(&slug).await? {
            errors.add("slug", "Thread with this Slug already exists.");
        }
        errors.into_result()?;

        let mut new_thread = NewThread::new(thread_name, &slug);
        if !request.password.is_empty() {
            let hash = hash_password(&request.password)
                .map_err(|e| BoardError::Validation(e.to_string()))?;
            new_thread = new_thread.with_password_hash(hash);
        }

        let thread = match repo.create_granted(&new_thread, session).await {
            Ok(thread) => thread,
            Err(e) => {
                // Lost a race for the slug.
                if repo.slug_exists(&slug).await? {
                    return Err(BoardError::Fields(FieldErrors::single(
                        "slug",
                        "Thread with this Slug already exists.",
                    )));
                }
                return Err(e);
            }
        };

        info!(
            slug = %thread.slug,
            protected = thread.is_protected(),
            "Thread created"
        );
        Ok(thread)
    }

    /// View a thread with its comments, unless it is locked for the session.
    pub async fn view_thread(&self, session: &Session, slug: &str) -> Result<ThreadView> {
        let thread = self.get_thread(slug).await?;
        self.view(session, thread).await
    }

    async fn view(&self, session: &Session, thread: Thread) -> Result<ThreadView> {
        if self.sessions().access(session, &thread).await? == ThreadAccess::Locked {
            debug!(slug = %thread.slug, "Thread locked for session");
            return Ok(ThreadView::Locked(thread));
        }

        let comments = CommentRepository::new(self.db.pool())
            .list_by_thread(thread.id)
            .await?;
        let last_timestamp = comments.last().map(|c| c.created_at);

        Ok(ThreadView::Open {
            thread,
            comments,
            last_timestamp,
        })
    }

    /// Post a comment to a thread.
    ///
    /// The thread must be unlocked for the session. Empty content stores
    /// nothing. Otherwise a logged-in user is required. The `mode` picks
    /// how a stored comment is answered.
    pub async fn post_comment(
        &self,
        session: &Session,
        user: Option<&User>,
        slug: &str,
        content: &str,
        mode: ResponseMode,
    ) -> Result<PostOutcome> {
        let thread = self.get_thread(slug).await?;

        if self.sessions().access(session, &thread).await? == ThreadAccess::Locked {
            return Ok(PostOutcome::Locked(thread));
        }

        if content.is_empty() {
            return Ok(PostOutcome::Empty(self.view(session, thread).await?));
        }

        let Some(user) = user else {
            return Err(BoardError::Auth(LOGIN_REQUIRED.to_string()));
        };

        let comment = CommentRepository::new(self.db.pool())
            .create(&NewComment::new(thread.id, user.id, content))
            .await?;

        info!(
            slug = %thread.slug,
            user_id = user.id,
            comment_id = comment.id,
            "Comment posted"
        );

        Ok(match mode {
            ResponseMode::Page => PostOutcome::Redirect { slug: thread.slug },
            ResponseMode::Json => PostOutcome::Json(comment),
        })
    }

    /// Fetch comments newer than `since` for a polling client.
    ///
    /// Only JSON callers are served. Without `since` (or with an empty
    /// value) every comment is returned. The thread's lock state is not
    /// consulted.
    pub async fn fetch_updates(
        &self,
        slug: &str,
        since: Option<&str>,
        mode: ResponseMode,
    ) -> Result<Vec<Comment>> {
        if !mode.is_json() {
            return Err(BoardError::Validation(INVALID_REQUEST.to_string()));
        }

        let thread = self.get_thread(slug).await?;
        let repo = CommentRepository::new(self.db.pool());

        match since.filter(|s| !s.is_empty()) {
            None => repo.list_by_thread(thread.id).await,
            Some(raw) => {
                let since = parse_since(raw, self.tz)
                    .ok_or_else(|| BoardError::Validation(INVALID_TIMESTAMP.to_string()))?;
                repo.list_since(thread.id, to_micros(&since)).await
            }
        }
    }
}
