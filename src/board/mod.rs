//! Board module for noticeboard.
//!
//! This module provides the discussion board functionality:
//! - Threads with unique URL slugs, optionally password-gated
//! - Comments appended to threads and listed in creation order
//! - Polling for comments newer than a client-supplied timestamp

mod comment;
mod comment_repository;
mod service;
mod slug;
mod thread;
mod thread_repository;
mod types;

pub use comment::{Comment, NewComment, ANONYMOUS};
pub use comment_repository::CommentRepository;
pub use service::{BoardService, INVALID_REQUEST, INVALID_TIMESTAMP, LOGIN_REQUIRED};
pub use slug::{is_valid_slug, slugify, MAX_SLUG_LENGTH, MAX_THREAD_NAME_LENGTH};
pub use thread::{NewThread, Thread};
pub use thread_repository::ThreadRepository;
pub use types::{CreateThreadRequest, PostOutcome, ResponseMode, ThreadView};
