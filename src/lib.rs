//! noticeboard - a password-protectable discussion board.
//!
//! Users register and log in, create threads (optionally gated behind a
//! password), and post comments that other clients pick up by polling.

pub mod auth;
pub mod board;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{
    hash_password, register, verify_password, CurrentUser, PasswordError, RegistrationError,
    RegistrationRequest, SessionError, SessionManager, ThreadAccess, ValidationError,
};
pub use board::{
    BoardService, Comment, CommentRepository, CreateThreadRequest, NewComment, NewThread,
    PostOutcome, ResponseMode, Thread, ThreadRepository, ThreadView,
};
pub use config::Config;
pub use db::{Database, NewUser, Session, SessionRepository, User, UserRepository};
pub use error::{BoardError, FieldErrors, Result};
pub use web::{create_router, AppState, WebServer};
