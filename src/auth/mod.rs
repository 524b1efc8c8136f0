//! Authentication module for noticeboard.
//!
//! This module provides password hashing, session management,
//! user registration, and per-session thread unlocking.

mod password;
mod registration;
mod session;
pub mod validation;

pub use password::{
    hash_password, verify_dummy_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use session::{
    CurrentUser, SessionError, SessionManager, ThreadAccess, DEFAULT_SESSION_DURATION_SECS,
};
pub use validation::ValidationError;
