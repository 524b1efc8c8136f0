//! User registration for noticeboard.
//!
//! This module provides the user registration functionality.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_registration, ValidationError};
use crate::auth::{hash_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::error::FieldErrors;
use crate::BoardError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// One or more form fields are invalid, including a taken username.
    #[error("invalid registration: {0}")]
    Invalid(FieldErrors),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<RegistrationError> for BoardError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Invalid(fields) => BoardError::Fields(fields),
            RegistrationError::Password(e) => BoardError::Validation(e.to_string()),
            RegistrationError::Database(msg) => BoardError::Database(msg),
        }
    }
}

/// Registration request data, as submitted by the signup form.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Password in clear text; only its hash is stored.
    pub password: String,
    /// Password typed a second time.
    pub password_confirm: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        password_confirm: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            password_confirm: password_confirm.into(),
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks if the username already exists
/// 3. Hashes the password
/// 4. Creates the user in the database
///
/// Field problems from steps 1 and 2 are reported together.
pub async fn register(
    repo: &UserRepository<'_>,
    request: RegistrationRequest,
) -> std::result::Result<User, RegistrationError> {
    let mut errors = match validate_registration(
        &request.username,
        &request.password,
        &request.password_confirm,
    ) {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors,
    };

    if errors.get("username").is_none() && username_taken(repo, &request.username).await? {
        errors.add("username", ValidationError::UsernameTaken.to_string());
    }

    if !errors.is_empty() {
        return Err(RegistrationError::Invalid(errors));
    }

    let password_hash = hash_password(&request.password)?;

    let user = match repo
        .create(&NewUser::new(&request.username, password_hash))
        .await
    {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same name.
        Err(e) => {
            if username_taken(repo, &request.username).await? {
                return Err(RegistrationError::Invalid(FieldErrors::single(
                    "username",
                    ValidationError::UsernameTaken.to_string(),
                )));
            }
            return Err(RegistrationError::Database(e.to_string()));
        }
    };

    info!(
        username = %user.username,
        user_id = user.id,
        "New user registered"
    );

    Ok(user)
}

async fn username_taken(
    repo: &UserRepository<'_>,
    username: &str,
) -> std::result::Result<bool, RegistrationError> {
    repo.username_exists(username)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))
}
