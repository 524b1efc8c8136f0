//! Input validation for noticeboard user registration.
//!
//! This module provides the username rules and the account password policy.

use thiserror::Error;

use crate::error::FieldErrors;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Characters that satisfy the special-character rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Validation errors.
///
/// The messages are shown to users next to the offending form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("This field is required.")]
    UsernameEmpty,

    /// Username is too long.
    #[error("Ensure this value has at most {MAX_USERNAME_LENGTH} characters.")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")]
    UsernameInvalidChars,

    /// Username is already registered.
    #[error("A user with that username already exists.")]
    UsernameTaken,

    /// Password is too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters long.")]
    PasswordTooShort,

    /// Password is too long.
    #[error("Password must be at most {MAX_PASSWORD_LENGTH} characters long.")]
    PasswordTooLong,

    #[error("Password must contain at least one digit.")]
    PasswordNoDigit,

    #[error("Password must contain at least one uppercase letter.")]
    PasswordNoUppercase,

    #[error("Password must contain at least one lowercase letter.")]
    PasswordNoLowercase,

    #[error("Password must contain at least one special character.")]
    PasswordNoSpecial,

    /// Confirmation does not match the password.
    #[error("Passwords don't match")]
    PasswordMismatch,
}

/// Validate a username.
///
/// Requirements:
/// - Length: 1-150 characters
/// - Characters: letters, digits and `@ . + - _`
///
/// # Examples
///
/// ```
/// use noticeboard::auth::validation::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("no spaces").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate an account password against the policy.
///
/// Rules are checked in order and the first failure is returned:
/// length, digit, upper-case letter, lower-case letter, special character.
///
/// # Examples
///
/// ```
/// use noticeboard::auth::validation::validate_password_policy;
///
/// assert!(validate_password_policy("Passw0rd!").is_ok());
/// assert!(validate_password_policy("password").is_err());
/// ```
pub fn validate_password_policy(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordNoDigit);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::PasswordNoUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(ValidationError::PasswordNoLowercase);
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(ValidationError::PasswordNoSpecial);
    }
    Ok(())
}

/// Validate all registration fields at once.
///
/// Every failing field gets its message: the username rules on `username`,
/// the policy on `password` and a mismatch on `password_confirm`. The
/// mismatch is only reported when both passwords were given.
pub fn validate_registration(
    username: &str,
    password: &str,
    password_confirm: &str,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(e) = validate_username(username) {
        errors.add("username", e.to_string());
    }
    if password.is_empty() {
        errors.add("password", "This field is required.");
    } else if let Err(e) = validate_password_policy(password) {
        errors.add("password", e.to_string());
    }
    if password_confirm.is_empty() {
        errors.add("password_confirm", "This field is required.");
    } else if !password.is_empty() && password != password_confirm {
        errors.add(
            "password_confirm",
            ValidationError::PasswordMismatch.to_string(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
