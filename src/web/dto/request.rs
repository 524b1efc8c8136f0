//! Form and query DTOs for the web layer.
//!
//! Form bodies arrive urlencoded; a missing field reads as empty so the
//! services can report it with their own messages.

use serde::Deserialize;
use validator::Validate;

/// Comment form on the board page. Content is capped at 10000 characters.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(
        max = 10000,
        message = "Ensure this value has at most 10000 characters."
    ))]
    pub content: String,
}

/// Thread unlock form.
#[derive(Debug, Deserialize, Validate)]
pub struct UnlockForm {
    #[serde(default)]
    #[validate(length(max = 128, message = "Ensure this value has at most 128 characters."))]
    pub password: String,
}

/// New thread form.
#[derive(Debug, Deserialize)]
pub struct CreateThreadForm {
    #[serde(default)]
    pub thread_name: String,
    /// Left empty to derive the slug from the name.
    #[serde(default)]
    pub slug: String,
    /// Left empty for a public thread.
    #[serde(default)]
    pub password: String,
}

/// Signup form.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Login form.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 150,
        message = "Ensure this value has between 1 and 150 characters."
    ))]
    pub username: String,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 128,
        message = "Ensure this value has between 1 and 128 characters."
    ))]
    pub password: String,
}

/// Content negotiation query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    /// `json` or `page`.
    pub format: Option<String>,
}

/// Polling query.
#[derive(Debug, Default, Deserialize)]
pub struct PollQuery {
    /// Only comments created strictly after this time are returned.
    pub last_timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_form_length() {
        let form = CommentForm {
            content: "hi".to_string(),
        };
        assert!(form.validate().is_ok());

        let form = CommentForm {
            content: "x".repeat(10_001),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let form = LoginForm {
            username: "alice".to_string(),
            password: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
        assert!(!errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_unlock_form_length() {
        let form = UnlockForm {
            password: "x".repeat(129),
        };
        assert!(form.validate().is_err());
        let form = UnlockForm {
            password: String::new(),
        };
        assert!(form.validate().is_ok());
    }
}
