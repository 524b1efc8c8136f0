//! URL slugs for threads.

/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 100;

/// Maximum thread name length.
pub const MAX_THREAD_NAME_LENGTH: usize = 100;

/// Derive a slug from a thread name.
///
/// Non-ASCII characters are dropped, the rest is lower-cased, anything
/// that is not a word character, whitespace or hyphen is removed, runs of
/// whitespace and hyphens become one hyphen, and leading or trailing
/// hyphens and underscores are stripped. The result may be empty.
///
/// # Examples
///
/// ```
/// use noticeboard::board::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("  Rust -- 2024!  "), "rust-2024");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_hyphen = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Check that a slug is non-empty, within length and URL-safe.
///
/// Allowed characters are ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
