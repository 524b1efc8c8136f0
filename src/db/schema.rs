//! Database schema and migrations for noticeboard.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 PHC string
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: threads
    r#"
CREATE TABLE threads (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_name  TEXT NOT NULL CHECK (length(thread_name) BETWEEN 1 AND 100),
    slug         TEXT NOT NULL UNIQUE
                 CHECK (length(slug) BETWEEN 1 AND 100 AND slug NOT GLOB '*[^A-Za-z0-9_-]*'),
    password     TEXT NOT NULL DEFAULT '',   -- empty, or an Argon2 PHC string
    created_at   INTEGER NOT NULL            -- microseconds since the Unix epoch
);
"#,
    // v3: comments
    r#"
CREATE TABLE comments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id   INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    user_id     INTEGER REFERENCES users(id) ON DELETE SET NULL,
    content     TEXT NOT NULL,
    created_at  INTEGER NOT NULL             -- microseconds since the Unix epoch
);

CREATE INDEX idx_comments_thread_created ON comments(thread_id, created_at, id);
"#,
    // v4: server-side sessions
    r#"
CREATE TABLE sessions (
    id          TEXT PRIMARY KEY,
    user_id     INTEGER,                     -- not a foreign key: a stale id renders as "Unknown"
    created_at  INTEGER NOT NULL,            -- seconds since the Unix epoch
    expires_at  INTEGER NOT NULL
);

CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);

CREATE TABLE session_unlocks (
    session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    thread_id   INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    PRIMARY KEY (session_id, thread_id)
);

CREATE TABLE session_flashes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    level       TEXT NOT NULL,               -- 'success' or 'error'
    message     TEXT NOT NULL
);

CREATE INDEX idx_session_flashes_session ON session_flashes(session_id);
"#,
];
