//! Web layer for noticeboard.
//!
//! Page routes answer with JSON view-models, form posts are urlencoded and
//! answered with `303 See Other`. Sessions are carried in a cookie that
//! names a server-side session row.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{ApiError, PollError};
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
