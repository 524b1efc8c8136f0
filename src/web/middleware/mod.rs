//! Middleware and request extractors for the web layer.

pub mod negotiate;
pub mod rate_limit;
pub mod security;
pub mod session;

pub use negotiate::Negotiated;
pub use rate_limit::{rate_limit, Guarded, RateLimitState};
pub use security::security_headers;
pub use session::{session_layer, CurrentSession, RotatedSession};
