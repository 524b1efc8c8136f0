//! Response mode extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::convert::Infallible;

use crate::board::ResponseMode;
use crate::web::dto::FormatQuery;

/// Legacy header sent by asynchronous clients.
pub const REQUESTED_WITH: &str = "X-Requested-With";

/// Extractor for the caller's [`ResponseMode`].
///
/// A `format` query parameter decides; without a recognised value the
/// `X-Requested-With: XMLHttpRequest` header selects JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated(pub ResponseMode);

impl Negotiated {
    /// Determine the mode from request parts.
    pub fn from_parts(parts: &Parts) -> ResponseMode {
        let explicit = Query::<FormatQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.format)
            .and_then(|f| f.parse::<ResponseMode>().ok());
        if let Some(mode) = explicit {
            return mode;
        }

        let async_call = parts
            .headers
            .get(REQUESTED_WITH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        if async_call {
            ResponseMode::Json
        } else {
            ResponseMode::Page
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Negotiated
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Negotiated(Self::from_parts(parts)))
    }
}
