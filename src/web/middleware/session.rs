//! Session cookie middleware.
//!
//! Every request gets a session. One started for this request lives in
//! memory until a handler stores something in it; the cookie is sent once
//! it has been stored, or when a handler replaced the session.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

use crate::db::Session;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for the request's session.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| ApiError::internal("Session layer not configured"))
    }
}

/// Response extension set by handlers that issued a new session id.
#[derive(Debug, Clone)]
pub struct RotatedSession(pub String);

/// Load the session named by the cookie, or start a transient one.
pub async fn session_layer(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_id = jar
        .get(&state.session.cookie_name)
        .map(|c| c.value().to_string());

    let session = match state.sessions().load_or_start(cookie_id.as_deref()).await {
        Ok(session) => session,
        Err(e) => return ApiError::from(e).into_response(),
    };
    let session_id = session.id.clone();
    let transient = session.transient;
    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;

    let issued = match response.extensions_mut().remove::<RotatedSession>() {
        Some(RotatedSession(id)) => Some(id),
        None if transient => match state.sessions().load(&session_id).await {
            Ok(stored) => stored.map(|s| s.id),
            Err(e) => {
                warn!(error = %e, "Failed to look up new session");
                None
            }
        },
        None => None,
    };

    match issued {
        Some(id) => (jar.add(state.session_cookie(id)), response).into_response(),
        None => response,
    }
}
