//! Router configuration for the web layer.

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    access_page, board_detail, create_page, create_thread, fetch_updates, index, login,
    login_page, logout, post_comment, signup, signup_page, unlock, AppState,
};
use super::middleware::{rate_limit, security_headers, session_layer, Guarded, RateLimitState};

/// Create the main router.
pub fn create_router(app_state: Arc<AppState>, rate_limit_state: Arc<RateLimitState>) -> Router {
    let login_limit = rate_limit_state.clone();
    let unlock_limit = rate_limit_state;

    let login_routes = Router::new()
        .route("/login/", get(login_page).post(login))
        .route_layer(middleware::from_fn(move |req, next| {
            rate_limit(login_limit.clone(), Guarded::Login, req, next)
        }));

    let unlock_routes = Router::new()
        .route("/access/:slug/", get(access_page).post(unlock))
        .route_layer(middleware::from_fn(move |req, next| {
            rate_limit(unlock_limit.clone(), Guarded::Unlock, req, next)
        }));

    let pages = Router::new()
        .route("/", get(index))
        .route("/board/:slug/", get(board_detail).post(post_comment))
        .route("/board/:slug/fetch_updates/", get(fetch_updates))
        .route("/create/", get(create_page).post(create_thread))
        .route("/signup/", get(signup_page).post(signup))
        .route("/logout/", get(logout))
        .merge(login_routes)
        .merge(unlock_routes);

    pages
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    session_layer,
                )),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
