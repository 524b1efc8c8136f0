//! Test helpers for the HTTP integration tests.
//!
//! Each [`TestApp`] owns an in-memory database. Clients keep cookies, so a
//! client is one browser session; [`TestApp::client`] opens another.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::Router;
use axum_test::{TestResponse, TestServer, TestServerConfig};
use noticeboard::config::Config;
use noticeboard::web::middleware::RateLimitState;
use noticeboard::{create_router, AppState, Database};
use serde_json::{json, Value};

/// Password that satisfies the signup policy.
pub const PASSWORD: &str = "Passw0rd!";

/// An application under test.
pub struct TestApp {
    pub db: Database,
    router: Router,
}

impl TestApp {
    /// Create an application with an in-memory database and generous rate limits.
    pub async fn new() -> Self {
        Self::with_rate_limits(100, 100).await
    }

    /// Create an application with the given login and unlock rate limits.
    pub async fn with_rate_limits(login_per_minute: u32, unlock_per_minute: u32) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let state = Arc::new(
            AppState::from_config(db.clone(), &Config::default()).expect("Failed to build state"),
        );
        let rate_limits = Arc::new(RateLimitState::new(login_per_minute, unlock_per_minute));
        let router = create_router(state, rate_limits);
        Self { db, router }
    }

    /// Open a new client with its own session cookie.
    pub fn client(&self) -> TestServer {
        let config = TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        };
        TestServer::new_with_config(self.router.clone(), config)
            .expect("Failed to create test server")
    }
}

/// Header marking a request as asynchronous.
pub fn xhr() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    )
}

/// Assert a `303 See Other` to `location`.
pub fn assert_redirect(response: &TestResponse, location: &str) {
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location").to_str().unwrap(),
        location,
        "unexpected redirect target"
    );
}

/// Flash message texts from a page model.
pub fn messages(page: &Value) -> Vec<String> {
    page["messages"]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Submit the signup form.
pub async fn signup(client: &TestServer, username: &str, password: &str) -> TestResponse {
    client
        .post("/signup/")
        .form(&json!({
            "username": username,
            "password": password,
            "password_confirm": password,
        }))
        .await
}

/// Submit the login form.
pub async fn login(client: &TestServer, username: &str, password: &str) -> TestResponse {
    client
        .post("/login/")
        .form(&json!({
            "username": username,
            "password": password,
        }))
        .await
}

/// Register and log in a user on this client.
pub async fn signup_and_login(client: &TestServer, username: &str) {
    assert_redirect(&signup(client, username, PASSWORD).await, "/login/");
    assert_redirect(&login(client, username, PASSWORD).await, "/");
}

/// Submit the new thread form.
pub async fn create_thread(
    client: &TestServer,
    thread_name: &str,
    slug: &str,
    password: &str,
) -> TestResponse {
    client
        .post("/create/")
        .form(&json!({
            "thread_name": thread_name,
            "slug": slug,
            "password": password,
        }))
        .await
}

/// Post a comment through the page flow.
pub async fn post_comment(client: &TestServer, slug: &str, content: &str) -> TestResponse {
    client
        .post(&format!("/board/{slug}/"))
        .form(&json!({ "content": content }))
        .await
}

/// Poll a thread as an asynchronous client.
pub async fn poll(client: &TestServer, slug: &str, last_timestamp: Option<&str>) -> TestResponse {
    let (name, value) = xhr();
    let mut request = client
        .get(&format!("/board/{slug}/fetch_updates/"))
        .add_header(name, value);
    if let Some(since) = last_timestamp {
        request = request.add_query_param("last_timestamp", since);
    }
    request.await
}
