//! Threads, comments, unlocking and polling over HTTP.

mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use common::{
    assert_redirect, create_thread, messages, poll, post_comment, signup_and_login, xhr, TestApp,
};
use noticeboard::{CommentRepository, NewComment, NewThread, SessionRepository, ThreadRepository};
use serde_json::{json, Value};

const SECOND: i64 = 1_000_000;

#[tokio::test]
async fn test_end_to_end_alice() {
    let app = TestApp::new().await;
    let client = app.client();

    signup_and_login(&client, "alice").await;

    let response = create_thread(&client, "General", "", "").await;
    assert_redirect(&response, "/board/general/");

    let page: Value = client.get("/board/general/").await.json();
    assert_eq!(page["thread"]["name"], "General");
    assert_eq!(page["thread"]["protected"], false);
    assert_eq!(page["last_timestamp"], Value::Null);
    assert!(page["current_user"].is_i64());

    assert_redirect(&post_comment(&client, "general", "hi").await, "/board/general/");

    let response = poll(&client, "general", None).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "hi");
    assert_eq!(comments[0]["username"], "alice");
}

#[tokio::test]
async fn test_index_lists_threads_in_storage_order() {
    let app = TestApp::new().await;
    let client = app.client();

    create_thread(&client, "Zebra", "", "").await;
    create_thread(&client, "Apple", "", "secret").await;

    let page: Value = client.get("/").await.json();
    let threads = page["threads"].as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["slug"], "zebra");
    assert_eq!(threads[1]["slug"], "apple");
    assert_eq!(threads[1]["protected"], true);
}

#[tokio::test]
async fn test_derived_slug_collision_is_rejected() {
    let app = TestApp::new().await;
    let client = app.client();

    assert_redirect(
        &create_thread(&client, "Hello World", "", "").await,
        "/board/hello-world/",
    );

    let response = create_thread(&client, "hello   world", "", "").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["details"]["slug"][0],
        "Thread with this Slug already exists."
    );

    let page: Value = client.get("/").await.json();
    assert_eq!(page["threads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_thread_requires_name() {
    let app = TestApp::new().await;
    let client = app.client();

    let response = create_thread(&client, "", "", "").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["details"]["thread_name"][0],
        "This field is required."
    );
}

#[tokio::test]
async fn test_explicit_slug() {
    let app = TestApp::new().await;
    let client = app.client();

    assert_redirect(
        &create_thread(&client, "Random", "off_topic", "").await,
        "/board/off_topic/",
    );
    client.get("/board/off_topic/").await.assert_status_ok();
}

#[tokio::test]
async fn test_anonymous_reads_store_no_session() {
    let app = TestApp::new().await;
    let creator = app.client();
    create_thread(&creator, "General", "", "").await;

    for _ in 0..5 {
        let client = app.client();
        let response = client.get("/").await;
        response.assert_status_ok();
        assert!(response.headers().get("set-cookie").is_none());

        client.get("/board/general/").await.assert_status_ok();
        poll(&client, "general", None).await.assert_status_ok();
        poll(&client, "missing", None)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    assert_eq!(SessionRepository::new(app.db.pool()).count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_protected_thread_locked_for_fresh_session() {
    let app = TestApp::new().await;
    let creator = app.client();
    let visitor = app.client();

    assert_redirect(
        &create_thread(&creator, "Secret", "", "hunter2").await,
        "/board/secret/",
    );

    // The creator is let straight in.
    creator.get("/board/secret/").await.assert_status_ok();

    // A fresh session is sent to the unlock form.
    let response = visitor.get("/board/secret/").await;
    assert_redirect(&response, "/access/secret/");

    let page: Value = visitor.get("/access/secret/").await.json();
    assert_eq!(page["form"], "access");
    assert_eq!(page["action"], "/access/secret/");
    assert_eq!(
        messages(&page),
        vec!["This board is password protected. Please enter the password."]
    );
}

#[tokio::test]
async fn test_unlock_flow() {
    let app = TestApp::new().await;
    let creator = app.client();
    let visitor = app.client();
    create_thread(&creator, "Secret", "", "hunter2").await;

    let response = visitor
        .post("/access/secret/")
        .form(&json!({ "password": "wrong" }))
        .await;
    assert_redirect(&response, "/access/secret/");
    let page: Value = visitor.get("/access/secret/").await.json();
    assert_eq!(messages(&page), vec!["Incorrect password."]);
    assert_redirect(&visitor.get("/board/secret/").await, "/access/secret/");

    let response = visitor
        .post("/access/secret/")
        .form(&json!({ "password": "hunter2" }))
        .await;
    assert_redirect(&response, "/board/secret/");

    // Unlocked for the rest of the session.
    visitor.get("/board/secret/").await.assert_status_ok();
    visitor.get("/board/secret/").await.assert_status_ok();
}

#[tokio::test]
async fn test_unlock_not_shared_between_sessions() {
    let app = TestApp::new().await;
    let creator = app.client();
    let first = app.client();
    let second = app.client();
    create_thread(&creator, "Secret", "", "hunter2").await;

    first
        .post("/access/secret/")
        .form(&json!({ "password": "hunter2" }))
        .await;
    first.get("/board/secret/").await.assert_status_ok();

    assert_redirect(&second.get("/board/secret/").await, "/access/secret/");
}

#[tokio::test]
async fn test_login_starts_with_fresh_unlock_set() {
    let app = TestApp::new().await;
    let creator = app.client();
    let visitor = app.client();
    create_thread(&creator, "Secret", "", "hunter2").await;

    visitor
        .post("/access/secret/")
        .form(&json!({ "password": "hunter2" }))
        .await;
    visitor.get("/board/secret/").await.assert_status_ok();

    signup_and_login(&visitor, "bob").await;
    assert_redirect(&visitor.get("/board/secret/").await, "/access/secret/");
}

#[tokio::test]
async fn test_unlock_rate_limited() {
    let app = TestApp::with_rate_limits(100, 1).await;
    let creator = app.client();
    create_thread(&creator, "Secret", "", "hunter2").await;

    let visitor = app.client();
    let wrong = json!({ "password": "wrong" });
    assert_redirect(
        &visitor.post("/access/secret/").form(&wrong).await,
        "/access/secret/",
    );
    visitor
        .post("/access/secret/")
        .form(&wrong)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_post_requires_login() {
    let app = TestApp::new().await;
    let client = app.client();
    create_thread(&client, "General", "", "").await;

    let response = post_comment(&client, "general", "hi").await;
    assert_redirect(&response, "/login/");

    let page: Value = client.get("/login/").await.json();
    assert_eq!(
        messages(&page),
        vec!["You must be logged in to post a comment."]
    );

    let thread = ThreadRepository::new(app.db.pool())
        .get_by_slug("general")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        CommentRepository::new(app.db.pool())
            .count_by_thread(thread.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_async_post_requires_login() {
    let app = TestApp::new().await;
    let client = app.client();
    create_thread(&client, "General", "", "").await;

    let (name, value) = xhr();
    let response = client
        .post("/board/general/")
        .add_header(name, value)
        .form(&json!({ "content": "hi" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_to_locked_thread_redirects_to_unlock() {
    let app = TestApp::new().await;
    let creator = app.client();
    create_thread(&creator, "Secret", "", "hunter2").await;

    let visitor = app.client();
    signup_and_login(&visitor, "bob").await;

    let response = post_comment(&visitor, "secret", "let me in").await;
    assert_redirect(&response, "/access/secret/");
}

#[tokio::test]
async fn test_empty_comment_renders_board() {
    let app = TestApp::new().await;
    let client = app.client();
    signup_and_login(&client, "alice").await;
    create_thread(&client, "General", "", "").await;

    let response = post_comment(&client, "general", "").await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["board_slug"], "general");
    assert!(page["comments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_async_post_returns_comment_fragment() {
    let app = TestApp::new().await;
    let client = app.client();
    signup_and_login(&client, "alice").await;
    create_thread(&client, "General", "", "").await;

    let response = client
        .post("/board/general/")
        .add_query_param("format", "json")
        .form(&json!({ "content": "hello" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["content"], "hello");
    assert_eq!(body["username"], "alice");
    let created_at = body["created_at"].as_str().unwrap();
    assert_eq!(created_at.len(), "2024/01/01 00:00:00".len());
    assert_eq!(&created_at[4..5], "/");
}

#[tokio::test]
async fn test_board_page_lists_comments() {
    let app = TestApp::new().await;
    let client = app.client();
    signup_and_login(&client, "alice").await;
    create_thread(&client, "General", "", "").await;

    post_comment(&client, "general", "first").await;
    post_comment(&client, "general", "second").await;

    let page: Value = client.get("/board/general/").await.json();
    let contents: Vec<&str> = page["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second"]);
    assert!(page["last_timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_board_is_404() {
    let app = TestApp::new().await;
    let client = app.client();

    client
        .get("/board/missing/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    client
        .get("/access/missing/")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    poll(&client, "missing", None)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

async fn seed_poll_thread(app: &TestApp) -> i64 {
    let thread = ThreadRepository::new(app.db.pool())
        .create(&NewThread::new("General", "general"))
        .await
        .unwrap();
    let t = Utc
        .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .unwrap()
        .timestamp_micros();

    let comments = CommentRepository::new(app.db.pool());
    for (content, at) in [("before", t - SECOND), ("at", t), ("after", t + SECOND)] {
        comments
            .create(&NewComment::anonymous(thread.id, content).at(at))
            .await
            .unwrap();
    }
    t
}

fn contents(body: &Value) -> Vec<String> {
    body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_poll_returns_strictly_newer_comments() {
    let app = TestApp::new().await;
    seed_poll_thread(&app).await;
    let client = app.client();

    let all: Value = poll(&client, "general", None).await.json();
    assert_eq!(contents(&all), vec!["before", "at", "after"]);
    assert_eq!(all["comments"][0]["username"], "Anonymous");
    assert_eq!(all["comments"][1]["created_at"], "2024/01/01 12:00:00");

    for since in [
        "2024-01-01T12:00:00+00:00",
        "2024-01-01T12:00:00Z",
        "2024-01-01T21:00:00+09:00",
        "2024-01-01T12:00:00",
        "2024-01-01 12:00:00.000000",
    ] {
        let response = poll(&client, "general", Some(since)).await;
        response.assert_status_ok();
        assert_eq!(contents(&response.json()), vec!["after"], "since {since}");
    }

    let newest: Value = poll(&client, "general", Some("2024-01-01T12:00:01Z"))
        .await
        .json();
    assert!(contents(&newest).is_empty());

    let empty: Value = poll(&client, "general", Some("")).await.json();
    assert_eq!(contents(&empty).len(), 3);
}

#[tokio::test]
async fn test_poll_with_board_last_timestamp() {
    let app = TestApp::new().await;
    seed_poll_thread(&app).await;
    let client = app.client();

    let page: Value = client.get("/board/general/").await.json();
    let cursor = page["last_timestamp"].as_str().unwrap().to_string();

    let body: Value = poll(&client, "general", Some(&cursor)).await.json();
    assert!(contents(&body).is_empty());
}

#[tokio::test]
async fn test_poll_rejects_malformed_timestamp() {
    let app = TestApp::new().await;
    seed_poll_thread(&app).await;
    let client = app.client();

    let response = poll(&client, "general", Some("yesterday")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Invalid timestamp format" }));
}

#[tokio::test]
async fn test_poll_requires_async_signal() {
    let app = TestApp::new().await;
    seed_poll_thread(&app).await;
    let client = app.client();

    let response = client.get("/board/general/fetch_updates/").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Invalid request" }));

    let response = client
        .get("/board/general/fetch_updates/")
        .add_query_param("format", "json")
        .await;
    response.assert_status_ok();
    assert_eq!(contents(&response.json()).len(), 3);
}
