//! Board handlers: thread list, thread pages, comments, polling, unlock
//! and thread creation.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use std::sync::Arc;

use crate::auth::SessionError;
use crate::board::{CreateThreadRequest, PostOutcome, ThreadView, LOGIN_REQUIRED};
use crate::datetime::to_rfc3339;
use crate::db::{Flash, Session};
use crate::web::dto::{
    BoardPage, CommentForm, CommentResponse, CreateThreadForm, FormPage, IndexPage, PollQuery,
    PollResponse, ThreadSummary, UnlockForm, ValidatedForm,
};
use crate::web::error::{ApiError, PollError};
use crate::web::handlers::AppState;
use crate::web::middleware::{CurrentSession, Negotiated};
use crate::{BoardError, ResponseMode};

/// Flash shown when a locked thread is requested.
pub const THREAD_LOCKED: &str = "This board is password protected. Please enter the password.";

const UNLOCK_FIELDS: &[&str] = &["password"];
const CREATE_FIELDS: &[&str] = &["thread_name", "slug", "password"];

fn board_url(slug: &str) -> String {
    format!("/board/{slug}/")
}

fn access_url(slug: &str) -> String {
    format!("/access/{slug}/")
}

/// Flash the lock notice and send the client to the unlock form.
async fn redirect_to_unlock(
    state: &AppState,
    session: &Session,
    slug: &str,
) -> Result<Response, ApiError> {
    state
        .sessions()
        .flash(session, Flash::error(THREAD_LOCKED))
        .await?;
    Ok(Redirect::to(&access_url(slug)).into_response())
}

/// Render an open thread as its page model.
async fn render_board(
    state: &AppState,
    session: &Session,
    view: ThreadView,
) -> Result<Response, ApiError> {
    let ThreadView::Open {
        thread,
        comments,
        last_timestamp,
    } = view
    else {
        return Err(ApiError::forbidden(THREAD_LOCKED));
    };

    let messages = state.sessions().take_flashes(session).await?;
    let page = BoardPage {
        thread: ThreadSummary::new(&thread, state.tz),
        comments: comments
            .iter()
            .map(|c| CommentResponse::new(c, state.tz))
            .collect(),
        board_slug: thread.slug.clone(),
        last_timestamp: last_timestamp.map(|t| to_rfc3339(t, state.tz)),
        current_user: session.user_id,
        messages,
    };
    Ok(Json(page).into_response())
}

/// GET / - List threads.
pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentSession(mut session): CurrentSession,
) -> Result<Json<IndexPage>, ApiError> {
    let sessions = state.sessions();
    let current = sessions.current_user(&mut session).await?;
    let threads = state.board().list_threads().await?;
    let messages = sessions.take_flashes(&session).await?;

    Ok(Json(IndexPage {
        threads: threads
            .iter()
            .map(|t| ThreadSummary::new(t, state.tz))
            .collect(),
        username: current.display_name().to_string(),
        messages,
    }))
}

/// GET /board/:slug/ - Show a thread.
pub async fn board_detail(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    match state.board().view_thread(&session, &slug).await? {
        ThreadView::Locked(thread) => redirect_to_unlock(&state, &session, &thread.slug).await,
        view => render_board(&state, &session, view).await,
    }
}

/// POST /board/:slug/ - Post a comment.
///
/// Page callers are redirected; JSON callers get the stored comment.
pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    CurrentSession(mut session): CurrentSession,
    Negotiated(mode): Negotiated,
    Path(slug): Path<String>,
    ValidatedForm(form): ValidatedForm<CommentForm>,
) -> Result<Response, ApiError> {
    let sessions = state.sessions();
    let current = sessions.current_user(&mut session).await?;

    let outcome = state
        .board()
        .post_comment(&session, current.user(), &slug, &form.content, mode)
        .await;

    match outcome {
        Ok(PostOutcome::Locked(thread)) => match mode {
            ResponseMode::Page => redirect_to_unlock(&state, &session, &thread.slug).await,
            ResponseMode::Json => Err(ApiError::forbidden(THREAD_LOCKED)),
        },
        Ok(PostOutcome::Empty(view)) => render_board(&state, &session, view).await,
        Ok(PostOutcome::Redirect { slug }) => Ok(Redirect::to(&board_url(&slug)).into_response()),
        Ok(PostOutcome::Json(comment)) => {
            Ok(Json(CommentResponse::new(&comment, state.tz)).into_response())
        }
        Err(BoardError::Auth(_)) if mode == ResponseMode::Page => {
            sessions
                .flash(&session, Flash::error(LOGIN_REQUIRED))
                .await?;
            Ok(Redirect::to("/login/").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /board/:slug/fetch_updates/ - Comments newer than `last_timestamp`.
pub async fn fetch_updates(
    State(state): State<Arc<AppState>>,
    Negotiated(mode): Negotiated,
    Path(slug): Path<String>,
    Query(query): Query<PollQuery>,
) -> Result<Json<PollResponse>, PollError> {
    let comments = state
        .board()
        .fetch_updates(&slug, query.last_timestamp.as_deref(), mode)
        .await?;

    Ok(Json(PollResponse {
        comments: comments
            .iter()
            .map(|c| CommentResponse::new(c, state.tz))
            .collect(),
    }))
}

/// GET /access/:slug/ - Unlock form.
pub async fn access_page(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(slug): Path<String>,
) -> Result<Json<FormPage>, ApiError> {
    let thread = state.board().get_thread(&slug).await?;
    let messages = state.sessions().take_flashes(&session).await?;
    Ok(Json(FormPage::new(
        "access",
        access_url(&thread.slug),
        UNLOCK_FIELDS,
        messages,
    )))
}

/// POST /access/:slug/ - Unlock a thread for this session.
pub async fn unlock(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(slug): Path<String>,
    ValidatedForm(form): ValidatedForm<UnlockForm>,
) -> Result<Response, ApiError> {
    let thread = state.board().get_thread(&slug).await?;
    let sessions = state.sessions();

    match sessions.unlock(&session, &thread, &form.password).await {
        Ok(()) => Ok(Redirect::to(&board_url(&thread.slug)).into_response()),
        Err(e @ SessionError::IncorrectPassword) => {
            sessions.flash(&session, Flash::error(e.to_string())).await?;
            Ok(Redirect::to(&access_url(&thread.slug)).into_response())
        }
        Err(e) => Err(BoardError::from(e).into()),
    }
}

/// GET /create/ - New thread form.
pub async fn create_page(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<FormPage>, ApiError> {
    let messages = state.sessions().take_flashes(&session).await?;
    Ok(Json(FormPage::new("create", "/create/", CREATE_FIELDS, messages)))
}

/// POST /create/ - Create a thread.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<CreateThreadForm>,
) -> Result<Redirect, ApiError> {
    let request = CreateThreadRequest::new(form.thread_name)
        .with_slug(form.slug)
        .with_password(form.password);
    let thread = state.board().create_thread(&session, request).await?;
    Ok(Redirect::to(&board_url(&thread.slug)))
}
