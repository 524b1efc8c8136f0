//! Signup, login and logout handlers.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use std::sync::Arc;

use crate::auth::{register, RegistrationRequest, SessionError};
use crate::db::{Flash, UserRepository};
use crate::web::dto::{FormPage, LoginForm, SignupForm, ValidatedForm};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{CurrentSession, RotatedSession};
use crate::BoardError;

/// Flash shown after a successful signup.
pub const SIGNUP_SUCCESS: &str = "Registration successful. You can now log in.";

/// Flash shown after a successful login.
pub const LOGIN_SUCCESS: &str = "Logged in successfully.";

/// Flash shown after logging out.
pub const LOGOUT_SUCCESS: &str = "Logged out successfully.";

const SIGNUP_FIELDS: &[&str] = &["username", "password", "password_confirm"];
const LOGIN_FIELDS: &[&str] = &["username", "password"];

/// GET /signup/ - Registration form.
pub async fn signup_page(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<FormPage>, ApiError> {
    let messages = state.sessions().take_flashes(&session).await?;
    Ok(Json(FormPage::new("signup", "/signup/", SIGNUP_FIELDS, messages)))
}

/// POST /signup/ - Register a user.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    let request = RegistrationRequest::new(form.username, form.password, form.password_confirm);
    register(&UserRepository::new(state.db.pool()), request)
        .await
        .map_err(BoardError::from)?;

    state
        .sessions()
        .flash(&session, Flash::success(SIGNUP_SUCCESS))
        .await?;
    Ok(Redirect::to("/login/").into_response())
}

/// GET /login/ - Login form.
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<FormPage>, ApiError> {
    let messages = state.sessions().take_flashes(&session).await?;
    Ok(Json(FormPage::new("login", "/login/", LOGIN_FIELDS, messages)))
}

/// POST /login/ - Log in.
///
/// Bad credentials flash a generic message and return to the form. On
/// success the session is replaced and the new id is sent as a cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    ValidatedForm(form): ValidatedForm<LoginForm>,
) -> Result<Response, ApiError> {
    let sessions = state.sessions();

    match sessions.login(&session, &form.username, &form.password).await {
        Ok((new_session, _user)) => {
            sessions
                .flash(&new_session, Flash::success(LOGIN_SUCCESS))
                .await?;
            let mut response = Redirect::to("/").into_response();
            response
                .extensions_mut()
                .insert(RotatedSession(new_session.id));
            Ok(response)
        }
        Err(e @ SessionError::InvalidCredentials) => {
            sessions.flash(&session, Flash::error(e.to_string())).await?;
            Ok(Redirect::to("/login/").into_response())
        }
        Err(e) => Err(BoardError::from(e).into()),
    }
}

/// GET /logout/ - Clear the session's identity.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentSession(mut session): CurrentSession,
) -> Result<Redirect, ApiError> {
    let sessions = state.sessions();
    if sessions.logout(&mut session).await? {
        sessions
            .flash(&session, Flash::success(LOGOUT_SUCCESS))
            .await?;
    }
    Ok(Redirect::to("/"))
}
