//! Validating form extractor.

use axum::{
    async_trait,
    extract::{rejection::FormRejection, FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// An urlencoded form extractor that validates the body.
///
/// The body is deserialized with [`Form`] and then checked with the
/// `validator` crate. Failures answer with a 422 carrying the per-field
/// messages.
///
/// ```ignore
/// async fn post_comment(
///     ValidatedForm(form): ValidatedForm<CommentForm>,
/// ) -> Result<Response, ApiError> {
///     // form.content is within bounds
/// }
/// ```
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Form<T>: FromRequest<S, Rejection = FormRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid form: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedForm(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::dto::LoginForm;
    use axum::{body::Body, http::header::CONTENT_TYPE, http::StatusCode, response::IntoResponse};

    fn form_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/login/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_form_passes() {
        let ValidatedForm(form) =
            ValidatedForm::<LoginForm>::from_request(form_request("username=alice&password=pw"), &())
                .await
                .unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, "pw");
    }

    #[tokio::test]
    async fn test_invalid_form_is_422() {
        let rejection =
            ValidatedForm::<LoginForm>::from_request(form_request("username=alice"), &())
                .await
                .err()
                .unwrap();
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
