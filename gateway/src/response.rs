//! Mapping of service errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use error::{AuthError, ErrorResponse};

/// An [`AuthError`] on its way out to the client.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AuthError::MissingField(_) | AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::TokenCreationFailed | AuthError::StoreUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// A plain error body with a fixed status, for failures outside the service.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}
