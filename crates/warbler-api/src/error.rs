use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use warbler_db::DbError;

/// Body returned when an action needs a logged-in user (or the right one).
pub const UNAUTHORIZED_MESSAGE: &str = "Access unauthorized.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// No session, or the session user may not touch this resource.
    /// Answered with 200 and a flash-style body rather than a 401.
    #[error("Access unauthorized.")]
    Unauthorized,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("internal error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized | ApiError::Db(DbError::NotOwner) => {
                (StatusCode::OK, UNAUTHORIZED_MESSAGE).into_response()
            }
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials.").into_response()
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
            }
            ApiError::Db(err @ DbError::UniquenessViolation(_)) => {
                (StatusCode::CONFLICT, err.to_string()).into_response()
            }
            ApiError::Db(err @ (DbError::MissingField(_) | DbError::Validation(_))) => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            ApiError::Db(err @ DbError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            ApiError::Db(err) => {
                error!("Database error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
