use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// TokenError
///
/// Failure modes of token verification. These are the only outcomes the codec can
/// produce besides a valid claim set; each one maps to an unauthorized response at
/// the middleware boundary, and none of them carries secret material.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not parse into the expected header/claims structure.
    #[error("malformed token")]
    Malformed,
    /// The signature does not match the payload (tampered, truncated, or signed
    /// with a different secret).
    #[error("invalid token signature")]
    InvalidSignature,
    /// The signature is valid but the expiry timestamp is not in the future.
    #[error("token expired")]
    Expired,
}

/// ApiError
///
/// The client-facing error taxonomy for the whole application. Every failure that
/// reaches a response boundary is one of these variants; the `IntoResponse` impl
/// below converts it to a structured JSON error with the matching status code.
///
/// `Internal` deliberately renders a fixed message: storage connectivity problems
/// and other unexpected failures are logged where they occur, never serialized.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The Authorization header is absent or not in `Bearer <token>` shape.
    #[error("missing credentials")]
    MissingCredential,
    /// Token verification failed; the codec's error kind supplies the message.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The verified role is not in the route's allowed set, or the role gate ran
    /// without an authenticated identity.
    #[error("forbidden")]
    Forbidden,
    /// Login failed. Unknown identifier and wrong password intentionally collapse
    /// into this single variant so callers cannot enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Registration (or a rename) collided with an existing unique identifier.
    #[error("identifier already registered")]
    DuplicateIdentifier,
    /// The request payload failed validation.
    #[error("{0}")]
    Validation(String),
    /// The addressed record does not exist.
    #[error("not found")]
    NotFound,
    /// Any storage or infrastructure failure. Logged at the point of failure.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCredential | ApiError::Token(_) | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::DuplicateIdentifier => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    /// Storage failures unrelated to the explicit taxonomy propagate as a generic
    /// internal failure. They are logged here, not retried.
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("database error: {:?}", e);
        ApiError::Internal
    }
}
