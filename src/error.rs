//! API error taxonomy
//!
//! Every handler returns `Result<_, ApiError>`; domain errors convert into it
//! and are rendered as `{"message": ...}` with the matching status code.

use crate::auth::{jwt::TokenError, middleware::GuardError, user_store::CredentialError};
use crate::ratings::aggregator::RatingError;
use crate::stores::store_repo::StoreError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input
    Validation(String),
    DuplicateEmail,
    InvalidCredentials,
    Unauthenticated,
    InvalidToken,
    Forbidden(&'static str),
    NotFound(&'static str),
    OwnerNotFound,
    AlreadyRated,
    /// Persistence or other internal failure; detail stays in the logs
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        debug!(%message, "Validation failed");
        ApiError::Validation(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::OwnerNotFound
            | ApiError::AlreadyRated => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Validation(message) => message,
            ApiError::DuplicateEmail => "Email already registered".to_string(),
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::Unauthenticated => "No access, please sign in".to_string(),
            ApiError::InvalidToken => "Invalid or expired token, please sign in again".to_string(),
            ApiError::Forbidden(message) | ApiError::NotFound(message) => message.to_string(),
            ApiError::OwnerNotFound => "Owner not found or not an OWNER role".to_string(),
            ApiError::AlreadyRated => {
                "You already rated this store; update your rating instead".to_string()
            }
            ApiError::Storage(e) => {
                error!(error = ?e, "Storage failure");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Storage(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<GuardError> for ApiError {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::Unauthenticated => ApiError::Unauthenticated,
            GuardError::InvalidToken => ApiError::InvalidToken,
            GuardError::Forbidden => ApiError::Forbidden("Forbidden: insufficient role"),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Issue(detail) => {
                ApiError::Storage(anyhow::anyhow!("token signing failed: {detail}"))
            }
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::DuplicateEmail => ApiError::DuplicateEmail,
            CredentialError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OwnerNotFound => ApiError::OwnerNotFound,
            StoreError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<RatingError> for ApiError {
    fn from(e: RatingError) -> Self {
        match e {
            RatingError::OutOfRange(_) => ApiError::validation("Rating must be between 1 and 5"),
            RatingError::StoreNotFound => ApiError::NotFound("Store not found"),
            RatingError::AlreadyRated => ApiError::AlreadyRated,
            RatingError::Forbidden => ApiError::Forbidden("Not allowed"),
            RatingError::Storage(e) => ApiError::Storage(e),
        }
    }
}

/// JSON body extractor whose rejection is a 400 `ApiError::Validation`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path extractor whose rejection is a 400 `ApiError::Validation`
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Run storage or password-hashing work on the blocking pool.
/// SQLite calls and bcrypt must never run on the async workers.
pub async fn run_blocking<F, T, E>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => Err(ApiError::Storage(
            anyhow::Error::new(e).context("Blocking task failed"),
        )),
    }
}
