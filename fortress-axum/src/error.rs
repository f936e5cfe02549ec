use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use fortress::Error as FortressError;
use fortress_core::error::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid email or password")]
    InvalidCredentials {
        /// Attempts left before the account locks, when known.
        remaining_attempts: Option<u32>,
    },

    #[error("Account is temporarily locked")]
    AccountLocked { retry_after_seconds: i64 },

    #[error("Too many requests")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<FortressError> for ApiError {
    fn from(err: FortressError) -> Self {
        match err {
            FortressError::Auth(AuthError::AccountLocked {
                retry_after_seconds,
            }) => ApiError::AccountLocked {
                retry_after_seconds,
            },
            FortressError::Auth(AuthError::RateLimited {
                retry_after_seconds,
            }) => ApiError::RateLimited {
                retry_after_seconds,
            },
            FortressError::Auth(AuthError::InvalidCredentials) => ApiError::InvalidCredentials {
                remaining_attempts: None,
            },
            FortressError::Auth(AuthError::PermissionDenied(_)) => ApiError::Forbidden,
            FortressError::Auth(_) => ApiError::Unauthorized,
            FortressError::Validation(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // One message for unknown email and wrong password alike; the
            // attempt counter is the only detail disclosed.
            ApiError::InvalidCredentials { remaining_attempts } => {
                let body = Json(json!({
                    "error": "Invalid email or password",
                    "code": StatusCode::UNAUTHORIZED.as_u16(),
                    "remaining_attempts": remaining_attempts,
                }));
                (StatusCode::UNAUTHORIZED, body).into_response()
            }
            ApiError::AccountLocked {
                retry_after_seconds,
            } => retry_response(
                "Account is temporarily locked",
                retry_after_seconds,
            ),
            ApiError::RateLimited {
                retry_after_seconds,
            } => retry_response("Too many requests", retry_after_seconds),
            ApiError::Unauthorized => simple_response(StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden => simple_response(StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::BadRequest(msg) => simple_response(StatusCode::BAD_REQUEST, &msg),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error serving request");
                simple_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn simple_response(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "code": status.as_u16(),
    }));
    (status, body).into_response()
}

fn retry_response(message: &str, retry_after_seconds: i64) -> Response {
    let status = StatusCode::TOO_MANY_REQUESTS;
    let body = Json(json!({
        "error": message,
        "code": status.as_u16(),
        "retry_after_seconds": retry_after_seconds,
    }));
    (
        status,
        [(header::RETRY_AFTER, retry_after_seconds.max(0).to_string())],
        body,
    )
        .into_response()
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fortress_core::error::{StorageError, ValidationError};

    #[test]
    fn test_lockout_maps_to_429_with_retry_after() {
        let err: ApiError = FortressError::Auth(AuthError::AccountLocked {
            retry_after_seconds: 1800,
        })
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "1800"
        );
    }

    #[test]
    fn test_rate_limit_maps_to_429() {
        let err: ApiError = FortressError::Auth(AuthError::RateLimited {
            retry_after_seconds: 42,
        })
        .into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_token_errors_map_to_401() {
        let err: ApiError = FortressError::Auth(AuthError::InvalidRefreshToken).into();
        assert!(matches!(err, ApiError::Unauthorized));

        let err: ApiError =
            FortressError::Auth(AuthError::InvalidAccessToken("expired".into())).into();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError =
            FortressError::Validation(ValidationError::InvalidEmail("nope".into())).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_storage_errors_are_not_leaked() {
        let err: ApiError =
            FortressError::Storage(StorageError::Backend("connection refused".into())).into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
