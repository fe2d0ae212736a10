use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tollgate::{Keyspace, TollgateError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Too many failed attempts, retry after {retry_after_seconds} seconds")]
    TooManyAttempts {
        scope: Keyspace,
        retry_after_seconds: i64,
    },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<TollgateError> for AuthError {
    fn from(err: TollgateError) -> Self {
        match err {
            TollgateError::TooManyAttempts {
                scope,
                retry_after_seconds,
            } => AuthError::TooManyAttempts {
                scope,
                retry_after_seconds,
            },
            TollgateError::InvalidCredentials => AuthError::InvalidCredentials,
            TollgateError::Validation(e) => AuthError::BadRequest(e.to_string()),
            other => {
                tracing::error!(error = %other, "Login flow failed");
                AuthError::InternalError(other.to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let scope = match &self {
            AuthError::TooManyAttempts { scope, .. } => Some(*scope),
            _ => None,
        };

        let (status, error_message, retry_after) = match self {
            AuthError::TooManyAttempts {
                retry_after_seconds,
                ..
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed login attempts".to_string(),
                Some(retry_after_seconds),
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials".to_string(),
                None,
            ),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            // Internal details stay in the logs
            AuthError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        };

        let mut body = json!({
            "error": error_message,
            "code": status.as_u16()
        });
        if let (Some(scope), Some(seconds)) = (scope, retry_after) {
            body["scope"] = json!(scope);
            body["retry_after_seconds"] = json!(seconds);
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockout_maps_to_429_with_retry_after() {
        let response = AuthError::from(TollgateError::TooManyAttempts {
            scope: Keyspace::Account,
            retry_after_seconds: 120,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "120");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (TollgateError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                TollgateError::Configuration("bad".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                TollgateError::Verifier("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AuthError::from(err).into_response().status(), status);
        }
    }
}
