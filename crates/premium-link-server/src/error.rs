//! Error types for the premium link server.

use axum::extract::rejection::JsonRejection;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use premium_link_types::{AddressError, ProfileIdError};
use serde::Serialize;

/// Message returned when a profile is bound elsewhere. The holding wallet is
/// never included.
pub const CONFLICT_MESSAGE: &str = "Profile is already linked to another wallet";

/// Seconds a client should wait before retrying an upstream failure.
const RETRY_AFTER_SECS: &str = "1";

/// Message returned when auto-link finds nothing to link.
pub const NO_ELIGIBLE_PROFILE_MESSAGE: &str = "No eligible profile";

/// Domain errors produced by the linking core.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Profile is not owned by this wallet")]
    Ownership,

    #[error("{}", CONFLICT_MESSAGE)]
    Conflict,

    #[error("Ownership oracle unavailable: {0}")]
    Upstream(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LinkError {
    pub fn invalid_wallet(field: &'static str, err: AddressError) -> Self {
        LinkError::Validation {
            field,
            message: err.to_string(),
        }
    }

    pub fn invalid_profile(field: &'static str, err: ProfileIdError) -> Self {
        LinkError::Validation {
            field,
            message: err.to_string(),
        }
    }

    /// Returns true for errors the client may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LinkError::Upstream(_))
    }
}

impl From<sqlx::Error> for LinkError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            // A unique index fired despite the transactional re-check: some
            // other writer won the race for the same key.
            sqlx::Error::Database(db) if db.is_unique_violation() => LinkError::Conflict,
            _ => LinkError::Storage(e.to_string()),
        }
    }
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

fn error_response(status: StatusCode, error: impl Into<String>, field: Option<&'static str>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
            field,
        }),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg, None),
            AppError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => error_response(StatusCode::UNAUTHORIZED, msg, None),
            AppError::Link(err) => link_error_response(err),
        }
    }
}

fn link_error_response(err: LinkError) -> Response {
    let retryable = err.is_retryable();
    let mut response = match err {
        LinkError::Validation { field, message } => error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid {}: {}", field, message),
            Some(field),
        ),
        LinkError::Ownership => error_response(StatusCode::FORBIDDEN, err.to_string(), None),
        LinkError::Conflict => error_response(StatusCode::CONFLICT, CONFLICT_MESSAGE, None),
        LinkError::Upstream(detail) => {
            tracing::warn!("Ownership oracle error: {}", detail);
            error_response(
                StatusCode::BAD_GATEWAY,
                "Profile ownership service unavailable, please retry",
                None,
            )
        }
        LinkError::NotFound(msg) => error_response(StatusCode::BAD_REQUEST, msg, None),
        LinkError::Storage(detail) => {
            tracing::error!("Storage error: {}", detail);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
        }
    };

    if retryable {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_includes_field() {
        let err = AppError::from(LinkError::invalid_wallet(
            "walletAddress",
            AddressError::MissingPrefix,
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["field"], "walletAddress");
        assert!(json["error"].as_str().unwrap().contains("0x"));
    }

    #[tokio::test]
    async fn test_status_codes() {
        let cases = [
            (LinkError::Ownership, StatusCode::FORBIDDEN),
            (LinkError::Conflict, StatusCode::CONFLICT),
            (LinkError::Upstream("timeout".into()), StatusCode::BAD_GATEWAY),
            (
                LinkError::NotFound(NO_ELIGIBLE_PROFILE_MESSAGE.into()),
                StatusCode::BAD_REQUEST,
            ),
            (LinkError::Storage("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_upstream_detail_not_leaked() {
        let response =
            AppError::from(LinkError::Upstream("connect to 10.0.0.7 refused".into())).into_response();
        let json = body_json(response).await;
        assert!(!json["error"].as_str().unwrap().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_conflict_has_no_field() {
        let json = body_json(AppError::from(LinkError::Conflict).into_response()).await;
        assert_eq!(json["error"], CONFLICT_MESSAGE);
        assert!(json.get("field").is_none());
    }

    #[test]
    fn test_only_upstream_sets_retry_after() {
        let response = AppError::from(LinkError::Upstream("timeout".into())).into_response();
        assert_eq!(response.headers()[RETRY_AFTER], RETRY_AFTER_SECS);

        let response = AppError::from(LinkError::Conflict).into_response();
        assert!(response.headers().get(RETRY_AFTER).is_none());
    }

    #[test]
    fn test_only_upstream_is_retryable() {
        assert!(LinkError::Upstream("x".into()).is_retryable());
        assert!(!LinkError::Conflict.is_retryable());
        assert!(!LinkError::Ownership.is_retryable());
    }

    #[test]
    fn test_non_unique_sqlx_error_maps_to_storage() {
        let err = LinkError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, LinkError::Storage(_)));
    }
}
