//! HTTP API routes for the actor runner
//!
//! The credential is passed per request (`api_token` in the JSON body, or a
//! bearer `Authorization` header) and never stored.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use shared_types::{ApiErrorBody, ApiErrorDetail};

pub mod actors;
pub mod runs;

use crate::orchestrator::RunError;
use crate::platform::ApiToken;
use crate::state::AppState;

/// Configure all API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/actors", post(actors::list_actors))
        .route("/api/actors/{actor_id}/schema", post(actors::get_schema))
        .route("/api/actors/{actor_id}/runs", post(runs::execute_run))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Upstream { status_code: u16, message: String },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub(crate) fn upstream((status_code, message): (u16, String)) -> Self {
        Self::Upstream {
            status_code,
            message,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status_code, .. } => {
                StatusCode::from_u16(*status_code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Cancelled { .. } => ApiError::Internal(err.to_string()),
            other => ApiError::Upstream {
                status_code: other.status_code(),
                message: other.message(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Parses an optional JSON body; an empty body yields the default value.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))
}

/// Resolves the caller's credential before any platform call is made.
pub(crate) fn require_credential(
    headers: &HeaderMap,
    body_token: Option<&str>,
) -> Result<ApiToken, ApiError> {
    let header_token = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| ApiToken::parse(Some(token)))
    };

    ApiToken::parse(body_token)
        .or_else(header_token)
        .ok_or_else(|| ApiError::Validation("api_token is required".to_string()))
}
