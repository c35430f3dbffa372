//! API gateway adapter for the external actor platform.
//!
//! Every outbound call goes through [`PlatformApi::call`] and comes back as an
//! [`ApiResult`]: one call in, one normalized result out. Retries are not this
//! layer's concern.

mod client;
pub mod endpoints;

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

pub use client::HttpPlatformClient;

/// Status used when the platform gave no response at all.
pub const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Caller-supplied platform credential.
///
/// Never logged: `Debug` is redacted and there is no `Display` or `Serialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Returns `None` for a missing or blank token.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Normalized outcome of one platform call. Success always carries a payload
/// and failure always carries a message; there is no partial state.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    Success { status_code: u16, payload: Value },
    Failure { status_code: u16, message: String },
}

impl ApiResult {
    pub fn success(status_code: u16, payload: Value) -> Self {
        Self::Success {
            status_code,
            payload,
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self::Failure {
            status_code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { status_code, .. } | Self::Failure { status_code, .. } => *status_code,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    /// Splits into the payload or `(status_code, message)`.
    pub fn into_result(self) -> Result<Value, (u16, String)> {
        match self {
            Self::Success { payload, .. } => Ok(payload),
            Self::Failure {
                status_code,
                message,
            } => Err((status_code, message)),
        }
    }
}

/// Outbound access to the platform. Implemented over HTTP in production and
/// by scripted doubles in tests.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn call(
        &self,
        endpoint: &str,
        credential: &ApiToken,
        method: Method,
        body: Option<&Value>,
    ) -> ApiResult;
}

/// Platform responses wrap records in a top-level `data` object.
pub fn unwrap_data(payload: &Value) -> &Value {
    payload.get("data").unwrap_or(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ApiToken::parse(Some("apify_api_secret")).unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret"));
        assert_eq!(token.expose(), "apify_api_secret");
    }

    #[test]
    fn test_blank_token_is_missing() {
        assert!(ApiToken::parse(None).is_none());
        assert!(ApiToken::parse(Some("   ")).is_none());
        assert_eq!(ApiToken::parse(Some(" t ")).unwrap().expose(), "t");
    }

    #[test]
    fn test_api_result_is_never_partial() {
        let ok = ApiResult::success(201, json!({"data": {"id": "r1"}}));
        assert!(ok.is_success());
        assert!(ok.payload().is_some());
        assert!(ok.error_message().is_none());

        let err = ApiResult::failure(404, "Actor not found");
        assert!(!err.is_success());
        assert!(err.payload().is_none());
        assert_eq!(err.error_message(), Some("Actor not found"));
        assert_eq!(err.into_result(), Err((404, "Actor not found".to_string())));
    }

    #[test]
    fn test_unwrap_data_falls_back_to_payload() {
        let wrapped = json!({"data": {"id": "x"}});
        assert_eq!(unwrap_data(&wrapped), &json!({"id": "x"}));
        let bare = json!([1, 2]);
        assert_eq!(unwrap_data(&bare), &bare);
    }
}
