use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiResult, ApiToken, PlatformApi, DEFAULT_FAILURE_STATUS};

/// `PlatformApi` over HTTPS. The credential travels only as a bearer header.
#[derive(Clone)]
pub struct HttpPlatformClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlatformClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("actor-runner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn call(
        &self,
        endpoint: &str,
        credential: &ApiToken,
        method: Method,
        body: Option<&Value>,
    ) -> ApiResult {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(credential.expose());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(res) => res,
            Err(e) => {
                warn!(%method, endpoint, error = %e, "platform request failed");
                return ApiResult::failure(DEFAULT_FAILURE_STATUS, e.to_string());
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(%method, endpoint, status = status.as_u16(), error = %e, "failed to read platform response body");
                let status_code = if status.is_success() {
                    DEFAULT_FAILURE_STATUS
                } else {
                    status.as_u16()
                };
                return ApiResult::failure(status_code, e.to_string());
            }
        };
        let parsed = parse_body(&bytes);

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .ok()
                .and_then(upstream_error_message)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            warn!(%method, endpoint, status = status.as_u16(), message = %message, "platform returned an error");
            return ApiResult::failure(status.as_u16(), message);
        }

        match parsed {
            Ok(payload) => {
                debug!(%method, endpoint, status = status.as_u16(), "platform call succeeded");
                ApiResult::success(status.as_u16(), payload)
            }
            Err(e) => {
                warn!(%method, endpoint, error = %e, "platform returned invalid JSON");
                ApiResult::failure(
                    DEFAULT_FAILURE_STATUS,
                    format!("invalid JSON in platform response: {e}"),
                )
            }
        }
    }
}

fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
}

/// Error text the platform put in its response body, if any.
pub(crate) fn upstream_error_message(body: &Value) -> Option<String> {
    let nested = body
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str);
    let top_level = || body.get("message").and_then(Value::as_str);
    nested
        .or_else(top_level)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_error_message_wins() {
        let body = json!({
            "error": { "type": "record-not-found", "message": "Actor was not found" },
            "message": "ignored"
        });
        assert_eq!(
            upstream_error_message(&body).as_deref(),
            Some("Actor was not found")
        );
    }

    #[test]
    fn test_top_level_message_fallback() {
        let body = json!({ "message": "Unauthorized" });
        assert_eq!(upstream_error_message(&body).as_deref(), Some("Unauthorized"));
        assert_eq!(upstream_error_message(&json!({ "error": {} })), None);
        assert_eq!(upstream_error_message(&json!({ "message": "  " })), None);
    }

    #[test]
    fn test_empty_body_parses_as_null() {
        assert_eq!(parse_body(b"").unwrap(), Value::Null);
        assert_eq!(parse_body(b" \n").unwrap(), Value::Null);
        assert!(parse_body(b"<html>").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            HttpPlatformClient::with_client(reqwest::Client::new(), "https://api.example.com/");
        assert_eq!(client.base_url(), "https://api.example.com");
    }
}
