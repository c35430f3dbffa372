//! Shared test doubles for runner integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use runner::orchestrator::PollSettings;
use runner::platform::{ApiResult, ApiToken, PlatformApi};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: String,
    pub token: String,
    pub body: Option<Value>,
}

/// `PlatformApi` that replays scripted responses per `(method, endpoint)`.
///
/// Responses are consumed in order; the last one for a route repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct ScriptedPlatform {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResult>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, endpoint: &str, result: ApiResult) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, endpoint.to_string()))
            .or_default()
            .push_back(result);
        self
    }

    pub fn on_many(
        mut self,
        method: Method,
        endpoint: &str,
        results: impl IntoIterator<Item = ApiResult>,
    ) -> Self {
        for result in results {
            self = self.on(method.clone(), endpoint, result);
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }
}

#[async_trait]
impl PlatformApi for ScriptedPlatform {
    async fn call(
        &self,
        endpoint: &str,
        credential: &ApiToken,
        method: Method,
        body: Option<&Value>,
    ) -> ApiResult {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            token: credential.expose().to_string(),
            body: body.cloned(),
        });

        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&(method.clone(), endpoint.to_string())) else {
            return ApiResult::failure(404, format!("no scripted response for {method} {endpoint}"));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

pub fn run_record(status: &str) -> ApiResult {
    ApiResult::success(
        200,
        serde_json::json!({
            "data": {
                "id": "run-1",
                "status": status,
                "stats": { "durationMillis": 1500, "computeUnits": 0.02 }
            }
        }),
    )
}

pub fn fast_settings(max_attempts: u32) -> PollSettings {
    PollSettings::new(Duration::from_millis(1), max_attempts)
}

pub fn token() -> ApiToken {
    ApiToken::parse(Some("test-token")).unwrap()
}
