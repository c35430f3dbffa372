//! Run orchestration: submit an actor run, then poll it to a terminal
//! outcome within a fixed budget.
//!
//! Each flow is fully sequential and owns everything it touches. The run id
//! from submission is the only correlation key for every later call.
//!
//! Failure policy:
//! - a failed submission or status poll ends the flow with that failure,
//!   without retrying
//! - a failed dataset fetch after `SUCCEEDED` is reported as a degraded
//!   success, never as a failure
//! - running out of attempts yields a locally synthesized `TIMEOUT`

mod status;

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Method;
use serde_json::Value;
use shared_types::{RunHandle, TerminalResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::platform::{endpoints, unwrap_data, ApiToken, PlatformApi};
use crate::progress::ProgressSink;

pub use status::RunStatus;

pub const FAILED_FALLBACK_MESSAGE: &str = "Actor run failed";
pub const ABORTED_MESSAGE: &str = "Actor run was aborted";

/// Polling budget for one flow. Worst-case latency is
/// `interval * max_attempts` plus one dataset fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSettings {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("platform error ({status_code}): {message}")]
    Upstream { status_code: u16, message: String },

    #[error("malformed platform response: {0}")]
    MalformedResponse(String),

    #[error("run {run_id} cancelled before reaching a terminal status")]
    Cancelled { run_id: String },
}

impl RunError {
    fn upstream((status_code, message): (u16, String)) -> Self {
        Self::Upstream {
            status_code,
            message,
        }
    }

    /// Status to surface to the caller; the platform's own code for upstream
    /// failures.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Upstream { status_code, .. } => *status_code,
            Self::MalformedResponse(_) => 502,
            Self::Cancelled { .. } => 499,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct RunOrchestrator {
    platform: Arc<dyn PlatformApi>,
    settings: PollSettings,
}

impl RunOrchestrator {
    pub fn new(platform: Arc<dyn PlatformApi>, settings: PollSettings) -> Self {
        Self { platform, settings }
    }

    /// Starts a run. A failed submission is returned as-is, never retried.
    pub async fn submit(
        &self,
        actor_id: &str,
        credential: &ApiToken,
        input: &Value,
    ) -> Result<RunHandle, RunError> {
        let body = (!input.is_null()).then_some(input);
        let payload = self
            .platform
            .call(&endpoints::start_run(actor_id), credential, Method::POST, body)
            .await
            .into_result()
            .map_err(RunError::upstream)?;

        let run_id = unwrap_data(&payload)
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RunError::MalformedResponse("run submission returned no run id".into()))?;

        info!(actor_id, run_id, "actor run submitted");
        Ok(RunHandle::new(run_id, actor_id))
    }

    /// Polls the run until the platform reports a terminal status or the
    /// attempt budget is spent.
    ///
    /// The sink's `notify_started` fires on the first in-progress tick only.
    /// A cancelled token interrupts the wait between polls.
    pub async fn poll_until_terminal(
        &self,
        handle: &RunHandle,
        credential: &ApiToken,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<TerminalResult, RunError> {
        let endpoint = endpoints::run(&handle.actor_id, &handle.run_id);

        for attempt in 1..=self.settings.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(run_id = %handle.run_id, attempt, "polling cancelled");
                    return Err(RunError::Cancelled { run_id: handle.run_id.clone() });
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }

            let payload = self
                .platform
                .call(&endpoint, credential, Method::GET, None)
                .await
                .into_result()
                .map_err(|failure| {
                    warn!(run_id = %handle.run_id, attempt, status_code = failure.0, "status poll failed; abandoning run");
                    RunError::upstream(failure)
                })?;

            let run = unwrap_data(&payload);
            let raw_status = run.get("status").and_then(Value::as_str).unwrap_or_default();
            debug!(run_id = %handle.run_id, attempt, status = raw_status, "polled run status");

            let stats = scalar_stats(run);
            match RunStatus::parse(raw_status) {
                RunStatus::Succeeded => {
                    info!(run_id = %handle.run_id, attempt, "run succeeded");
                    return Ok(self.collect_results(handle, credential, stats).await);
                }
                RunStatus::Failed => {
                    let message = run
                        .get("statusMessage")
                        .and_then(Value::as_str)
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or(FAILED_FALLBACK_MESSAGE);
                    info!(run_id = %handle.run_id, attempt, message, "run failed");
                    return Ok(TerminalResult::failed(&handle.run_id, stats, message));
                }
                RunStatus::Aborted => {
                    info!(run_id = %handle.run_id, attempt, "run aborted");
                    return Ok(TerminalResult::aborted(&handle.run_id, stats, ABORTED_MESSAGE));
                }
                RunStatus::InProgress(_) => {
                    if attempt == 1 {
                        sink.notify_started(handle).await;
                    }
                }
            }
        }

        warn!(
            run_id = %handle.run_id,
            attempts = self.settings.max_attempts,
            "polling budget exhausted"
        );
        Ok(TerminalResult::timeout(
            &handle.run_id,
            timeout_message(self.settings, &handle.run_id),
        ))
    }

    /// Polls a submitted run and delivers its terminal result to the sink.
    /// `complete` is not called when polling ends in an error.
    pub async fn complete_run(
        &self,
        handle: &RunHandle,
        credential: &ApiToken,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<TerminalResult, RunError> {
        let result = self
            .poll_until_terminal(handle, credential, sink, cancel)
            .await?;
        sink.complete(result.clone()).await;
        Ok(result)
    }

    /// Submit, poll, and complete in one sequential flow.
    pub async fn execute(
        &self,
        actor_id: &str,
        credential: &ApiToken,
        input: &Value,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<TerminalResult, RunError> {
        let handle = self.submit(actor_id, credential, input).await?;
        self.complete_run(&handle, credential, sink, cancel).await
    }

    async fn collect_results(
        &self,
        handle: &RunHandle,
        credential: &ApiToken,
        stats: Option<IndexMap<String, Value>>,
    ) -> TerminalResult {
        let fetched = self
            .platform
            .call(
                &endpoints::dataset_items(&handle.run_id),
                credential,
                Method::GET,
                None,
            )
            .await
            .into_result();

        match fetched {
            Ok(payload) => TerminalResult::succeeded(&handle.run_id, dataset_records(payload), stats),
            Err((status_code, message)) => {
                warn!(run_id = %handle.run_id, status_code, "dataset fetch failed; reporting degraded success");
                TerminalResult::degraded(&handle.run_id, stats, message)
            }
        }
    }
}

fn timeout_message(settings: PollSettings, run_id: &str) -> String {
    format!(
        "Run did not finish within {:?}; check run {run_id} on the platform",
        settings.budget()
    )
}

/// Keeps the scalar entries of the run's `stats` object.
fn scalar_stats(run: &Value) -> Option<IndexMap<String, Value>> {
    let stats = run.get("stats")?.as_object()?;
    Some(
        stats
            .iter()
            .filter(|(_, value)| value.is_number() || value.is_string() || value.is_boolean())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

/// Dataset items normally arrive as a bare array; paginated wrappers carry
/// them under `items`.
fn dataset_records(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(mut object) => {
            if let Some(Value::Array(items)) = object.remove("items") {
                return items;
            }
            match object.remove("data") {
                Some(data) => dataset_records(data),
                None => vec![Value::Object(object)],
            }
        }
        other => vec![other],
    }
}
