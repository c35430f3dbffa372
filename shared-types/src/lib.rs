//! Shared types between the run service and its form client
//!
//! These types are used by both:
//! - the `runner` HTTP service (native Rust)
//! - the form client (TypeScript bindings generated via ts-rs)
//!
//! Serializable with serde for JSON over HTTP and NDJSON run streams

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Runs
// ============================================================================

/// Correlation handle for one submitted run. The run id is the only key used
/// across status polls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RunHandle {
    pub run_id: String,
    pub actor_id: String,
}

impl RunHandle {
    pub fn new(run_id: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            actor_id: actor_id.into(),
        }
    }
}

/// Terminal classification of a run.
///
/// `Timeout` is synthesized by the service when its polling budget runs out;
/// the platform never reports it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum TerminalStatus {
    Succeeded,
    Failed,
    Aborted,
    Timeout,
}

impl TerminalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

/// Final outcome of a run, delivered in-band with a success-level transport
/// status regardless of the business outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct TerminalResult {
    pub status: TerminalStatus,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "Array<unknown> | null")]
    pub results: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, number | string | boolean> | null")]
    pub stats: Option<IndexMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TerminalResult {
    pub fn succeeded(
        run_id: impl Into<String>,
        results: Vec<serde_json::Value>,
        stats: Option<IndexMap<String, serde_json::Value>>,
    ) -> Self {
        Self {
            status: TerminalStatus::Succeeded,
            run_id: run_id.into(),
            results: Some(results),
            stats,
            error_message: None,
        }
    }

    /// The run itself succeeded but its dataset could not be retrieved.
    pub fn degraded(
        run_id: impl Into<String>,
        stats: Option<IndexMap<String, serde_json::Value>>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status: TerminalStatus::Succeeded,
            run_id: run_id.into(),
            results: None,
            stats,
            error_message: Some(error_message.into()),
        }
    }

    pub fn failed(
        run_id: impl Into<String>,
        stats: Option<IndexMap<String, serde_json::Value>>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status: TerminalStatus::Failed,
            run_id: run_id.into(),
            results: None,
            stats,
            error_message: Some(error_message.into()),
        }
    }

    pub fn aborted(
        run_id: impl Into<String>,
        stats: Option<IndexMap<String, serde_json::Value>>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status: TerminalStatus::Aborted,
            run_id: run_id.into(),
            results: None,
            stats,
            error_message: Some(error_message.into()),
        }
    }

    pub fn timeout(run_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            status: TerminalStatus::Timeout,
            run_id: run_id.into(),
            results: None,
            stats: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == TerminalStatus::Succeeded
            && self.results.is_none()
            && self.error_message.is_some()
    }
}

// ============================================================================
// Run Stream Frames
// ============================================================================

/// Discriminator for the non-terminal lines of an execution stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum FrameStatus {
    Running,
    Error,
}

/// Advisory line emitted once the run is observed in progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RunStartedFrame {
    pub status: FrameStatus,
    pub run_id: String,
    pub actor_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunStartedFrame {
    pub fn new(handle: &RunHandle) -> Self {
        Self {
            status: FrameStatus::Running,
            run_id: handle.run_id.clone(),
            actor_id: handle.actor_id.clone(),
            started_at: Utc::now(),
        }
    }
}

/// Closing line for a stream whose polling failed after it had started.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RunErrorFrame {
    pub status: FrameStatus,
    pub status_code: u16,
    pub error: String,
}

impl RunErrorFrame {
    pub fn new(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            status: FrameStatus::Error,
            status_code,
            error: error.into(),
        }
    }
}

// ============================================================================
// Input Schema
// ============================================================================

/// One normalized input field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "Array<unknown> | null")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_titles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    pub prefill: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

/// Effective input schema of an actor. Empty means no schema is known and the
/// actor runs with its default settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct EffectiveSchema {
    pub properties: IndexMap<String, SchemaProperty>,
    pub required: BTreeSet<String>,
}

impl EffectiveSchema {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Projection of a platform actor record for the picker list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ActorSummary {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ActorInfo {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

// Request bodies carry the caller's credential and deliberately do not derive
// Debug.

#[derive(Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct CredentialRequest {
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ExecuteRunRequest {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    #[ts(type = "unknown")]
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ListActorsResponse {
    pub actors: Vec<ActorSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct SchemaResponse {
    pub schema: EffectiveSchema,
    pub actor_info: ActorInfo,
}

/// Error envelope for non-streamed failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================
