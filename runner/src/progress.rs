//! Progress sink: how a run flow reports an early liveness signal and its
//! final result without knowing the transport.
//!
//! `notify_started` is called at most once, before any terminal
//! classification. `complete` is called exactly once per successful flow and
//! ends it.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use shared_types::{RunErrorFrame, RunHandle, RunStartedFrame, TerminalResult};
use tokio::sync::mpsc;
use tracing::debug;

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn notify_started(&self, handle: &RunHandle);
    async fn complete(&self, result: TerminalResult);
}

/// One line of an execution stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Started(RunStartedFrame),
    Terminal(TerminalResult),
    Failed(RunErrorFrame),
}

impl StreamFrame {
    /// Serializes the frame as one newline-terminated JSON line.
    pub fn to_ndjson(&self) -> String {
        let encoded = match self {
            Self::Started(frame) => serde_json::to_string(frame),
            Self::Terminal(result) => serde_json::to_string(result),
            Self::Failed(frame) => serde_json::to_string(frame),
        };
        let mut line = encoded.unwrap_or_else(|e| {
            serde_json::json!({
                "status": "ERROR",
                "status_code": 500,
                "error": format!("failed to encode stream frame: {e}"),
            })
            .to_string()
        });
        line.push('\n');
        line
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Started(_))
    }
}

/// Sink that forwards frames to a streaming HTTP response.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<StreamFrame>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamFrame>) -> Self {
        Self { tx }
    }

    /// Closes the stream with an upstream failure instead of a terminal result.
    pub async fn fail(&self, status_code: u16, message: impl Into<String>) {
        self.send(StreamFrame::Failed(RunErrorFrame::new(status_code, message)))
            .await;
    }

    async fn send(&self, frame: StreamFrame) {
        if self.tx.send(frame).await.is_err() {
            debug!("run stream receiver dropped; frame discarded");
        }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn notify_started(&self, handle: &RunHandle) {
        self.send(StreamFrame::Started(RunStartedFrame::new(handle)))
            .await;
    }

    async fn complete(&self, result: TerminalResult) {
        self.send(StreamFrame::Terminal(result)).await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Started(RunHandle),
    Completed(TerminalResult),
}

/// In-memory sink that records every call, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Mutex<Vec<SinkCall>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn started_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Started(_)))
            .count()
    }

    pub fn completed(&self) -> Vec<TerminalResult> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Completed(result) => Some(result),
                SinkCall::Started(_) => None,
            })
            .collect()
    }

    fn record(&self, call: SinkCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl ProgressSink for MemorySink {
    async fn notify_started(&self, handle: &RunHandle) {
        self.record(SinkCall::Started(handle.clone()));
    }

    async fn complete(&self, result: TerminalResult) {
        self.record(SinkCall::Completed(result));
    }
}
