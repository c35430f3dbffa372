//! Actor run execution endpoint
//!
//! The response is an NDJSON stream: an optional `RUNNING` line once the run
//! is observed in progress, then exactly one closing line. Failures that
//! happen before the first line (submission, first poll) are returned as
//! plain HTTP errors carrying the platform's status code.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use shared_types::ExecuteRunRequest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::{parse_body, require_credential, ApiError};
use crate::orchestrator::RunError;
use crate::progress::{ChannelSink, StreamFrame};
use crate::state::AppState;

const NDJSON: &str = "application/x-ndjson";
const FRAME_BUFFER: usize = 4;

/// POST /api/actors/{actor_id}/runs: run an actor and stream its outcome
pub async fn execute_run(
    State(state): State<Arc<AppState>>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ExecuteRunRequest = parse_body(&body)?;
    let credential = require_credential(&headers, request.api_token.as_deref())?;

    let flow_id = Uuid::new_v4();
    let span = info_span!(
        "run_flow",
        %flow_id,
        actor_id = %actor_id,
        run_id = tracing::field::Empty
    );

    let handle = state
        .orchestrator
        .submit(&actor_id, &credential, &request.input)
        .instrument(span.clone())
        .await?;
    span.record("run_id", handle.run_id.as_str());

    // Dropping the response (client gone) cancels the polling loop.
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let (tx, mut rx) = mpsc::channel::<StreamFrame>(FRAME_BUFFER);
    let orchestrator = state.orchestrator.clone();
    let flow_handle = handle.clone();
    tokio::spawn(
        async move {
            let sink = ChannelSink::new(tx);
            match orchestrator
                .complete_run(&flow_handle, &credential, &sink, &cancel)
                .await
            {
                Ok(result) => info!(status = result.status.as_str(), "run flow finished"),
                Err(RunError::Cancelled { .. }) => {
                    info!("run flow cancelled; caller disconnected")
                }
                Err(e) => sink.fail(e.status_code(), e.message()).await,
            }
        }
        .instrument(span),
    );

    let Some(first) = rx.recv().await else {
        return Err(ApiError::Internal(
            "run flow ended without reporting an outcome".to_string(),
        ));
    };
    if let StreamFrame::Failed(frame) = first {
        return Err(ApiError::Upstream {
            status_code: frame.status_code,
            message: frame.error,
        });
    }

    let frames = stream::unfold(
        (Some(first), rx, guard),
        |(pending, mut rx, guard)| async move {
            let frame = match pending {
                Some(frame) => frame,
                None => rx.recv().await?,
            };
            Some((Ok::<_, Infallible>(frame.to_ndjson()), (None, rx, guard)))
        },
    );

    let mut response = Body::from_stream(frames).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON));
    if let Ok(run_id) = HeaderValue::from_str(&handle.run_id) {
        response_headers.insert("x-run-id", run_id);
    }
    Ok(response)
}
