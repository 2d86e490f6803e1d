//! HTTP handlers for the monitor API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::calls::{CallSession, CallSummary, Problem};
use crate::monitor::{CaptureStatus, MonitorService, StartOutcome};
use crate::sip::SipMessage;

use super::api::{CaptureControlResponse, HistoryQuery, MessagesQuery, StartRequest};
use super::error::ApiError;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The monitor service backing every endpoint.
    pub service: Arc<MonitorService>,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(service: Arc<MonitorService>) -> Self {
        Self { service }
    }
}

/// GET /api/calls/active - Summaries of the calls still in progress.
pub async fn get_active_calls(State(state): State<AppState>) -> Json<Vec<CallSummary>> {
    Json(state.service.active_calls())
}

/// GET /api/calls/history - The most recently tracked sessions, full detail.
pub async fn get_call_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<CallSession>> {
    let limit = query.effective_limit(state.service.config().history.session_limit);
    Json(state.service.call_history(limit))
}

/// GET /api/calls/{call_id}/flow - The full message flow of one call.
pub async fn get_call_flow(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<CallSession>, ApiError> {
    state
        .service
        .call_flow(&call_id)
        .map(Json)
        .ok_or(ApiError::CallNotFound(call_id))
}

/// GET /api/messages - The most recent raw messages.
pub async fn get_recent_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Json<Vec<SipMessage>> {
    Json(state.service.recent_messages(query.effective_limit()))
}

/// GET /api/problems - Diagnostic findings over all tracked sessions.
pub async fn get_problems(State(state): State<AppState>) -> Json<Vec<Problem>> {
    Json(state.service.problems())
}

/// POST /api/capture/start - Start capturing, optionally on a given interface.
pub async fn post_capture_start(
    State(state): State<AppState>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<CaptureControlResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    match state.service.start_capture(request.interface.as_deref()) {
        Ok(StartOutcome::Started { interface }) => {
            Ok(Json(CaptureControlResponse::started(interface)))
        }
        Ok(StartOutcome::AlreadyRunning) => Ok(Json(CaptureControlResponse::already_running())),
        Err(e) => Err(ApiError::CaptureStart(e.to_string())),
    }
}

/// POST /api/capture/stop - Stop the running capture, if any.
pub async fn post_capture_stop(State(state): State<AppState>) -> Json<CaptureControlResponse> {
    state.service.stop_capture();
    Json(CaptureControlResponse::stopped())
}

/// GET /api/capture/status - Capture flag plus current counters.
pub async fn get_capture_status(State(state): State<AppState>) -> Json<CaptureStatus> {
    Json(state.service.status())
}
