//! API request and response types for the monitor HTTP endpoints.

use serde::{Deserialize, Serialize};

/// Maximum allowed limit for list endpoints.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Query parameters for GET /api/calls/history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of sessions to return; the configured session limit
    /// applies when omitted.
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// Get the effective limit, falling back to `default` and capped at
    /// `MAX_LIST_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).min(MAX_LIST_LIMIT)
    }
}

/// Query parameters for GET /api/messages.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesQuery {
    /// Maximum number of messages to return.
    #[serde(default = "default_messages_limit")]
    pub limit: usize,
}

impl MessagesQuery {
    /// Get the effective limit, capped at `MAX_LIST_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_LIST_LIMIT)
    }
}

impl Default for MessagesQuery {
    fn default() -> Self {
        Self {
            limit: default_messages_limit(),
        }
    }
}

const fn default_messages_limit() -> usize {
    100
}

/// Request body for POST /api/capture/start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    /// Interface to capture on; the configured default when omitted.
    pub interface: Option<String>,
}

/// Response for the capture control endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureControlResponse {
    /// What the request did: "started", "already_running" or "stopped".
    pub status: String,
    /// Interface the capture runs on, for start responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

impl CaptureControlResponse {
    /// A capture was started on `interface`.
    #[must_use]
    pub fn started(interface: impl Into<String>) -> Self {
        Self {
            status: "started".to_string(),
            interface: Some(interface.into()),
        }
    }

    /// A capture was already live.
    #[must_use]
    pub fn already_running() -> Self {
        Self {
            status: "already_running".to_string(),
            interface: None,
        }
    }

    /// The capture was stopped (or there was none).
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            status: "stopped".to_string(),
            interface: None,
        }
    }
}
