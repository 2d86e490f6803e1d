//! Per-call session state.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sip::SipMessage;

/// Lifecycle status of a tracked call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Trying,
    Ringing,
    Answered,
    Failed,
    Ended,
}

impl CallStatus {
    /// Terminal statuses are excluded from the active-calls view.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Failed | CallStatus::Ended)
    }
}

/// One call dialog: correlation key, parties, status and the append-only
/// list of messages seen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSession {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SocketAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<SocketAddr>,
    pub started_at: DateTime<Utc>,
    pub status: CallStatus,
    pub messages: Vec<SipMessage>,
}

impl CallSession {
    /// Create a session from its initiating message. The message itself is
    /// appended by the tracker, not here.
    #[must_use]
    pub fn from_initial(message: &SipMessage) -> Self {
        Self {
            call_id: message.call_id.clone(),
            from_uri: message.from_uri.clone(),
            to_uri: message.to_uri.clone(),
            source: message.source,
            destination: message.destination,
            started_at: message.timestamp,
            status: CallStatus::Trying,
            messages: Vec::new(),
        }
    }

    /// Seconds elapsed since the initiating message, relative to `now`.
    #[must_use]
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds()
    }

    #[must_use]
    pub fn summary(&self) -> CallSummary {
        CallSummary {
            call_id: self.call_id.clone(),
            from_uri: self.from_uri.clone(),
            to_uri: self.to_uri.clone(),
            status: self.status,
            started_at: self.started_at,
            message_count: self.messages.len(),
        }
    }
}

/// Compact session view used for active-call lists and live snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSummary {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_uri: Option<String>,
    pub status: CallStatus,
    pub started_at: DateTime<Utc>,
    pub message_count: usize,
}
