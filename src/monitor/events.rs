//! Typed events pushed to live subscribers.

use serde::{Deserialize, Serialize};

use crate::calls::CallSummary;
use crate::sip::SipMessage;

/// Event delivered over the live push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A newly classified message.
    NewMessage { message: SipMessage },
    /// Snapshot of the currently active calls.
    ActiveCalls { calls: Vec<CallSummary> },
    /// Periodic liveness probe for idle subscribers.
    Keepalive,
}
