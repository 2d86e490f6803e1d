//! Call session tracking and the permissive state machine.
//!
//! Expected flow is trying → ringing → answered, with any state able to
//! move to failed or ended. Transitions are not guarded: every message for
//! a known call identifier is appended to its session and may update the
//! status regardless of the current state, including after a terminal one.
//! That append-first, lossy-tolerant behavior is the point of a best-effort
//! monitor; this is not a protocol enforcer.

use std::collections::HashMap;

use crate::sip::{SipMessage, SipMethod};

use super::session::{CallSession, CallStatus, CallSummary};

/// Maintains the map of call identifier → session. The capture pipeline is
/// the only writer; everything else reads.
#[derive(Debug, Default)]
pub struct CallTracker {
    sessions: HashMap<String, CallSession>,
    /// Call identifiers in first-seen order; backs the history query.
    order: Vec<String>,
}

impl CallTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classified message: create a session on an initiating
    /// INVITE, append to an existing session, update its status.
    ///
    /// Messages without a call identifier, and non-INVITE messages for
    /// unknown identifiers, are ignored here (they still reach the raw
    /// message history).
    pub fn apply(&mut self, message: &SipMessage) {
        if !message.has_call_id() {
            return;
        }

        if !self.sessions.contains_key(&message.call_id) {
            if message.label.method() != Some(SipMethod::Invite) {
                return;
            }
            tracing::debug!(call_id = %message.call_id, "new call session");
            self.order.push(message.call_id.clone());
            self.sessions
                .insert(message.call_id.clone(), CallSession::from_initial(message));
        }

        let Some(session) = self.sessions.get_mut(&message.call_id) else {
            return;
        };

        session.messages.push(message.clone());

        let previous = session.status;
        if let Some(code) = message.label.response_code() {
            match code {
                180 | 183 => session.status = CallStatus::Ringing,
                200 => {
                    // Only a 200 answering the INVITE transaction answers
                    // the call; a 200 to BYE or OPTIONS does not.
                    let answers_invite = message
                        .cseq
                        .as_deref()
                        .is_some_and(|cseq| cseq.to_ascii_uppercase().contains("INVITE"));
                    if answers_invite {
                        session.status = CallStatus::Answered;
                    }
                }
                code if code >= 400 => session.status = CallStatus::Failed,
                _ => {}
            }
        }
        if message.label.method() == Some(SipMethod::Bye) {
            session.status = CallStatus::Ended;
        }

        if session.status != previous {
            tracing::debug!(
                call_id = %message.call_id,
                from = ?previous,
                to = ?session.status,
                "call status transition"
            );
        }
    }

    /// Sessions whose status is not terminal, in first-seen order.
    #[must_use]
    pub fn active(&self) -> Vec<&CallSession> {
        self.iter().filter(|s| !s.status.is_terminal()).collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.iter().filter(|s| !s.status.is_terminal()).count()
    }

    /// Summaries of the active sessions.
    #[must_use]
    pub fn active_summaries(&self) -> Vec<CallSummary> {
        self.active().into_iter().map(CallSession::summary).collect()
    }

    /// Most recent `limit` sessions by tracking-table order, not time order.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&CallSession> {
        let start = self.order.len().saturating_sub(limit);
        self.order[start..]
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .collect()
    }

    /// Single session lookup.
    #[must_use]
    pub fn get(&self, call_id: &str) -> Option<&CallSession> {
        self.sessions.get(call_id)
    }

    /// All sessions in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &CallSession> {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
