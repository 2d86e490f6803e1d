//! Bounded ring buffer of all parsed messages.
//!
//! Independent of the per-call views: the same message may also live in a
//! session, but this buffer serves "most recent raw events" reads with
//! O(1) append and bounded memory.

use std::collections::VecDeque;

use crate::sip::SipMessage;

/// Default capacity of the message ring.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 1000;

/// Append-only bounded buffer with FIFO eviction.
#[derive(Debug)]
pub struct MessageHistory {
    entries: VecDeque<SipMessage>,
    capacity: usize,
}

impl MessageHistory {
    /// Create a history bounded to `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest entry once at capacity.
    pub fn push(&mut self, message: SipMessage) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// The most recent `limit` messages, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<SipMessage> {
        let start = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(start).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SipMessage> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sip::{SipLabel, SipMethod};
    use chrono::Utc;

    fn message(n: usize) -> SipMessage {
        SipMessage {
            timestamp: Utc::now(),
            source: None,
            destination: None,
            label: SipLabel::Request {
                method: SipMethod::Options,
            },
            call_id: format!("call-{n}"),
            from_uri: None,
            to_uri: None,
            cseq: None,
            excerpt: format!("OPTIONS sip:ping-{n} SIP/2.0"),
        }
    }

    #[test]
    fn test_push_and_len() {
        let mut history = MessageHistory::new(10);
        assert!(history.is_empty());

        history.push(message(0));
        history.push(message(1));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut history = MessageHistory::new(3);
        for n in 0..4 {
            history.push(message(n));
        }

        assert_eq!(history.len(), 3);
        let ids: Vec<_> = history.iter().map(|m| m.call_id.clone()).collect();
        assert_eq!(ids, vec!["call-1", "call-2", "call-3"]);
        assert!(!ids.contains(&"call-0".to_string()));
    }

    #[test]
    fn test_recent_returns_newest_oldest_first() {
        let mut history = MessageHistory::new(10);
        for n in 0..5 {
            history.push(message(n));
        }

        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].call_id, "call-3");
        assert_eq!(recent[1].call_id, "call-4");
    }

    #[test]
    fn test_recent_limit_exceeding_len() {
        let mut history = MessageHistory::new(10);
        history.push(message(0));
        assert_eq!(history.recent(100).len(), 1);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let history = MessageHistory::new(0);
        assert_eq!(history.capacity(), 1);
    }
}
