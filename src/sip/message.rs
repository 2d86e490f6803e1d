//! Parsed SIP message data model.
//!
//! A `SipMessage` is created once by the classifier and never mutated
//! afterwards; the tracker and history only clone it.

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SIP request methods recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SipMethod {
    Invite,
    Ack,
    Bye,
    Cancel,
    Register,
    Options,
    Prack,
    Update,
    Info,
    Refer,
    Message,
    Notify,
    Subscribe,
}

impl SipMethod {
    /// Methods checked after the response-code pass. INVITE is not here
    /// because it is checked first, before responses.
    pub const NON_INVITE: [SipMethod; 12] = [
        SipMethod::Ack,
        SipMethod::Bye,
        SipMethod::Cancel,
        SipMethod::Register,
        SipMethod::Options,
        SipMethod::Prack,
        SipMethod::Update,
        SipMethod::Info,
        SipMethod::Refer,
        SipMethod::Message,
        SipMethod::Notify,
        SipMethod::Subscribe,
    ];

    /// The wire-format method token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SipMethod::Invite => "INVITE",
            SipMethod::Ack => "ACK",
            SipMethod::Bye => "BYE",
            SipMethod::Cancel => "CANCEL",
            SipMethod::Register => "REGISTER",
            SipMethod::Options => "OPTIONS",
            SipMethod::Prack => "PRACK",
            SipMethod::Update => "UPDATE",
            SipMethod::Info => "INFO",
            SipMethod::Refer => "REFER",
            SipMethod::Message => "MESSAGE",
            SipMethod::Notify => "NOTIFY",
            SipMethod::Subscribe => "SUBSCRIBE",
        }
    }
}

impl fmt::Display for SipMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified label of a captured packet block: either a request method
/// or a response status code with its reason phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SipLabel {
    Request { method: SipMethod },
    Response { code: u16, reason: String },
}

impl SipLabel {
    /// The request method, if this label is a request.
    #[must_use]
    pub fn method(&self) -> Option<SipMethod> {
        match self {
            SipLabel::Request { method } => Some(*method),
            SipLabel::Response { .. } => None,
        }
    }

    /// The status code, if this label is a response.
    #[must_use]
    pub fn response_code(&self) -> Option<u16> {
        match self {
            SipLabel::Request { .. } => None,
            SipLabel::Response { code, .. } => Some(*code),
        }
    }
}

impl fmt::Display for SipLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SipLabel::Request { method } => write!(f, "{method}"),
            SipLabel::Response { code, reason } => write!(f, "{code} {reason}"),
        }
    }
}

/// One classified SIP message extracted from a captured packet block.
///
/// Addresses are absent when the tcpdump boundary line did not match the
/// address pattern; `call_id` may be empty, in which case the message is
/// recorded in history but never correlated to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipMessage {
    /// When the message was classified (capture-emission order, not
    /// network timestamp order).
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SocketAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<SocketAddr>,
    pub label: SipLabel,
    /// Correlation key shared by all messages of one call dialog.
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cseq: Option<String>,
    /// Short raw excerpt of the block, for display.
    pub excerpt: String,
}

impl SipMessage {
    /// Whether the message carries a usable call identifier.
    #[must_use]
    pub fn has_call_id(&self) -> bool {
        !self.call_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_as_str() {
        assert_eq!(SipMethod::Invite.as_str(), "INVITE");
        assert_eq!(SipMethod::Bye.as_str(), "BYE");
        assert_eq!(SipMethod::Subscribe.to_string(), "SUBSCRIBE");
    }

    #[test]
    fn test_non_invite_excludes_invite() {
        assert!(!SipMethod::NON_INVITE.contains(&SipMethod::Invite));
        assert_eq!(SipMethod::NON_INVITE.len(), 12);
    }

    #[test]
    fn test_label_accessors() {
        let request = SipLabel::Request {
            method: SipMethod::Invite,
        };
        assert_eq!(request.method(), Some(SipMethod::Invite));
        assert_eq!(request.response_code(), None);

        let response = SipLabel::Response {
            code: 200,
            reason: "OK".to_string(),
        };
        assert_eq!(response.method(), None);
        assert_eq!(response.response_code(), Some(200));
    }

    #[test]
    fn test_label_display() {
        let request = SipLabel::Request {
            method: SipMethod::Register,
        };
        assert_eq!(request.to_string(), "REGISTER");

        let response = SipLabel::Response {
            code: 486,
            reason: "Busy Here".to_string(),
        };
        assert_eq!(response.to_string(), "486 Busy Here");
    }

    #[test]
    fn test_label_serialization() {
        let request = SipLabel::Request {
            method: SipMethod::Invite,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"kind\":\"request\""));
        assert!(json.contains("\"method\":\"INVITE\""));

        let response = SipLabel::Response {
            code: 404,
            reason: "Not Found".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"kind\":\"response\""));
        assert!(json.contains("\"code\":404"));
    }

    #[test]
    fn test_message_serialization_skips_absent_fields() {
        let message = SipMessage {
            timestamp: Utc::now(),
            source: None,
            destination: None,
            label: SipLabel::Request {
                method: SipMethod::Invite,
            },
            call_id: "abc@host".to_string(),
            from_uri: None,
            to_uri: None,
            cseq: None,
            excerpt: "INVITE sip:100@10.0.0.1 SIP/2.0".to_string(),
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("source"));
        assert!(!json.contains("from_uri"));
        assert!(json.contains("\"call_id\":\"abc@host\""));
        assert!(message.has_call_id());
    }
}
