//! Best-effort packet block classifier.
//!
//! Assigns a label to a captured block with an ordered set of substring
//! checks, first match wins: INVITE, then a fixed list of response status
//! codes, then the remaining request methods. A block with no recognized
//! label yields no message and is silently dropped. This is explicitly not
//! a grammar-level SIP parser; the `Classifier` trait exists so a stricter
//! parser can replace it without touching the call tracker.

use std::net::{IpAddr, SocketAddr};

use chrono::Utc;
use regex::Regex;

use super::message::{SipLabel, SipMessage, SipMethod};

/// Maximum length of the stored raw excerpt.
const EXCERPT_MAX_CHARS: usize = 120;

/// Response status codes recognized by the heuristic classifier, with
/// their canonical reason phrases. Checked in this order.
pub const RESPONSE_CODES: &[(u16, &str)] = &[
    (100, "Trying"),
    (180, "Ringing"),
    (183, "Session Progress"),
    (200, "OK"),
    (202, "Accepted"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (480, "Temporarily Unavailable"),
    (486, "Busy Here"),
    (487, "Request Terminated"),
    (488, "Not Acceptable Here"),
    (500, "Server Internal Error"),
    (503, "Service Unavailable"),
    (600, "Busy Everywhere"),
    (603, "Decline"),
];

/// Classifies one packet block into a message, or drops it.
///
/// Implementations must uphold the classify-or-drop contract: a block
/// either yields a complete immutable `SipMessage` or `None`, never an
/// error.
pub trait Classifier: Send + Sync {
    fn classify(&self, block: &str) -> Option<SipMessage>;
}

/// The default substring-and-regex classifier.
#[derive(Debug)]
pub struct HeuristicClassifier {
    addresses: Regex,
    call_id: Regex,
    from: Regex,
    to: Regex,
    cseq: Regex,
}

impl HeuristicClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            // tcpdump -n boundary line: "IP 10.0.0.1.5060 > 10.0.0.2.5060:"
            addresses: Regex::new(
                r"IP (\d{1,3}(?:\.\d{1,3}){3})\.(\d{1,5}) > (\d{1,3}(?:\.\d{1,3}){3})\.(\d{1,5})",
            )
            .expect("valid address pattern"),
            call_id: Regex::new(r"(?mi)^\s*Call-ID:\s*(\S+)").expect("valid call-id pattern"),
            from: Regex::new(r"(?mi)^\s*From:\s*([^\r\n]+)").expect("valid from pattern"),
            to: Regex::new(r"(?mi)^\s*To:\s*([^\r\n]+)").expect("valid to pattern"),
            cseq: Regex::new(r"(?mi)^\s*CSeq:\s*([^\r\n]+)").expect("valid cseq pattern"),
        }
    }

    fn header(&self, pattern: &Regex, block: &str) -> Option<String> {
        pattern
            .captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    }

    fn endpoints(&self, block: &str) -> (Option<SocketAddr>, Option<SocketAddr>) {
        let Some(caps) = self.addresses.captures(block) else {
            return (None, None);
        };
        (
            socket_addr(caps.get(1), caps.get(2)),
            socket_addr(caps.get(3), caps.get(4)),
        )
    }
}

fn socket_addr(ip: Option<regex::Match<'_>>, port: Option<regex::Match<'_>>) -> Option<SocketAddr> {
    let ip: IpAddr = ip?.as_str().parse().ok()?;
    let port: u16 = port?.as_str().parse().ok()?;
    Some(SocketAddr::new(ip, port))
}

/// Ordered label lookup over the raw block text.
fn classify_label(block: &str) -> Option<SipLabel> {
    // Request-line form "METHOD sip" distinguishes a request from the same
    // method token inside a CSeq header.
    if block.contains("INVITE sip") {
        return Some(SipLabel::Request {
            method: SipMethod::Invite,
        });
    }

    for &(code, reason) in RESPONSE_CODES {
        if block.contains(&format!("SIP/2.0 {code}")) {
            return Some(SipLabel::Response {
                code,
                reason: reason.to_string(),
            });
        }
    }

    for method in SipMethod::NON_INVITE {
        if block.contains(&format!("{} sip", method.as_str())) {
            return Some(SipLabel::Request { method });
        }
    }

    None
}

/// The line that triggered the label, trimmed and length-capped.
fn excerpt(block: &str, label: &SipLabel) -> String {
    let needle = match label {
        SipLabel::Request { method } => format!("{} sip", method.as_str()),
        SipLabel::Response { code, .. } => format!("SIP/2.0 {code}"),
    };
    let line = block
        .lines()
        .map(str::trim)
        .find(|line| line.contains(&needle))
        .or_else(|| block.lines().next().map(str::trim))
        .unwrap_or("");
    line.chars().take(EXCERPT_MAX_CHARS).collect()
}

impl Classifier for HeuristicClassifier {
    fn classify(&self, block: &str) -> Option<SipMessage> {
        let label = classify_label(block)?;
        let (source, destination) = self.endpoints(block);
        let excerpt = excerpt(block, &label);

        Some(SipMessage {
            timestamp: Utc::now(),
            source,
            destination,
            call_id: self.header(&self.call_id, block).unwrap_or_default(),
            from_uri: self.header(&self.from, block),
            to_uri: self.header(&self.to, block),
            cseq: self.header(&self.cseq, block),
            excerpt,
            label,
        })
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite_block() -> String {
        [
            "12:00:01.000001 IP 10.0.0.1.5060 > 10.0.0.2.5060: UDP, length 842",
            "INVITE sip:200@10.0.0.2 SIP/2.0",
            "Via: SIP/2.0/UDP 10.0.0.1:5060;branch=z9hG4bK776asdhds",
            "From: <sip:100@10.0.0.1>;tag=1928301774",
            "To: <sip:200@10.0.0.2>",
            "Call-ID: a84b4c76e66710@10.0.0.1",
            "CSeq: 314159 INVITE",
        ]
        .join("\n")
    }

    fn response_block(status_line: &str) -> String {
        [
            "12:00:02.000001 IP 10.0.0.2.5060 > 10.0.0.1.5060: UDP, length 310",
            status_line,
            "From: <sip:100@10.0.0.1>;tag=1928301774",
            "To: <sip:200@10.0.0.2>;tag=a6c85cf",
            "call-id: a84b4c76e66710@10.0.0.1",
            "CSeq: 314159 INVITE",
        ]
        .join("\n")
    }

    #[test]
    fn test_classify_invite_request() {
        let classifier = HeuristicClassifier::new();
        let message = classifier.classify(&invite_block()).unwrap();

        assert_eq!(message.label.method(), Some(SipMethod::Invite));
        assert_eq!(message.call_id, "a84b4c76e66710@10.0.0.1");
        assert_eq!(message.source.unwrap().to_string(), "10.0.0.1:5060");
        assert_eq!(message.destination.unwrap().to_string(), "10.0.0.2:5060");
        assert_eq!(
            message.from_uri.as_deref(),
            Some("<sip:100@10.0.0.1>;tag=1928301774")
        );
        assert!(message.excerpt.starts_with("INVITE sip:200@10.0.0.2"));
    }

    #[test]
    fn test_response_wins_over_cseq_method() {
        // A 200 OK to an INVITE carries "INVITE" in its CSeq header; the
        // label must still be the response, not the request method.
        let classifier = HeuristicClassifier::new();
        let message = classifier
            .classify(&response_block("SIP/2.0 200 OK"))
            .unwrap();

        assert_eq!(message.label.response_code(), Some(200));
        assert_eq!(message.cseq.as_deref(), Some("314159 INVITE"));
    }

    #[test]
    fn test_classify_provisional_response() {
        let classifier = HeuristicClassifier::new();
        let message = classifier
            .classify(&response_block("SIP/2.0 180 Ringing"))
            .unwrap();

        assert_eq!(
            message.label,
            SipLabel::Response {
                code: 180,
                reason: "Ringing".to_string()
            }
        );
    }

    #[test]
    fn test_classify_other_methods() {
        let classifier = HeuristicClassifier::new();
        for (line, method) in [
            ("BYE sip:100@10.0.0.1 SIP/2.0", SipMethod::Bye),
            ("REGISTER sip:10.0.0.2 SIP/2.0", SipMethod::Register),
            ("OPTIONS sip:10.0.0.2 SIP/2.0", SipMethod::Options),
        ] {
            let block = format!("header line\n{line}\nCall-ID: x@y");
            let message = classifier.classify(&block).unwrap();
            assert_eq!(message.label.method(), Some(method), "line: {line}");
        }
    }

    #[test]
    fn test_unrecognized_block_dropped() {
        let classifier = HeuristicClassifier::new();
        assert!(classifier.classify("").is_none());
        assert!(classifier
            .classify("12:00:01.000001 IP 10.0.0.1.443 > 10.0.0.2.5060: UDP\nnot sip at all")
            .is_none());
    }

    #[test]
    fn test_missing_call_id_yields_empty_string() {
        let classifier = HeuristicClassifier::new();
        let block = "boundary\nINVITE sip:200@10.0.0.2 SIP/2.0\nFrom: <sip:100@10.0.0.1>";
        let message = classifier.classify(block).unwrap();

        assert!(!message.has_call_id());
        assert_eq!(message.call_id, "");
    }

    #[test]
    fn test_missing_addresses_yield_none() {
        let classifier = HeuristicClassifier::new();
        let block = "INVITE sip:200@10.0.0.2 SIP/2.0\nCall-ID: z@w";
        let message = classifier.classify(block).unwrap();

        assert!(message.source.is_none());
        assert!(message.destination.is_none());
    }

    #[test]
    fn test_excerpt_is_capped() {
        let classifier = HeuristicClassifier::new();
        let long_uri = "x".repeat(300);
        let block = format!("INVITE sip:{long_uri} SIP/2.0\nCall-ID: z@w");
        let message = classifier.classify(&block).unwrap();

        assert_eq!(message.excerpt.chars().count(), 120);
    }

    #[test]
    fn test_case_insensitive_call_id_header() {
        let classifier = HeuristicClassifier::new();
        let block = "BYE sip:100@10.0.0.1 SIP/2.0\nCALL-ID: upper@case";
        let message = classifier.classify(block).unwrap();

        assert_eq!(message.call_id, "upper@case");
    }
}
