//! Diagnostic scan over tracked sessions.
//!
//! Purely derived and recomputed in full on every invocation; nothing is
//! cached or persisted. Cost is proportional to sessions × messages.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::session::{CallSession, CallStatus};

/// Severity of a diagnostic finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One diagnostic finding for a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub severity: Severity,
    pub call_id: String,
    pub message: String,
    pub suggestion: String,
}

/// Default age after which a call still in trying is flagged.
pub const DEFAULT_STUCK_AFTER_SECS: i64 = 30;

/// Fixed severity lookup for diagnosable response codes.
fn diagnose_code(code: u16) -> Option<(Severity, &'static str, &'static str)> {
    match code {
        401 => Some((
            Severity::Warning,
            "401 Unauthorized - authentication required",
            "Verify credentials on the endpoint",
        )),
        403 => Some((
            Severity::Error,
            "403 Forbidden - access denied",
            "Check authentication and ACLs",
        )),
        404 => Some((
            Severity::Error,
            "404 Not Found - destination unknown",
            "Check the dialed number and routes",
        )),
        407 => Some((
            Severity::Warning,
            "407 Proxy Authentication Required",
            "Verify proxy credentials",
        )),
        408 => Some((
            Severity::Error,
            "408 Request Timeout",
            "Check network connectivity",
        )),
        486 => Some((
            Severity::Info,
            "486 Busy Here - destination busy",
            "Destination is on another call",
        )),
        503 => Some((
            Severity::Error,
            "503 Service Unavailable",
            "Gateway or provider unavailable",
        )),
        _ => None,
    }
}

/// Scans tracked sessions for common call problems.
#[derive(Debug, Clone)]
pub struct ProblemAnalyzer {
    stuck_after: Duration,
}

impl ProblemAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stuck_after: Duration::seconds(DEFAULT_STUCK_AFTER_SECS),
        }
    }

    /// Flag calls still in trying after `secs` seconds.
    #[must_use]
    pub fn with_stuck_after_secs(secs: i64) -> Self {
        Self {
            stuck_after: Duration::seconds(secs),
        }
    }

    /// Scan the given sessions and emit findings.
    pub fn analyze<'a, I>(&self, sessions: I) -> Vec<Problem>
    where
        I: IntoIterator<Item = &'a CallSession>,
    {
        let now = Utc::now();
        let mut problems = Vec::new();

        for session in sessions {
            if session.status == CallStatus::Trying
                && session.age_secs(now) >= self.stuck_after.num_seconds()
            {
                problems.push(Problem {
                    severity: Severity::Warning,
                    call_id: session.call_id.clone(),
                    message: format!(
                        "Call stuck in trying for {}s",
                        session.age_secs(now)
                    ),
                    suggestion: "Check connectivity with the gateway".to_string(),
                });
            }

            for message in &session.messages {
                let Some(code) = message.label.response_code() else {
                    continue;
                };
                if let Some((severity, text, suggestion)) = diagnose_code(code) {
                    problems.push(Problem {
                        severity,
                        call_id: session.call_id.clone(),
                        message: text.to_string(),
                        suggestion: suggestion.to_string(),
                    });
                }
            }
        }

        problems
    }
}

impl Default for ProblemAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sip::{SipLabel, SipMessage, SipMethod};
    use chrono::Utc;

    fn session_with_codes(call_id: &str, codes: &[u16]) -> CallSession {
        let invite = SipMessage {
            timestamp: Utc::now(),
            source: None,
            destination: None,
            label: SipLabel::Request {
                method: SipMethod::Invite,
            },
            call_id: call_id.to_string(),
            from_uri: None,
            to_uri: None,
            cseq: Some("1 INVITE".to_string()),
            excerpt: "INVITE sip:x SIP/2.0".to_string(),
        };
        let mut session = CallSession::from_initial(&invite);
        session.messages.push(invite);
        for &code in codes {
            session.status = if code >= 400 {
                CallStatus::Failed
            } else {
                session.status
            };
            session.messages.push(SipMessage {
                timestamp: Utc::now(),
                source: None,
                destination: None,
                label: SipLabel::Response {
                    code,
                    reason: "x".to_string(),
                },
                call_id: call_id.to_string(),
                from_uri: None,
                to_uri: None,
                cseq: Some("1 INVITE".to_string()),
                excerpt: format!("SIP/2.0 {code}"),
            });
        }
        session
    }

    #[test]
    fn test_not_found_yields_error() {
        let analyzer = ProblemAnalyzer::new();
        let session = session_with_codes("c1", &[404]);

        let problems = analyzer.analyze([&session]);
        assert!(!problems.is_empty());
        let not_found = problems
            .iter()
            .find(|p| p.message.starts_with("404"))
            .unwrap();
        assert_eq!(not_found.severity, Severity::Error);
        assert_eq!(not_found.call_id, "c1");
    }

    #[test]
    fn test_severity_table() {
        let analyzer = ProblemAnalyzer::new();
        for (code, severity) in [
            (401, Severity::Warning),
            (403, Severity::Error),
            (407, Severity::Warning),
            (408, Severity::Error),
            (486, Severity::Info),
            (503, Severity::Error),
        ] {
            let session = session_with_codes("c", &[code]);
            let problems = analyzer.analyze([&session]);
            let found = problems
                .iter()
                .find(|p| p.message.starts_with(&code.to_string()))
                .unwrap_or_else(|| panic!("no finding for code {code}"));
            assert_eq!(found.severity, severity, "code {code}");
        }
    }

    #[test]
    fn test_undiagnosed_codes_ignored() {
        let analyzer = ProblemAnalyzer::new();
        let mut session = session_with_codes("c1", &[180, 200]);
        session.status = CallStatus::Answered;

        assert!(analyzer.analyze([&session]).is_empty());
    }

    #[test]
    fn test_stuck_in_trying_flagged_after_threshold() {
        let analyzer = ProblemAnalyzer::with_stuck_after_secs(0);
        let session = session_with_codes("slow", &[]);

        let problems = analyzer.analyze([&session]);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].severity, Severity::Warning);
        assert!(problems[0].message.contains("stuck in trying"));
    }

    #[test]
    fn test_fresh_trying_call_not_flagged() {
        let analyzer = ProblemAnalyzer::new();
        let session = session_with_codes("fresh", &[]);

        assert!(analyzer.analyze([&session]).is_empty());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
