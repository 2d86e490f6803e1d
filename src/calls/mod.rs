//! Call correlation: session tracking, bounded history and diagnostics.

mod analyzer;
mod history;
mod session;
mod tracker;

pub use analyzer::{Problem, ProblemAnalyzer, Severity, DEFAULT_STUCK_AFTER_SECS};
pub use history::{MessageHistory, DEFAULT_MESSAGE_CAPACITY};
pub use session::{CallSession, CallStatus, CallSummary};
pub use tracker::CallTracker;
