//! Capture lifecycle, the ingest pipeline, and the live event stream.

mod events;
mod pipeline;
mod service;

pub use events::MonitorEvent;
pub use service::{CaptureStatus, MonitorService, StartOutcome};
