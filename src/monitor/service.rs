//! The monitor service: capture lifecycle plus the shared read surface.
//!
//! One explicitly constructed `MonitorService` replaces what would
//! otherwise be ambient global state: it is created at startup, handed to
//! the server, and cancelled at teardown. It enforces a single active
//! capture process-wide and owns the state the pipeline writes.
//!
//! Methods panic if an internal lock is poisoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::calls::{
    CallSession, CallSummary, CallTracker, MessageHistory, Problem, ProblemAnalyzer,
};
use crate::capture::{CaptureCommandBuilder, CaptureError, CaptureProcess};
use crate::config::MonitorConfig;
use crate::sip::{Classifier, HeuristicClassifier, SipMessage};

use super::events::MonitorEvent;
use super::pipeline;

/// Outcome of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A capture pipeline was spawned on this interface.
    Started { interface: String },
    /// A capture is already running; nothing was spawned.
    AlreadyRunning,
}

/// Snapshot returned by `status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub capturing: bool,
    pub active_calls: usize,
    pub message_count: u64,
}

/// Shared state written only by the capture pipeline.
#[derive(Debug)]
pub(crate) struct MonitorState {
    pub(crate) tracker: CallTracker,
    pub(crate) history: MessageHistory,
    /// Monotonic count of parsed messages, unlike the bounded history len.
    pub(crate) messages_seen: u64,
}

/// Handle to a running capture pipeline.
#[derive(Debug)]
struct CaptureHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Live signaling monitor.
pub struct MonitorService {
    config: MonitorConfig,
    classifier: Arc<dyn Classifier>,
    analyzer: ProblemAnalyzer,
    state: Arc<RwLock<MonitorState>>,
    events: broadcast::Sender<MonitorEvent>,
    capturing: Arc<AtomicBool>,
    handle: Mutex<Option<CaptureHandle>>,
    cancel: CancellationToken,
}

impl MonitorService {
    /// Create a service with the default heuristic classifier.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_classifier(config, Arc::new(HeuristicClassifier::new()))
    }

    /// Create a service with a custom classifier implementation.
    #[must_use]
    pub fn with_classifier(config: MonitorConfig, classifier: Arc<dyn Classifier>) -> Self {
        let (events, _) = broadcast::channel(config.live.event_channel_capacity.max(1));
        let state = MonitorState {
            tracker: CallTracker::new(),
            history: MessageHistory::new(config.history.message_capacity),
            messages_seen: 0,
        };
        let analyzer = ProblemAnalyzer::with_stuck_after_secs(config.analyzer.stuck_call_secs);

        Self {
            config,
            classifier,
            analyzer,
            state: Arc::new(RwLock::new(state)),
            events,
            capturing: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Start capturing on `interface`, or on the configured default when
    /// omitted. Idempotent: when a capture is already live this returns
    /// `AlreadyRunning` without spawning a second process.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` if the capture process cannot be spawned;
    /// the capturing flag stays false and no retry is attempted.
    pub fn start_capture(&self, interface: Option<&str>) -> Result<StartOutcome, CaptureError> {
        let mut slot = self.handle.lock().expect("mutex poisoned");
        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Ok(StartOutcome::AlreadyRunning);
        }
        *slot = None;

        let interface = interface
            .unwrap_or(&self.config.capture.interface)
            .to_string();
        let builder = CaptureCommandBuilder::new(&interface).port(self.config.capture.port);
        let mut process =
            CaptureProcess::spawn_with_binary(&self.config.capture.binary, &builder)?;
        let stdout = process.take_stdout().ok_or(CaptureError::NoStdout)?;

        self.spawn_pipeline(&mut slot, Some(process), stdout);
        tracing::info!(interface = %interface, "capture started");
        Ok(StartOutcome::Started { interface })
    }

    /// Feed the pipeline from an arbitrary reader instead of a live
    /// capture: replays a prerecorded tcpdump text dump. Shares the
    /// single-capture slot with `start_capture`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for parity with
    /// `start_capture`.
    pub fn start_replay<R>(&self, reader: R) -> Result<StartOutcome, CaptureError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut slot = self.handle.lock().expect("mutex poisoned");
        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Ok(StartOutcome::AlreadyRunning);
        }
        *slot = None;

        self.spawn_pipeline(&mut slot, None, reader);
        tracing::info!("replay started");
        Ok(StartOutcome::Started {
            interface: "replay".to_string(),
        })
    }

    fn spawn_pipeline<R>(
        &self,
        slot: &mut Option<CaptureHandle>,
        process: Option<CaptureProcess>,
        reader: R,
    ) where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let cancel = self.cancel.child_token();
        self.capturing.store(true, Ordering::SeqCst);

        let task = tokio::spawn(pipeline::run(
            process,
            reader,
            Arc::clone(&self.classifier),
            Arc::clone(&self.state),
            self.events.clone(),
            cancel.clone(),
            Arc::clone(&self.capturing),
        ));

        *slot = Some(CaptureHandle { cancel, task });
    }

    /// Stop the running capture, if any. Idempotent: calling with no
    /// active capture does nothing. The pipeline terminates the external
    /// process and discards its partial packet buffer.
    pub fn stop_capture(&self) {
        let mut slot = self.handle.lock().expect("mutex poisoned");
        if let Some(handle) = slot.take() {
            handle.cancel.cancel();
            tracing::info!("capture stop requested");
        }
        self.capturing.store(false, Ordering::SeqCst);
    }

    /// Whether a capture pipeline is currently live. Flips false
    /// asynchronously when the capture process dies on its own.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// Capture status plus current session/message counts.
    #[must_use]
    pub fn status(&self) -> CaptureStatus {
        let state = self.state_read();
        CaptureStatus {
            capturing: self.is_capturing(),
            active_calls: state.tracker.active_count(),
            message_count: state.messages_seen,
        }
    }

    /// Summaries of sessions that are neither ended nor failed.
    #[must_use]
    pub fn active_calls(&self) -> Vec<CallSummary> {
        self.state_read().tracker.active_summaries()
    }

    /// The most recent `limit` sessions in tracking order, full detail.
    #[must_use]
    pub fn call_history(&self, limit: usize) -> Vec<CallSession> {
        self.state_read()
            .tracker
            .recent(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Single call lookup.
    #[must_use]
    pub fn call_flow(&self, call_id: &str) -> Option<CallSession> {
        self.state_read().tracker.get(call_id).cloned()
    }

    /// Run the diagnostic scan over all tracked sessions.
    #[must_use]
    pub fn problems(&self) -> Vec<Problem> {
        let state = self.state_read();
        self.analyzer.analyze(state.tracker.iter())
    }

    /// The most recent `limit` raw messages.
    #[must_use]
    pub fn recent_messages(&self, limit: usize) -> Vec<SipMessage> {
        self.state_read().history.recent(limit)
    }

    /// Subscribe to the live event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Token cancelled at teardown; the server ties its graceful shutdown
    /// to it.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the capture and cancel everything derived from this service.
    pub fn shutdown(&self) {
        self.stop_capture();
        self.cancel.cancel();
    }

    fn state_read(&self) -> RwLockReadGuard<'_, MonitorState> {
        self.state.read().expect("RwLock poisoned")
    }
}
