//! The capture read loop.
//!
//! A single pipeline task per capture is the only writer of the shared
//! monitor state: raw lines are assembled into packet blocks, classified,
//! applied to the tracker and history under one write lock, then fanned
//! out to subscribers. Readers therefore never observe a partially applied
//! message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureProcess;
use crate::sip::{Classifier, PacketAssembler};

use super::events::MonitorEvent;
use super::service::MonitorState;

/// How long a killed capture process gets to exit before SIGKILL.
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(2);

/// Run the pipeline until the stream ends or `cancel` fires.
///
/// `process` is present for live captures and absent for replays; on
/// cancellation the process is terminated and the partially assembled
/// block is discarded, while a natural end of stream flushes it. The
/// capturing flag is cleared on every exit path, which is how an abnormal
/// process death becomes visible without any auto-restart.
pub(crate) async fn run<R>(
    mut process: Option<CaptureProcess>,
    reader: R,
    classifier: Arc<dyn Classifier>,
    state: Arc<RwLock<MonitorState>>,
    events: broadcast::Sender<MonitorEvent>,
    cancel: CancellationToken,
    capturing: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    let mut assembler = PacketAssembler::new();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                assembler.discard();
                if let Some(process) = process.as_mut() {
                    if let Err(e) = process.graceful_terminate(TERMINATE_TIMEOUT).await {
                        tracing::warn!(error = %e, "failed to terminate capture process");
                    }
                }
                tracing::info!("capture stopped");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(block) = assembler.feed(&line) {
                        ingest_block(&*classifier, &block, &state, &events);
                    }
                }
                Ok(None) => {
                    if let Some(block) = assembler.finish() {
                        ingest_block(&*classifier, &block, &state, &events);
                    }
                    tracing::warn!("capture stream ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "capture read failed");
                    break;
                }
            }
        }
    }

    capturing.store(false, Ordering::SeqCst);
}

/// Classify one block and, when it yields a message, record and broadcast
/// it. Unrecognized blocks are dropped silently by contract.
pub(crate) fn ingest_block(
    classifier: &dyn Classifier,
    block: &str,
    state: &RwLock<MonitorState>,
    events: &broadcast::Sender<MonitorEvent>,
) {
    let Some(message) = classifier.classify(block) else {
        tracing::trace!("unclassified packet block dropped");
        return;
    };

    tracing::debug!(label = %message.label, call_id = %message.call_id, "message");

    {
        let mut state = state.write().expect("RwLock poisoned");
        state.history.push(message.clone());
        state.messages_seen += 1;
        state.tracker.apply(&message);
    }

    // Send fails only when nobody subscribes, which is fine.
    let _ = events.send(MonitorEvent::NewMessage { message });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::{CallStatus, CallTracker, MessageHistory};
    use crate::sip::HeuristicClassifier;

    fn empty_state() -> Arc<RwLock<MonitorState>> {
        Arc::new(RwLock::new(MonitorState {
            tracker: CallTracker::new(),
            history: MessageHistory::new(100),
            messages_seen: 0,
        }))
    }

    fn dump(blocks: &[&[&str]]) -> Vec<u8> {
        let mut lines = Vec::new();
        for (n, block) in blocks.iter().enumerate() {
            lines.push(format!(
                "12:00:0{n}.000001 IP 10.0.0.1.5060 > 10.0.0.2.5060: UDP, length 100"
            ));
            for line in *block {
                lines.push((*line).to_string());
            }
        }
        (lines.join("\n") + "\n").into_bytes()
    }

    #[tokio::test]
    async fn test_run_ingests_blocks_until_eof() {
        let state = empty_state();
        let (events, mut rx) = broadcast::channel(16);
        let capturing = Arc::new(AtomicBool::new(true));

        let data = dump(&[
            &[
                "INVITE sip:200@10.0.0.2 SIP/2.0",
                "Call-ID: call-1",
                "CSeq: 1 INVITE",
            ],
            &["SIP/2.0 200 OK", "Call-ID: call-1", "CSeq: 1 INVITE"],
            &["garbage, not sip"],
        ]);

        run(
            None,
            std::io::Cursor::new(data),
            Arc::new(HeuristicClassifier::new()),
            Arc::clone(&state),
            events,
            CancellationToken::new(),
            Arc::clone(&capturing),
        )
        .await;

        assert!(!capturing.load(Ordering::SeqCst));

        let state = state.read().unwrap();
        assert_eq!(state.messages_seen, 2);
        assert_eq!(state.history.len(), 2);
        let session = state.tracker.get("call-1").unwrap();
        assert_eq!(session.status, CallStatus::Answered);
        assert_eq!(session.messages.len(), 2);

        // Both recognized messages were broadcast.
        assert!(matches!(rx.try_recv(), Ok(MonitorEvent::NewMessage { .. })));
        assert!(matches!(rx.try_recv(), Ok(MonitorEvent::NewMessage { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_discards_partial_block() {
        let state = empty_state();
        let (events, _rx) = broadcast::channel(16);
        let capturing = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        // A stream that never reaches EOF: duplex with the writer held open.
        let (read_half, mut write_half) = tokio::io::duplex(1024);
        let partial = dump(&[&["INVITE sip:200@10.0.0.2 SIP/2.0", "Call-ID: call-x"]]);

        let task = tokio::spawn(run(
            None,
            read_half,
            Arc::new(HeuristicClassifier::new()) as Arc<dyn Classifier>,
            Arc::clone(&state),
            events,
            cancel.clone(),
            Arc::clone(&capturing),
        ));

        use tokio::io::AsyncWriteExt;
        write_half.write_all(&partial).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        cancel.cancel();
        task.await.unwrap();

        // The block never saw a following boundary, so it stays partial
        // and is discarded on stop instead of being flushed.
        let state = state.read().unwrap();
        assert_eq!(state.messages_seen, 0);
        assert!(state.tracker.is_empty());
        assert!(!capturing.load(Ordering::SeqCst));
        drop(write_half);
    }

    #[tokio::test]
    async fn test_ingest_block_drops_unrecognized() {
        let state = empty_state();
        let (events, _rx) = broadcast::channel(16);
        let classifier = HeuristicClassifier::new();

        ingest_block(&classifier, "nothing recognizable here", &state, &events);

        let state = state.read().unwrap();
        assert_eq!(state.messages_seen, 0);
        assert!(state.history.is_empty());
    }
}
