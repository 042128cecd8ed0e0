//! Progress monitoring for one media download.
//!
//! A monitor thread samples the media's shared byte counter on a fixed
//! interval, derives throughput from the delta since the previous sample, and
//! emits a `ProgressEvent` to the outbound sink. The monitor stops when the
//! media finishes, the job is stopped, or the sink reports its peer is gone;
//! it never emits after that point.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::control::CancelToken;
use crate::fetch::MediaKind;

/// One progress sample for one media of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub job_id: String,
    pub kind: MediaKind,
    /// Throughput over the last interval, bytes per second.
    pub bytes_per_sec: u64,
    /// Completion in percent, clamped to [0, 100].
    pub percent: u8,
}

/// Outbound sink for progress events.
///
/// `emit` returns `false` when the peer is gone; the monitor then stops
/// silently. A dead sink is "no one is listening", never a download failure.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent) -> bool;
}

/// Sink that discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) -> bool {
        true
    }
}

/// Channel-backed sink for RPC/CLI consumers. A full channel drops the event
/// (progress is lossy by design); only a closed channel stops the monitor.
impl ProgressSink for tokio::sync::mpsc::Sender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) -> bool {
        !matches!(
            self.try_send(event),
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_))
        )
    }
}

/// Handle for a running monitor thread.
pub struct ProgressMonitor {
    done: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ProgressMonitor {
    /// Spawn the monitor for one media download.
    ///
    /// The monitor samples `bytes_read` every `interval` and exits on the
    /// done flag, the cancel token, or a closed sink.
    pub fn spawn(
        job_id: String,
        kind: MediaKind,
        bytes_read: Arc<AtomicU64>,
        content_length: u64,
        interval: Duration,
        cancel: CancelToken,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let done_in_thread = Arc::clone(&done);
        let handle = std::thread::spawn(move || {
            run_monitor(
                &job_id,
                kind,
                &bytes_read,
                content_length,
                interval,
                &cancel,
                sink.as_ref(),
                &done_in_thread,
            );
        });
        ProgressMonitor { done, handle }
    }

    /// Tell the monitor its media is finished and wait for it to exit.
    /// No event is emitted after this returns.
    pub fn finish(self) {
        self.done.store(true, Ordering::Relaxed);
        let _ = self.handle.join();
    }
}

fn run_monitor(
    job_id: &str,
    kind: MediaKind,
    bytes_read: &AtomicU64,
    content_length: u64,
    interval: Duration,
    cancel: &CancelToken,
    sink: &dyn ProgressSink,
    done: &AtomicBool,
) {
    const POLL_SLICE: Duration = Duration::from_millis(25);
    let mut previous = 0u64;

    loop {
        // Sleep in short slices so finish() is not held up by a long interval.
        let wake = Instant::now() + interval;
        while Instant::now() < wake {
            if done.load(Ordering::Relaxed) || cancel.is_cancelled() {
                return;
            }
            std::thread::sleep(POLL_SLICE.min(wake.saturating_duration_since(Instant::now())));
        }
        if done.load(Ordering::Relaxed) || cancel.is_cancelled() {
            return;
        }

        let current = bytes_read.load(Ordering::Relaxed);
        let delta = current.saturating_sub(previous);
        previous = current;

        let event = ProgressEvent {
            job_id: job_id.to_string(),
            kind,
            bytes_per_sec: delta * 1000 / interval.as_millis().max(1) as u64,
            percent: percent_complete(current, content_length),
        };
        if !sink.emit(event) {
            tracing::debug!(job_id, %kind, "progress sink closed, monitor stopping");
            return;
        }
    }
}

/// `bytes * 100 / total`, clamped to [0, 100].
pub fn percent_complete(bytes_read: u64, content_length: u64) -> u8 {
    if content_length == 0 {
        return 100;
    }
    (bytes_read.saturating_mul(100) / content_length).min(100) as u8
}
