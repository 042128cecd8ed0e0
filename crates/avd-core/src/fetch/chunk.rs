//! Single-chunk ranged HTTP GET into the media file.
//!
//! The unit of concurrency: one curl Easy handle per chunk range, body
//! streamed through the write callback into the media file at the chunk's
//! absolute offset. The shared byte counter is bumped after every buffer
//! write and the abort flags are polled there too; returning `Ok(0)` from the
//! callback makes curl abort the transfer at the next buffer boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::control::CancelToken;
use crate::error::ChunkError;
use crate::planner::ChunkRange;
use crate::storage::MediaFile;

use super::StreamSource;

/// Why the write callback cut the transfer short.
enum AbortReason {
    Cancelled,
    Storage(std::io::Error),
}

/// Fetches one chunk range. Not retried; a chunk failure fails the owning
/// media download. `cancel` is the job's stop signal, `halt` is tripped by a
/// failing sibling chunk; both abort at the next buffer boundary.
pub(super) fn fetch_chunk(
    source: &StreamSource,
    range: ChunkRange,
    file: &MediaFile,
    bytes_read: &Arc<AtomicU64>,
    cancel: &CancelToken,
    halt: &CancelToken,
    buffer_bytes: usize,
) -> Result<(), ChunkError> {
    let received = Arc::new(AtomicU64::new(0));
    let received_cb = Arc::clone(&received);
    let abort: Arc<Mutex<Option<AbortReason>>> = Arc::new(Mutex::new(None));
    let abort_cb = Arc::clone(&abort);
    let bytes_read_cb = Arc::clone(bytes_read);
    let cancel_cb = cancel.clone();
    let halt_cb = halt.clone();
    let file_cb = file.clone();
    let chunk_start = range.start;

    let mut easy = curl::easy::Easy::new();
    easy.url(&source.url)?;
    easy.follow_location(true)?;
    easy.buffer_size(buffer_bytes)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    // Prefer a low-speed cutoff over a tight wall clock: abort if throughput
    // stays below 1 KiB/s for 60s, with a hard 1h cap for fully stuck reads.
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(Duration::from_secs(3600))?;
    easy.range(&format!("{}-{}", range.start, range.end))?;
    apply_headers(&mut easy, source)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(move |data| {
            if cancel_cb.is_cancelled() || halt_cb.is_cancelled() {
                let _ = abort_cb.lock().unwrap().replace(AbortReason::Cancelled);
                return Ok(0);
            }
            let off = received_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
            match file_cb.write_at(chunk_start + off, data) {
                Ok(()) => {
                    bytes_read_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
                    Ok(data.len())
                }
                Err(e) => {
                    let _ = abort_cb.lock().unwrap().replace(AbortReason::Storage(e));
                    Ok(0)
                }
            }
        })?;
        let perform_result = transfer.perform();
        if let Err(e) = perform_result {
            if e.is_write_error() {
                match abort.lock().unwrap().take() {
                    Some(AbortReason::Cancelled) => return Err(ChunkError::Aborted),
                    Some(AbortReason::Storage(io_err)) => {
                        return Err(ChunkError::Storage(io_err))
                    }
                    None => {}
                }
            }
            return Err(ChunkError::Curl(e));
        }
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(ChunkError::Http(code));
    }

    let got = received.load(Ordering::Relaxed);
    let expected = range.len();
    if got != expected {
        return Err(ChunkError::PartialTransfer {
            expected,
            received: got,
        });
    }

    Ok(())
}

fn apply_headers(
    easy: &mut curl::easy::Easy,
    source: &StreamSource,
) -> Result<(), curl::Error> {
    if source.headers.is_empty() {
        return Ok(());
    }
    let mut list = curl::easy::List::new();
    for (k, v) in &source.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    easy.http_headers(list)
}
