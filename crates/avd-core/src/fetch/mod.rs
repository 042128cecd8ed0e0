//! Media download driver.
//!
//! Drives one stream (video or audio) to completion: resolves the content
//! length, creates the preallocated temp file, plans the chunk ranges, runs
//! one worker thread per chunk plus the progress monitor, and joins them all
//! before reporting. Chunk errors are aggregated to the first one; a failing
//! chunk trips a media-local halt flag so its siblings stop instead of
//! finishing a file with a hole in it.

mod chunk;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::CancelToken;
use crate::error::{ChunkError, MediaError};
use crate::planner;
use crate::probe;
use crate::progress::{ProgressMonitor, ProgressSink};
use crate::storage::MediaFile;

/// Which track of a job a media download carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// A resolved stream: direct URL, request headers the origin requires
/// (referer, session cookie, ...), and the content length when the resolver
/// already knows it. Immutable once created.
#[derive(Debug, Clone)]
pub struct StreamSource {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub content_length: Option<u64>,
}

/// Tunables shared by every media download of an engine.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Read buffer per chunk worker.
    pub buffer_bytes: usize,
    /// Progress monitor sampling interval.
    pub progress_interval: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            buffer_bytes: 256 * 1024,
            progress_interval: Duration::from_millis(1000),
        }
    }
}

/// The download of a single stream belonging to one job.
pub struct MediaDownload {
    kind: MediaKind,
    source: StreamSource,
    dest: PathBuf,
    bytes_read: Arc<AtomicU64>,
}

impl MediaDownload {
    pub fn new(kind: MediaKind, source: StreamSource, dest: PathBuf) -> Self {
        Self {
            kind,
            source,
            dest,
            bytes_read: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Temp file this media downloads into.
    pub fn dest(&self) -> &std::path::Path {
        &self.dest
    }

    /// Bytes written so far across all chunk workers. Monotonic.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Runs the download to completion. Blocks until every chunk worker and
    /// the monitor have exited.
    pub fn run(
        &self,
        job_id: &str,
        cancel: &CancelToken,
        sink: Arc<dyn ProgressSink>,
        opts: &FetchOptions,
    ) -> Result<(), MediaError> {
        let content_length = self.resolve_content_length()?;

        let file = MediaFile::create(&self.dest, content_length).map_err(|e| {
            MediaError::Destination {
                path: self.dest.display().to_string(),
                cause: e,
            }
        })?;

        let chunks = planner::plan_chunks(content_length);
        tracing::info!(
            job_id,
            kind = %self.kind,
            content_length,
            chunks = chunks.len(),
            dest = %self.dest.display(),
            "starting media download"
        );

        let monitor = ProgressMonitor::spawn(
            job_id.to_string(),
            self.kind,
            Arc::clone(&self.bytes_read),
            content_length,
            opts.progress_interval,
            cancel.clone(),
            sink,
        );

        // One worker per chunk; a failing worker trips `halt` so siblings
        // abort at their next buffer boundary instead of downloading on.
        let halt = CancelToken::new();
        let (tx, rx) = mpsc::channel::<(usize, Result<(), ChunkError>)>();
        let mut handles = Vec::with_capacity(chunks.len());
        for (index, range) in chunks.iter().copied().enumerate() {
            let source = self.source.clone();
            let file = file.clone();
            let bytes_read = Arc::clone(&self.bytes_read);
            let cancel = cancel.clone();
            let halt = halt.clone();
            let tx = tx.clone();
            let buffer_bytes = opts.buffer_bytes;
            handles.push(std::thread::spawn(move || {
                let res = chunk::fetch_chunk(
                    &source,
                    range,
                    &file,
                    &bytes_read,
                    &cancel,
                    &halt,
                    buffer_bytes,
                );
                if res.is_err() {
                    halt.cancel();
                }
                let _ = tx.send((index, res));
            }));
        }
        drop(tx);

        let mut results: Vec<(usize, Result<(), ChunkError>)> = Vec::with_capacity(chunks.len());
        for _ in 0..chunks.len() {
            match rx.recv() {
                Ok(pair) => results.push(pair),
                Err(_) => break,
            }
        }
        for h in handles {
            let _ = h.join();
        }
        monitor.finish();

        if cancel.is_cancelled() {
            tracing::info!(job_id, kind = %self.kind, "media download stopped");
            return Err(MediaError::Stopped);
        }

        results.sort_by_key(|(index, _)| *index);
        let mut aborted_sibling: Option<usize> = None;
        for (index, res) in results {
            if let Err(e) = res {
                if matches!(e, ChunkError::Aborted) {
                    // Sibling of the chunk that actually failed.
                    aborted_sibling.get_or_insert(index);
                    continue;
                }
                return Err(MediaError::Chunk {
                    index,
                    range: chunks[index].range_header_value(),
                    source: e,
                });
            }
        }
        if let Some(index) = aborted_sibling {
            // Halt tripped but the culprit's own error never arrived.
            return Err(MediaError::Chunk {
                index,
                range: chunks[index].range_header_value(),
                source: ChunkError::Aborted,
            });
        }

        let total = self.bytes_read.load(Ordering::Relaxed);
        debug_assert_eq!(total, content_length);
        file.sync().map_err(|e| MediaError::Destination {
            path: self.dest.display().to_string(),
            cause: e,
        })?;
        tracing::info!(job_id, kind = %self.kind, bytes = total, "media download complete");
        Ok(())
    }

    fn resolve_content_length(&self) -> Result<u64, MediaError> {
        let len = match self.source.content_length {
            Some(len) => len,
            None => probe::resolve_content_length(&self.source.url, &self.source.headers)
                .map_err(|e| MediaError::ContentLength {
                    url: self.source.url.clone(),
                    source: e,
                })?,
        };
        if len == 0 {
            return Err(MediaError::EmptyContent {
                url: self.source.url.clone(),
            });
        }
        Ok(len)
    }
}
