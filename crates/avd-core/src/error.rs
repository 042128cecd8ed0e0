//! Typed errors for the chunk and media layers.
//!
//! Chunk errors stay typed so the media layer can tell a cooperative stop
//! apart from a transport or storage failure; everything above the media
//! layer converts to `anyhow` with context.

use thiserror::Error;

/// Error from a single chunk transfer. Chunks are not retried; the first
/// chunk error fails the owning media download.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Transport-level failure (timeout, connection, TLS, ...).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// Non-2xx response status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing to the destination file failed (disk full, permissions, ...).
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// The body ended before the requested range was fully received.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Aborted at a buffer boundary by the job's cancel token or a sibling
    /// chunk failure. Not a transfer failure in itself.
    #[error("chunk transfer aborted")]
    Aborted,
}

/// Error from one media (video or audio) download.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Content length missing and the probe could not resolve it.
    #[error("content length for {url} unavailable: {source}")]
    ContentLength {
        url: String,
        #[source]
        source: crate::probe::ProbeError,
    },
    /// The resolved content length was zero.
    #[error("content length for {url} is zero")]
    EmptyContent { url: String },
    /// Creating, preallocating, or syncing the destination file failed.
    #[error("destination {path}: {cause:#}")]
    Destination { path: String, cause: anyhow::Error },
    /// First chunk failure, siblings were told to halt.
    #[error("chunk {index} ({range}): {source}")]
    Chunk {
        index: usize,
        range: String,
        #[source]
        source: ChunkError,
    },
    /// The job was stopped while this media was in flight.
    #[error("media download stopped")]
    Stopped,
}
