//! Chunk plan math.
//!
//! Maps a content length to a batch of HTTP Range chunks: the chunk count
//! grows with the square root of the size in MiB, clamped to [2, 5], so small
//! files still get two parallel connections and huge files never open more
//! than five. Pure math, no I/O.

/// Smallest number of concurrent chunks per media.
pub const MIN_BATCH_SIZE: u64 = 2;
/// Largest number of concurrent chunks per media.
pub const MAX_BATCH_SIZE: u64 = 5;

const MIB: f64 = 1024.0 * 1024.0;

/// A single chunk: byte range [start, end], both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (inclusive).
    pub end: u64,
}

impl ChunkRange {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Number of concurrent chunks for a given content length:
/// `clamp(round(sqrt(len / 1 MiB)), 2, 5)`.
pub fn batch_size(content_length: u64) -> u64 {
    let raw = (content_length as f64 / MIB).sqrt().round() as u64;
    raw.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
}

/// Builds the chunk plan for a content length.
///
/// Chunk size is `ceil(len / batch_size)`; the last chunk absorbs rounding so
/// the ranges partition `[0, len-1]` exactly. Returns an empty vec for a zero
/// length (callers must validate the length before planning). For lengths
/// smaller than the batch size, trailing empty ranges are dropped.
pub fn plan_chunks(content_length: u64) -> Vec<ChunkRange> {
    if content_length == 0 {
        return Vec::new();
    }

    let batch = batch_size(content_length);
    let chunk_size = (content_length + batch - 1) / batch;

    let mut out = Vec::with_capacity(batch as usize);
    for i in 0..batch {
        let start = i * chunk_size;
        if start > content_length - 1 {
            break;
        }
        let end = if i == batch - 1 {
            content_length - 1
        } else {
            ((i + 1) * chunk_size - 1).min(content_length - 1)
        };
        out.push(ChunkRange { start, end });
    }
    // Rounding can make the loop cover everything before the last index.
    if let Some(last) = out.last_mut() {
        last.end = content_length - 1;
    }
    out
}
