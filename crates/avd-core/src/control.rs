//! Job control: per-job cancel tokens and the shared job registry.
//!
//! Every job owns one broadcastable cancel token. The registry maps job id to
//! that token so a stop request arriving on another thread can find it. Chunk
//! workers poll the token between buffer reads; cancellation is cooperative,
//! an in-flight socket read is never interrupted mid-read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Marker error for a download stopped by the caller. Distinguishable from
/// real failures via `downcast_ref` so the job can report `Stopped` instead
/// of `Failed`.
#[derive(Debug)]
pub struct Stopped;

impl std::fmt::Display for Stopped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job stopped by caller")
    }
}

impl std::error::Error for Stopped {}

/// Registration failed because the id is already live.
#[derive(Debug, Error)]
#[error("job {0} is already registered")]
pub struct DuplicateJob(pub String);

/// Broadcastable cancellation flag scoped to one job. Cloning shares the
/// underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the flag. Visible to every clone at its next poll.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Registry of in-flight jobs: id -> cancel token.
///
/// Explicitly constructed and passed to whatever owns job lifecycles; there is
/// no process-wide instance. Duplicate ids are rejected, the existing job is
/// left untouched.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, CancelToken>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job's cancel token before any media bytes are written, so a
    /// concurrent stop request can find it.
    pub fn register(&self, job_id: &str, token: CancelToken) -> Result<(), DuplicateJob> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(job_id) {
            return Err(DuplicateJob(job_id.to_string()));
        }
        jobs.insert(job_id.to_string(), token);
        Ok(())
    }

    /// Signal a job's cancel token and drop it from the registry.
    ///
    /// Returns `true` if the job was found. A second stop on the same id, or
    /// a stop for an unknown id, returns `false`; the token is never fired
    /// twice.
    pub fn stop(&self, job_id: &str) -> bool {
        let token = self.jobs.write().unwrap().remove(job_id);
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Unregister a job (call when it finishes, success or failure).
    pub fn remove(&self, job_id: &str) {
        self.jobs.write().unwrap().remove(job_id);
    }

    /// True if the id currently maps to a live job.
    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs.read().unwrap().contains_key(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_broadcasts_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn register_and_stop() {
        let registry = JobRegistry::new();
        let token = CancelToken::new();
        registry.register("j1", token.clone()).unwrap();
        assert!(registry.contains("j1"));

        assert!(registry.stop("j1"));
        assert!(token.is_cancelled());
        assert!(!registry.contains("j1"));
    }

    #[test]
    fn stop_unknown_id_reports_not_found() {
        let registry = JobRegistry::new();
        assert!(!registry.stop("missing"));
    }

    #[test]
    fn second_stop_reports_not_found() {
        let registry = JobRegistry::new();
        registry.register("j1", CancelToken::new()).unwrap();
        assert!(registry.stop("j1"));
        assert!(!registry.stop("j1"));
    }

    #[test]
    fn duplicate_id_is_rejected_and_existing_job_kept() {
        let registry = JobRegistry::new();
        let first = CancelToken::new();
        registry.register("j1", first.clone()).unwrap();

        let err = registry.register("j1", CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("j1"));

        // Existing registration still answers to stop.
        assert!(registry.stop("j1"));
        assert!(first.is_cancelled());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = JobRegistry::new();
        registry.register("j1", CancelToken::new()).unwrap();
        registry.remove("j1");
        registry.remove("j1");
        assert!(!registry.contains("j1"));
    }
}
