//! The engine surface a transport exposes: start a job, stop a job.

use std::sync::Arc;

use crate::config::AvdConfig;
use crate::control::{DuplicateJob, JobRegistry, Stopped};
use crate::job::{Job, JobRequest, JobStatus};
use crate::merge::{FfmpegMerger, Merger};
use crate::pipeline::{self, StageContext};
use crate::progress::ProgressSink;

/// Download engine: owns the job registry and the merge collaborator.
/// Cheap to share behind an `Arc`; `start` blocks for the lifetime of the
/// job, so callers run it on a worker thread while `stop` arrives from
/// anywhere.
pub struct Engine {
    cfg: AvdConfig,
    registry: Arc<JobRegistry>,
    merger: Arc<dyn Merger>,
}

impl Engine {
    pub fn new(cfg: AvdConfig) -> Self {
        let merger = Arc::new(FfmpegMerger::new(cfg.ffmpeg_path.clone()));
        Self::with_merger(cfg, merger)
    }

    /// Engine with a custom merge collaborator (tests, alternative encoders).
    pub fn with_merger(cfg: AvdConfig, merger: Arc<dyn Merger>) -> Self {
        Engine {
            cfg,
            registry: Arc::new(JobRegistry::new()),
            merger,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Runs one job to its terminal status. Progress events flow to `sink`
    /// until the terminal status is reached; the job is always unregistered
    /// on the way out.
    pub fn start(&self, request: JobRequest, sink: Arc<dyn ProgressSink>) -> JobStatus {
        let temp_root = match self.cfg.resolved_temp_root() {
            Ok(root) => root,
            Err(e) => return JobStatus::Failed(e),
        };
        let job = Job::new(request, &temp_root, sink);
        let job_id = job.id.clone();
        tracing::info!(job_id = %job_id, title = %job.paths.title, "job starting");

        let stages = pipeline::assemble(&job);
        let ctx = StageContext {
            registry: &self.registry,
            merger: self.merger.as_ref(),
            opts: self.cfg.fetch_options(),
        };
        let result = pipeline::run(&stages, &job, &ctx);
        // A duplicate id never registered, so removal would evict the job
        // that legitimately owns the id.
        let duplicate = result
            .as_ref()
            .err()
            .map(|e| e.downcast_ref::<DuplicateJob>().is_some())
            .unwrap_or(false);
        if !duplicate {
            self.registry.remove(&job_id);
        }

        match result {
            Ok(()) => {
                tracing::info!(job_id = %job_id, output = %job.paths.output.display(), "job succeeded");
                JobStatus::Succeeded
            }
            Err(e) if e.downcast_ref::<Stopped>().is_some() => {
                tracing::info!(job_id = %job_id, "job stopped");
                JobStatus::Stopped
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %format!("{:#}", e), "job failed");
                JobStatus::Failed(e)
            }
        }
    }

    /// Signals the job's cancel token exactly once. Returns `false` for an
    /// unknown, finished, or already-stopped id.
    pub fn stop(&self, job_id: &str) -> bool {
        let found = self.registry.stop(job_id);
        tracing::info!(job_id, found, "stop requested");
        found
    }
}
