//! Per-job stage pipeline.
//!
//! Stages are data: an ordered list assembled per request from the available
//! stage set (fetch-cover, register-job, download-video, download-audio,
//! merge), so "video only", "audio only" and "both + merge" are request
//! shapes rather than code paths. Each stage either passes control on or
//! short-circuits the run; the cancel token is checked between stages so a
//! stopped job never reaches the merge stage.

use anyhow::{Context, Result};

use crate::control::{JobRegistry, Stopped};
use crate::cover;
use crate::error::MediaError;
use crate::fetch::{FetchOptions, MediaDownload};
use crate::job::Job;
use crate::merge::Merger;

/// Shared collaborators a stage may need.
pub struct StageContext<'a> {
    pub registry: &'a JobRegistry,
    pub merger: &'a dyn Merger,
    pub opts: FetchOptions,
}

/// One pipeline step. `run` returns `Ok` to pass control to the next stage;
/// any error short-circuits the pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, job: &Job, ctx: &StageContext<'_>) -> Result<()>;
}

/// Builds the stage list for one job, in fixed order: cover, register,
/// video, audio, merge. Stages for media the request did not ask for are
/// simply absent.
pub fn assemble(job: &Job) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::new();
    if job.cover_url.is_some() {
        stages.push(Box::new(FetchCover));
    }
    stages.push(Box::new(RegisterJob));
    if job.video.is_some() {
        stages.push(Box::new(DownloadVideo));
    }
    if job.audio.is_some() {
        stages.push(Box::new(DownloadAudio));
    }
    if job.wants_merge() {
        stages.push(Box::new(Merge));
    }
    stages
}

/// Runs the stages in order. An `Err` that downcasts to [`Stopped`] means
/// the caller stopped the job; anything else is a failure.
pub fn run(stages: &[Box<dyn Stage>], job: &Job, ctx: &StageContext<'_>) -> Result<()> {
    for stage in stages {
        if job.cancel.is_cancelled() {
            return Err(anyhow::Error::new(Stopped));
        }
        tracing::debug!(job_id = %job.id, stage = stage.name(), "running stage");
        stage
            .run(job, ctx)
            .with_context(|| format!("stage {}", stage.name()))?;
    }
    Ok(())
}

/// Best-effort cover fetch; failure is logged, never aborts the pipeline.
struct FetchCover;

impl Stage for FetchCover {
    fn name(&self) -> &'static str {
        "fetch-cover"
    }

    fn run(&self, job: &Job, _ctx: &StageContext<'_>) -> Result<()> {
        let url = match &job.cover_url {
            Some(url) => url,
            None => return Ok(()),
        };
        let dest = job.paths.cover(url);
        if let Err(e) = cover::fetch_cover(url, &dest) {
            tracing::warn!(job_id = %job.id, error = %format!("{:#}", e), "cover fetch failed");
        }
        Ok(())
    }
}

/// Puts the job's cancel token in the registry before any media bytes are
/// written, so a concurrent stop request can find it. A duplicate id fails
/// the pipeline here.
struct RegisterJob;

impl Stage for RegisterJob {
    fn name(&self) -> &'static str {
        "register-job"
    }

    fn run(&self, job: &Job, ctx: &StageContext<'_>) -> Result<()> {
        ctx.registry
            .register(&job.id, job.cancel.clone())
            .map_err(anyhow::Error::new)
    }
}

fn run_media(media: &MediaDownload, job: &Job, ctx: &StageContext<'_>) -> Result<()> {
    match media.run(&job.id, &job.cancel, job.sink.clone(), &ctx.opts) {
        Ok(()) => Ok(()),
        Err(MediaError::Stopped) => Err(anyhow::Error::new(Stopped)),
        Err(e) => Err(anyhow::Error::new(e)),
    }
}

struct DownloadVideo;

impl Stage for DownloadVideo {
    fn name(&self) -> &'static str {
        "download-video"
    }

    fn run(&self, job: &Job, ctx: &StageContext<'_>) -> Result<()> {
        match job.video.as_ref() {
            Some(media) => run_media(media, job, ctx),
            None => Ok(()),
        }
    }
}

struct DownloadAudio;

impl Stage for DownloadAudio {
    fn name(&self) -> &'static str {
        "download-audio"
    }

    fn run(&self, job: &Job, ctx: &StageContext<'_>) -> Result<()> {
        match job.audio.as_ref() {
            Some(media) => run_media(media, job, ctx),
            None => Ok(()),
        }
    }
}

/// Invokes the merge collaborator. Failure is terminal for the job; the
/// completed temp media files are kept for diagnosis. On success the temps
/// are cleaned up.
struct Merge;

impl Stage for Merge {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn run(&self, job: &Job, ctx: &StageContext<'_>) -> Result<()> {
        ctx.merger.merge(
            &job.paths.video_tmp,
            &job.paths.audio_tmp,
            &job.paths.output,
        )?;
        for tmp in [&job.paths.video_tmp, &job.paths.audio_tmp] {
            if let Err(e) = std::fs::remove_file(tmp) {
                tracing::warn!(path = %tmp.display(), error = %e, "could not remove temp file");
            }
        }
        Ok(())
    }
}
