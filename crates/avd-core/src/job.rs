//! One end-to-end request: download one or two media streams, optionally
//! merge them.

use std::path::PathBuf;
use std::sync::Arc;

use crate::control::CancelToken;
use crate::fetch::{MediaDownload, MediaKind, StreamSource};
use crate::paths::JobPaths;
use crate::progress::ProgressSink;

/// What a caller asks the engine to do. Built from a resolved stream
/// descriptor by the transport layer.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Unique job id, caller-supplied.
    pub id: String,
    /// Media title; file names derive from its sanitized form.
    pub title: String,
    /// Directory the merged output (and cover) goes to.
    pub work_dir: PathBuf,
    pub video: Option<StreamSource>,
    pub audio: Option<StreamSource>,
    pub cover_url: Option<String>,
    /// Merge video+audio after download. Only applies when both streams are
    /// requested.
    pub merge: bool,
}

/// Terminal outcome of a job.
#[derive(Debug)]
pub enum JobStatus {
    Succeeded,
    /// Stopped by the caller mid-flight. Not a failure.
    Stopped,
    Failed(anyhow::Error),
}

impl JobStatus {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Stopped => write!(f, "stopped"),
            JobStatus::Failed(e) => write!(f, "failed: {:#}", e),
        }
    }
}

/// A live job: the requested media downloads, the shared cancel token, and
/// the resolved file layout. Owned by the pipeline run that drives it.
pub struct Job {
    pub id: String,
    pub paths: JobPaths,
    pub cancel: CancelToken,
    pub video: Option<MediaDownload>,
    pub audio: Option<MediaDownload>,
    pub cover_url: Option<String>,
    pub merge: bool,
    pub sink: Arc<dyn ProgressSink>,
}

impl Job {
    /// Builds the job: resolves paths under `temp_root` and wires each
    /// requested stream to its temp destination.
    pub fn new(request: JobRequest, temp_root: &std::path::Path, sink: Arc<dyn ProgressSink>) -> Self {
        let paths = JobPaths::new(&request.work_dir, temp_root, &request.title);
        let video = request
            .video
            .map(|s| MediaDownload::new(MediaKind::Video, s, paths.video_tmp.clone()));
        let audio = request
            .audio
            .map(|s| MediaDownload::new(MediaKind::Audio, s, paths.audio_tmp.clone()));
        Job {
            id: request.id,
            paths,
            cancel: CancelToken::new(),
            video,
            audio,
            cover_url: request.cover_url,
            merge: request.merge,
            sink,
        }
    }

    /// Merge only runs when both streams were requested and downloaded.
    pub fn wants_merge(&self) -> bool {
        self.merge && self.video.is_some() && self.audio.is_some()
    }
}
