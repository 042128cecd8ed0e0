//! Merge handoff to the external encoder.
//!
//! The contract is fixed: two inputs (video, audio), one output, video codec
//! copied as-is, audio re-encoded to AAC, output overwritten if present. The
//! `Merger` trait is the seam transports and tests plug into; `FfmpegMerger`
//! is the production implementation.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Merge collaborator: combines one video and one audio file into the output
/// container.
pub trait Merger: Send + Sync {
    fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Invokes ffmpeg. When a custom executable path is configured and exists on
/// disk it is invoked explicitly; otherwise the tool name resolves via PATH.
#[derive(Debug, Default)]
pub struct FfmpegMerger {
    pub ffmpeg_path: Option<PathBuf>,
}

impl FfmpegMerger {
    pub fn new(ffmpeg_path: Option<PathBuf>) -> Self {
        Self { ffmpeg_path }
    }

    fn resolve_binary(&self) -> PathBuf {
        match &self.ffmpeg_path {
            Some(path) if path.exists() => path.clone(),
            _ => PathBuf::from("ffmpeg"),
        }
    }

    fn build_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-i"),
            video.as_os_str().to_owned(),
            OsString::from("-i"),
            audio.as_os_str().to_owned(),
            OsString::from("-c:v"),
            OsString::from("copy"),
            OsString::from("-c:a"),
            OsString::from("aac"),
            OsString::from("-y"),
            output.as_os_str().to_owned(),
        ]
    }
}

impl Merger for FfmpegMerger {
    fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let binary = self.resolve_binary();
        tracing::info!(
            binary = %binary.display(),
            output = %output.display(),
            "merging media"
        );
        let result = Command::new(&binary)
            .args(Self::build_args(video, audio, output))
            .output()
            .with_context(|| format!("spawn encoder: {}", binary.display()))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!(
                "encoder exited with {}: {}",
                result.status,
                stderr.trim_end()
            );
        }
        Ok(())
    }
}
