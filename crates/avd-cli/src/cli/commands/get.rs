//! `avd get` – download the requested streams and merge them.

use anyhow::{bail, Result};
use avd_core::config::AvdConfig;
use avd_core::progress::ProgressEvent;
use avd_core::{Engine, JobRequest, JobStatus, StreamSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::parse_headers;

#[allow(clippy::too_many_arguments)]
pub async fn run_get(
    cfg: AvdConfig,
    title: String,
    video_url: Option<String>,
    audio_url: Option<String>,
    cover_url: Option<String>,
    headers: Vec<String>,
    out_dir: Option<PathBuf>,
    no_merge: bool,
) -> Result<()> {
    if video_url.is_none() && audio_url.is_none() {
        bail!("at least one of --video-url / --audio-url is required");
    }
    let headers = parse_headers(&headers)?;
    let work_dir = match out_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let stream = |url: String| StreamSource {
        url,
        headers: headers.clone(),
        content_length: None,
    };
    let job_id = generate_job_id();
    let request = JobRequest {
        id: job_id.clone(),
        title,
        work_dir,
        video: video_url.map(stream),
        audio: audio_url.map(stream),
        cover_url,
        merge: !no_merge,
    };

    let engine = Arc::new(Engine::new(cfg));

    // Ctrl-C stops the job cooperatively; a second Ctrl-C kills the process.
    let engine_for_signal = Arc::clone(&engine);
    let signal_id = job_id.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nstopping {} ...", signal_id);
            engine_for_signal.stop(&signal_id);
        }
    });

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressEvent>(16);
    let printer = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            let rate_mib = event.bytes_per_sec as f64 / 1_048_576.0;
            println!(
                "  {} {:>3}%  {:.2} MiB/s",
                event.kind, event.percent, rate_mib
            );
        }
    });

    let status = tokio::task::spawn_blocking(move || {
        engine.start(request, Arc::new(progress_tx))
    })
    .await?;
    let _ = printer.await;

    match status {
        JobStatus::Succeeded => {
            println!("done");
            Ok(())
        }
        JobStatus::Stopped => {
            println!("stopped");
            Ok(())
        }
        JobStatus::Failed(e) => Err(e),
    }
}

fn generate_job_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("job-{}-{}", std::process::id(), nanos)
}
