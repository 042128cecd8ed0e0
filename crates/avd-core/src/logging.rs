//! Logging setup.
//!
//! Events append to `avd.log` under the XDG state directory. When that
//! directory cannot be created or opened the subscriber writes to stderr
//! instead, so a read-only home never blocks the CLI.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config;

const LOG_FILE: &str = "avd.log";
const DEFAULT_DIRECTIVES: &str = "info,avd=debug";

/// Install the process-wide subscriber. Call once, before any job runs.
pub fn init() {
    match open_log_file() {
        Ok((path, file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
            tracing::info!(path = %path.display(), "logging to file");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .init();
            tracing::warn!(error = %format!("{:#}", e), "log file unavailable, using stderr");
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

fn open_log_file() -> Result<(PathBuf, fs::File)> {
    let dirs = xdg::BaseDirectories::with_prefix(config::XDG_PREFIX)?;
    let dir = dirs.get_state_home();
    fs::create_dir_all(&dir)?;
    let path = dir.join(LOG_FILE);
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}
