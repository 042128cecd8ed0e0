//! CLI for the AVD download engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use avd_core::config;
use std::path::PathBuf;

use commands::{run_get, run_probe};

/// Top-level CLI for the AVD downloader.
#[derive(Debug, Parser)]
#[command(name = "avd")]
#[command(about = "AVD: segmented A/V stream downloader and merger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or two resolved stream URLs and optionally merge them.
    Get {
        /// Title the output file names derive from.
        #[arg(long)]
        title: String,

        /// Direct video stream URL.
        #[arg(long, value_name = "URL")]
        video_url: Option<String>,

        /// Direct audio stream URL.
        #[arg(long, value_name = "URL")]
        audio_url: Option<String>,

        /// Cover image URL (best-effort).
        #[arg(long, value_name = "URL")]
        cover_url: Option<String>,

        /// Request header to send with every stream request, as "Name: value".
        /// Repeatable (referer, session cookie, ...).
        #[arg(long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Directory for the merged output (default: current directory).
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Keep the downloaded tracks separate instead of merging.
        #[arg(long)]
        no_merge: bool,
    },

    /// Probe a stream URL: resolved content length and the chunk plan.
    Probe {
        /// Direct stream URL.
        url: String,

        /// Request header, as "Name: value". Repeatable.
        #[arg(long = "header", value_name = "HEADER")]
        headers: Vec<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                title,
                video_url,
                audio_url,
                cover_url,
                headers,
                out_dir,
                no_merge,
            } => {
                run_get(
                    cfg, title, video_url, audio_url, cover_url, headers, out_dir, no_merge,
                )
                .await?
            }
            CliCommand::Probe { url, headers } => run_probe(&url, &headers)?,
        }

        Ok(())
    }
}
