//! `avd probe` – resolve a stream's content length and show its chunk plan.

use anyhow::{Context, Result};
use avd_core::{planner, probe};

use super::parse_headers;

pub fn run_probe(url: &str, headers: &[String]) -> Result<()> {
    let headers = parse_headers(headers)?;
    let content_length = probe::resolve_content_length(url, &headers)
        .with_context(|| format!("probe {}", url))?;

    let chunks = planner::plan_chunks(content_length);
    println!(
        "{}: {} bytes, {} chunk(s)",
        url,
        content_length,
        chunks.len()
    );
    for (i, c) in chunks.iter().enumerate() {
        println!("  chunk {}: {} ({} bytes)", i, c.range_header_value(), c.len());
    }
    Ok(())
}
