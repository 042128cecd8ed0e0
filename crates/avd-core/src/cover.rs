//! Single-shot cover image fetch.
//!
//! Cover art is cosmetic: the pipeline logs a failure here and carries on.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Downloads the cover image at `url` to `dest`, creating parent directories
/// as needed.
pub fn fetch_cover(url: &str, dest: &Path) -> Result<()> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid cover URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(60))?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("cover request failed")?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        anyhow::bail!("cover fetch returned HTTP {}", code);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create cover dir: {}", parent.display()))?;
    }
    std::fs::write(dest, &body)
        .with_context(|| format!("write cover: {}", dest.display()))?;
    Ok(())
}
