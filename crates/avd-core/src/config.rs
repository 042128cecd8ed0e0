use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::FetchOptions;

/// XDG prefix shared by the config, cache and log locations.
pub(crate) const XDG_PREFIX: &str = "avd";

/// Global configuration loaded from `~/.config/avd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvdConfig {
    /// Root for temp media files; the engine writes under
    /// `<temp_root>/downloading`. Defaults to the XDG cache dir.
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
    /// Explicit ffmpeg executable. When unset or missing on disk the name
    /// resolves via PATH.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Progress monitor sampling interval in milliseconds.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Read buffer per chunk worker in bytes.
    #[serde(default = "default_chunk_buffer_bytes")]
    pub chunk_buffer_bytes: usize,
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_chunk_buffer_bytes() -> usize {
    256 * 1024
}

impl Default for AvdConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            ffmpeg_path: None,
            progress_interval_ms: default_progress_interval_ms(),
            chunk_buffer_bytes: default_chunk_buffer_bytes(),
        }
    }
}

impl AvdConfig {
    /// Temp root to use: the configured one, or `~/.cache/avd`.
    pub fn resolved_temp_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.temp_root {
            return Ok(root.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX)?;
        Ok(xdg_dirs.get_cache_home())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            buffer_bytes: self.chunk_buffer_bytes,
            progress_interval: Duration::from_millis(self.progress_interval_ms.max(1)),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AvdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AvdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AvdConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AvdConfig::default();
        assert_eq!(cfg.progress_interval_ms, 1000);
        assert_eq!(cfg.chunk_buffer_bytes, 256 * 1024);
        assert!(cfg.temp_root.is_none());
        assert!(cfg.ffmpeg_path.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = AvdConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AvdConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.progress_interval_ms, cfg.progress_interval_ms);
        assert_eq!(parsed.chunk_buffer_bytes, cfg.chunk_buffer_bytes);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            temp_root = "/var/tmp/avd"
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            progress_interval_ms = 300
            chunk_buffer_bytes = 65536
        "#;
        let cfg: AvdConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.temp_root.as_deref(), Some(std::path::Path::new("/var/tmp/avd")));
        assert_eq!(
            cfg.ffmpeg_path.as_deref(),
            Some(std::path::Path::new("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(cfg.progress_interval_ms, 300);
        assert_eq!(cfg.chunk_buffer_bytes, 65536);
        assert_eq!(
            cfg.fetch_options().progress_interval,
            Duration::from_millis(300)
        );
    }
}
