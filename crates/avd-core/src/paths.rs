//! Filesystem layout and title sanitization for a job.
//!
//! Temp media files live under a `downloading` subdirectory of the temp
//! root, named from the sanitized title plus a kind-specific suffix; the
//! merged output goes to the caller's work directory under the sanitized
//! title.

use std::path::{Path, PathBuf};

/// Suffix for the video temp file.
pub const VIDEO_TMP_SUFFIX: &str = ".video.tmp.mp4";
/// Suffix for the audio temp file.
pub const AUDIO_TMP_SUFFIX: &str = ".audio.tmp.mp3";
/// Extension of the merged output container.
pub const OUTPUT_EXT: &str = "mp4";

const NAME_MAX: usize = 255;

/// Sanitizes a media title for use as a filename.
///
/// Replaces `<>:"/\|?*` and control characters with `_`, trims surrounding
/// whitespace and dots, and caps the result at 255 bytes (on a char
/// boundary).
pub fn sanitize_title(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let replaced = match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        };
        out.push(replaced);
    }

    let trimmed = out.trim().trim_matches('.').trim();
    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolved locations for one job's files.
#[derive(Debug, Clone)]
pub struct JobPaths {
    /// Sanitized title every name below derives from.
    pub title: String,
    /// `<temp_root>/downloading` — holds the per-media temp files.
    pub downloading_dir: PathBuf,
    pub video_tmp: PathBuf,
    pub audio_tmp: PathBuf,
    /// `<work_dir>/<title>.mp4` — the merged output.
    pub output: PathBuf,
}

impl JobPaths {
    pub fn new(work_dir: &Path, temp_root: &Path, raw_title: &str) -> Self {
        let title = sanitize_title(raw_title);
        let downloading_dir = temp_root.join("downloading");
        JobPaths {
            video_tmp: downloading_dir.join(format!("{}{}", title, VIDEO_TMP_SUFFIX)),
            audio_tmp: downloading_dir.join(format!("{}{}", title, AUDIO_TMP_SUFFIX)),
            output: work_dir.join(format!("{}.{}", title, OUTPUT_EXT)),
            downloading_dir,
            title,
        }
    }

    /// Cover image path: next to the output, extension taken from the cover
    /// URL's path (default `jpg`).
    pub fn cover(&self, cover_url: &str) -> PathBuf {
        let ext = url::Url::parse(cover_url)
            .ok()
            .and_then(|u| {
                Path::new(u.path())
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
            })
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "jpg".to_string());
        self.output
            .with_file_name(format!("{}.{}", self.title, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_title("a/b\\c:d*e?.mp4part"), "a_b_c_d_e_.mp4part");
        assert_eq!(sanitize_title("<title> \"quoted\" |x"), "_title_ _quoted_ _x");
    }

    #[test]
    fn sanitize_trims_spaces_and_dots() {
        assert_eq!(sanitize_title("  ..some title..  "), "some title");
    }

    #[test]
    fn sanitize_replaces_control_characters() {
        assert_eq!(sanitize_title("a\x00b\x1fc"), "a_b_c");
    }

    #[test]
    fn sanitize_caps_length_on_char_boundary() {
        let long = "é".repeat(200); // 400 bytes
        let out = sanitize_title(&long);
        assert!(out.len() <= 255);
        assert!(out.is_char_boundary(out.len()));
    }

    #[test]
    fn job_paths_layout() {
        let p = JobPaths::new(
            Path::new("/videos"),
            Path::new("/tmp/avd"),
            "My: Video/Title",
        );
        assert_eq!(p.title, "My_ Video_Title");
        assert_eq!(
            p.video_tmp,
            Path::new("/tmp/avd/downloading/My_ Video_Title.video.tmp.mp4")
        );
        assert_eq!(
            p.audio_tmp,
            Path::new("/tmp/avd/downloading/My_ Video_Title.audio.tmp.mp3")
        );
        assert_eq!(p.output, Path::new("/videos/My_ Video_Title.mp4"));
    }

    #[test]
    fn cover_path_takes_extension_from_url() {
        let p = JobPaths::new(Path::new("/videos"), Path::new("/tmp/avd"), "t");
        assert_eq!(
            p.cover("https://cdn.example.com/covers/abc.png?x=1"),
            Path::new("/videos/t.png")
        );
        assert_eq!(
            p.cover("https://cdn.example.com/covers/noext"),
            Path::new("/videos/t.jpg")
        );
    }
}
