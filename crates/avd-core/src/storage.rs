//! Destination file I/O for media downloads.
//!
//! Each media download creates its temp file exactly once, preallocates it to
//! the content length (fallocate on Linux when available, else `set_len`),
//! and then lets every chunk worker write at its own offsets (pwrite-style).
//! Disjoint ranges make concurrent writes safe without locking.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Writer for one media temp file. Safe to clone and use from multiple chunk
/// workers; each `write_at` is independent.
#[derive(Debug, Clone)]
pub struct MediaFile {
    file: Arc<File>,
    path: PathBuf,
}

impl MediaFile {
    /// Create (or truncate) the file at `path` and preallocate `size` bytes.
    /// Parent directories are created as needed.
    pub fn create(path: &Path, size: u64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create media dir: {}", parent.display()))?;
        }
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("create media file: {}", path.display()))?;
        let out = MediaFile {
            file: Arc::new(file),
            path: path.to_path_buf(),
        };
        out.preallocate(size)?;
        Ok(out)
    }

    /// Preallocate `size` bytes. On Unix tries `posix_fallocate` for real
    /// block allocation; falls back to `set_len` on failure or non-Unix.
    fn preallocate(&self, size: u64) -> Result<()> {
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .context("failed to preallocate media file")?;
        Ok(())
    }

    /// Write `data` at `offset` without moving any shared cursor.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> std::io::Result<()> {
        let n = self.file.write_at(data, offset)?;
        if n != data.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short write: {} of {}", n, data.len()),
            ));
        }
        Ok(())
    }

    /// Non-Unix fallback: seek + write on a cloned handle.
    #[cfg(not(unix))]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> std::io::Result<()> {
        use std::io::{Seek, SeekFrom, Write};
        let mut f = (*self.file).try_clone()?;
        f.seek(SeekFrom::Start(offset))?;
        f.write_all(data)?;
        Ok(())
    }

    /// Sync file data to disk before handing the file to the merge step.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("media file sync failed")?;
        Ok(())
    }

    /// Path of the temp file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn create_preallocates_to_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("media.tmp.mp4");
        let f = MediaFile::create(&path, 1000).unwrap();
        f.sync().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1000);
    }

    #[test]
    fn create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloading").join("a.tmp.mp4");
        MediaFile::create(&path, 10).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn disjoint_offset_writes_land_where_expected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let writer = MediaFile::create(&path, 100).unwrap();
        let w2 = writer.clone();

        writer.write_at(0, b"hello").unwrap();
        w2.write_at(50, b"world").unwrap();
        writer.write_at(95, b"xy").unwrap();
        writer.sync().unwrap();

        let mut f = File::open(&path).unwrap();
        let mut buf = vec![0u8; 100];
        f.read_exact(&mut buf).unwrap();
        assert_eq!(&buf[0..5], b"hello");
        assert_eq!(&buf[50..55], b"world");
        assert_eq!(&buf[95..97], b"xy");
    }

    #[test]
    fn create_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"stale-data-from-last-run").unwrap();
        let writer = MediaFile::create(&path, 4).unwrap();
        writer.write_at(0, b"next").unwrap();
        writer.sync().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"next");
    }
}
