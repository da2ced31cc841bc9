//! Temporary output files.
//!
//! Every download writes to `<temp_dir>/waloo_<uuid>.<ext>`. yt-dlp may also
//! leave siblings sharing that stem (`.part`, `.f137.mp4`, `.ytdl`), so
//! cleanup removes everything starting with the stem.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

/// File name prefix shared by all files this service creates.
pub const TEMP_FILE_PREFIX: &str = "waloo_";

/// Output location of a download that has not finished yet.
///
/// Dropping it removes the output and any partial siblings.
#[derive(Debug)]
pub struct PendingOutput {
    dir: PathBuf,
    stem: String,
    path: PathBuf,
    armed: bool,
}

impl PendingOutput {
    pub fn new(dir: &Path, extension: &str) -> Self {
        let stem = format!("{}{}", TEMP_FILE_PREFIX, Uuid::new_v4().simple());
        let path = dir.join(format!("{}.{}", stem, extension));
        Self {
            dir: dir.to_path_buf(),
            stem,
            path,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hands the finished file over to a [`DownloadedFile`]. Partial
    /// siblings are removed now; the file itself lives on.
    pub fn finish(mut self, size_bytes: u64) -> DownloadedFile {
        self.armed = false;
        remove_siblings(&self.dir, &self.stem, Some(&self.path));
        DownloadedFile {
            path: std::mem::take(&mut self.path),
            size_bytes,
        }
    }
}

impl Drop for PendingOutput {
    fn drop(&mut self) {
        if self.armed {
            remove_siblings(&self.dir, &self.stem, None);
        }
    }
}

/// A finished download. The file is deleted when this is dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
    size_bytes: u64,
}

impl DownloadedFile {
    /// Takes ownership of an existing file (used by test doubles).
    pub fn adopt(path: PathBuf, size_bytes: u64) -> Self {
        Self { path, size_bytes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Extension of the file on disk.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed temp file {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temp file {:?}: {}", path, e),
    }
}

fn remove_siblings(dir: &Path, stem: &str, keep: Option<&Path>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to scan temp dir {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let matches_stem = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(stem));
        if matches_stem && keep != Some(path.as_path()) {
            remove_quietly(&path);
        }
    }
}

/// Removes leftover files from earlier runs that are older than `older_than`.
///
/// Returns how many files were removed.
pub async fn sweep_stale_files(dir: &Path, older_than: Duration) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let is_ours = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX));
        if !is_ours {
            continue;
        }

        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < older_than {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove stale file {:?}: {}", entry.path(), e),
        }
    }

    if removed > 0 {
        info!("Removed {} stale temp file(s) from {:?}", removed, dir);
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pending_paths_are_unique() {
        let dir = Path::new("/tmp");
        let a = PendingOutput::new(dir, "mp4");
        let b = PendingOutput::new(dir, "mp4");
        assert_ne!(a.path(), b.path());

        let name = a.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(TEMP_FILE_PREFIX));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_dropping_pending_removes_output_and_partials() {
        let dir = TempDir::new().unwrap();
        let pending = PendingOutput::new(dir.path(), "mp4");
        let path = pending.path().to_path_buf();
        let partial = PathBuf::from(format!("{}.part", path.display()));
        let unrelated = dir.path().join("keep.txt");

        std::fs::write(&path, b"data").unwrap();
        std::fs::write(&partial, b"partial").unwrap();
        std::fs::write(&unrelated, b"other").unwrap();

        drop(pending);

        assert!(!path.exists());
        assert!(!partial.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_finish_keeps_file_until_downloaded_file_drops() {
        let dir = TempDir::new().unwrap();
        let pending = PendingOutput::new(dir.path(), "m4a");
        let path = pending.path().to_path_buf();
        let fragment = path.with_extension("f140.m4a");
        std::fs::write(&path, b"audio").unwrap();
        std::fs::write(&fragment, b"fragment").unwrap();

        let file = pending.finish(5);
        assert!(path.exists());
        assert!(!fragment.exists());
        assert_eq!(file.size_bytes(), 5);
        assert_eq!(file.extension(), Some("m4a"));

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_dropping_pending_without_output_is_quiet() {
        let dir = TempDir::new().unwrap();
        drop(PendingOutput::new(dir.path(), "mp4"));
        drop(PendingOutput::new(Path::new("/nonexistent/dir"), "mp4"));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_prefixed_files() {
        let dir = TempDir::new().unwrap();
        let ours = dir.path().join("waloo_old.mp4");
        let foreign = dir.path().join("other.mp4");
        std::fs::write(&ours, b"x").unwrap();
        std::fs::write(&foreign, b"x").unwrap();

        // fresh files survive a sweep with a long threshold
        let removed = sweep_stale_files(dir.path(), Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert!(ours.exists());

        let removed = sweep_stale_files(dir.path(), Duration::ZERO).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!ours.exists());
        assert!(foreign.exists());
    }

    #[tokio::test]
    async fn test_sweep_missing_dir_is_ok() {
        let removed = sweep_stale_files(Path::new("/nonexistent/waloo"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
