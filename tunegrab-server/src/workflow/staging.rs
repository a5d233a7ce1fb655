//! Staging directories and scoped file guards
//!
//! Each pipeline run stages into `<temp root>/run-<uuid>/`. Dropping the
//! `StagingArea` removes the directory and everything in it, so every exit
//! path (success after read, error, cancellation) cleans up.

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const RUN_DIR_PREFIX: &str = "run-";

/// Per-run staging directory, removed on drop
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub async fn create(temp_root: &Path, run_id: Uuid) -> io::Result<Self> {
        let dir = temp_root.join(format!("{}{}", RUN_DIR_PREFIX, run_id));
        tokio::fs::create_dir_all(&dir).await?;

        tracing::debug!(path = %dir.display(), "Created staging area");

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn join(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Remove leftover `run-*` directories from a previous process
    ///
    /// Returns the number removed. Call once at startup, before serving.
    pub fn sweep_stale(temp_root: &Path) -> io::Result<usize> {
        let mut removed = 0;

        let entries = match std::fs::read_dir(temp_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            let is_run_dir = entry.file_name().to_string_lossy().starts_with(RUN_DIR_PREFIX)
                && entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_run_dir {
                continue;
            }

            match std::fs::remove_dir_all(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale staging area"
                ),
            }
        }

        Ok(removed)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::debug!(path = %self.dir.display(), "Removed staging area"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.dir.display(), error = %e, "Failed to remove staging area"),
        }
    }
}

/// Single staged artifact, deleted on drop
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_area_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let area = StagingArea::create(root.path(), Uuid::new_v4()).await.unwrap();
        std::fs::write(area.join("a.webm"), b"raw").unwrap();
        let dir = area.path().to_path_buf();
        assert!(dir.is_dir());

        drop(area);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_areas_are_distinct_per_run() {
        let root = TempDir::new().unwrap();
        let a = StagingArea::create(root.path(), Uuid::new_v4()).await.unwrap();
        let b = StagingArea::create(root.path(), Uuid::new_v4()).await.unwrap();
        assert_ne!(a.join("Song.mp3"), b.join("Song.mp3"));
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("Song_temp.webm");
        std::fs::write(&path, b"raw").unwrap();

        drop(StagedFile::new(path.clone()));
        assert!(!path.exists());

        // Already gone is fine
        drop(StagedFile::new(path));
    }

    #[test]
    fn test_sweep_only_touches_run_dirs() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("run-old")).unwrap();
        std::fs::write(root.path().join("run-old").join("x.mp3"), b"x").unwrap();
        std::fs::create_dir(root.path().join("keep")).unwrap();
        std::fs::write(root.path().join("run-file"), b"not a dir").unwrap();

        assert_eq!(StagingArea::sweep_stale(root.path()).unwrap(), 1);
        assert!(!root.path().join("run-old").exists());
        assert!(root.path().join("keep").exists());
        assert!(root.path().join("run-file").exists());
    }

    #[test]
    fn test_sweep_missing_root() {
        let root = TempDir::new().unwrap();
        assert_eq!(StagingArea::sweep_stale(&root.path().join("absent")).unwrap(), 0);
    }
}
