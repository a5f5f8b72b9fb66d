//! Transient staging of uploaded media
//!
//! A [`StagedArtifact`] owns one file in the staging directory. The file is
//! removed by [`StagedArtifact::release`] or, if the owner is dropped first
//! (request cancelled, early return), by `Drop`. Removal failures are logged
//! and never surfaced.

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MAX_NAME_CHARS: usize = 100;

/// Staged copy of an uploaded medium, valid for one request
#[derive(Debug)]
pub struct StagedArtifact {
    path: PathBuf,
    released: bool,
}

impl StagedArtifact {
    /// Write `data` to a uniquely named file under `dir`
    ///
    /// A partially written file is removed before the error is returned.
    pub async fn stage(dir: &Path, file_name: &str, data: &[u8]) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let artifact = Self {
            path: dir.join(unique_name(file_name)),
            released: false,
        };
        tokio::fs::write(&artifact.path, data).await?;

        debug!(
            path = %artifact.path.display(),
            bytes = data.len(),
            "Staged upload"
        );
        Ok(artifact)
    }

    /// Location of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file (best effort)
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged upload"),
            Err(e) => log_removal_failure(&self.path, &e),
        }
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged upload on drop"),
            Err(e) => log_removal_failure(&self.path, &e),
        }
    }
}

fn log_removal_failure(path: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::NotFound {
        return;
    }
    warn!(
        path = %path.display(),
        error = %err,
        "Failed to remove staged upload"
    );
}

/// `<unix millis>-<random hex>-<sanitised name>`
fn unique_name(file_name: &str) -> String {
    format!(
        "{}-{:08x}-{}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        sanitize_file_name(file_name)
    )
}

/// Keep only the final path component and a conservative character set
fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_CHARS)
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_writes_and_release_removes() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = StagedArtifact::stage(dir.path(), "clip.mp4", b"video-bytes")
            .await
            .unwrap();

        let path = artifact.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().ends_with("-clip.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"video-bytes");

        artifact.release().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = StagedArtifact::stage(dir.path(), "clip.mp4", b"x").await.unwrap();
        let path = artifact.path().to_path_buf();

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = StagedArtifact::stage(dir.path(), "clip.mp4", b"x").await.unwrap();
        std::fs::remove_file(artifact.path()).unwrap();

        artifact.release().await;
    }

    #[tokio::test]
    async fn test_creates_missing_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let artifact = StagedArtifact::stage(&nested, "clip.mp4", b"x").await.unwrap();
        assert!(artifact.path().exists());
    }

    #[test]
    fn test_unique_names_for_same_file() {
        assert_ne!(unique_name("clip.mp4"), unique_name("clip.mp4"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my clip (1).mov"), "my_clip__1_.mov");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), MAX_NAME_CHARS);
    }
}
