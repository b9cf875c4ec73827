//! # Artifact staging.
//!
//! Writes rendered artifacts to disk so the notifier can attach them.
//!
//! ## Rules
//! - Every stage call gets its own path, `{user_id}_{uuid}_{file_name}`, so two
//!   subscriptions by the same user never share a file.
//! - Content is written to a `.part` sibling and renamed into place; the final
//!   path only ever holds a complete file. A failed write removes the `.part`.
//! - A [`StagedArtifact`] removes its file when dropped, so a task that times
//!   out or panics mid-send does not leave it behind.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::producer::Artifact;

/// Directory where artifacts are staged.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `artifact` under a fresh path for `user_id`.
    pub async fn stage(&self, user_id: i64, artifact: &Artifact) -> io::Result<StagedArtifact> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{user_id}_{}_{}", Uuid::new_v4().simple(), artifact.file_name);
        let path = self.dir.join(&file_name);
        let part = self.dir.join(format!("{file_name}.part"));

        let written = match tokio::fs::write(&part, &artifact.content).await {
            Ok(()) => tokio::fs::rename(&part, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
        Ok(StagedArtifact {
            path,
            removed: false,
        })
    }
}

/// A complete artifact on disk, removed on [`discard`](Self::discard) or drop.
#[derive(Debug)]
pub struct StagedArtifact {
    path: PathBuf,
    removed: bool,
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the staged file.
    pub async fn discard(mut self) -> io::Result<()> {
        let res = tokio::fs::remove_file(&self.path).await;
        self.removed = res.is_ok();
        res
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("membervisor-staging-{}", Uuid::new_v4().simple()))
    }

    fn artifact() -> Artifact {
        Artifact {
            file_name: "Manual.txt".into(),
            content: b"guide".to_vec(),
        }
    }

    #[tokio::test]
    async fn stages_complete_file_at_unique_path() {
        let staging = Staging::new(scratch_dir());

        let a = staging.stage(42, &artifact()).await.unwrap();
        let b = staging.stage(42, &artifact()).await.unwrap();
        assert_ne!(a.path(), b.path());

        let name = a.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("42_"));
        assert!(name.ends_with("_Manual.txt"));
        assert_eq!(tokio::fs::read(a.path()).await.unwrap(), b"guide");

        let path = a.path().to_path_buf();
        a.discard().await.unwrap();
        assert!(!path.exists());

        b.discard().await.unwrap();
        let _ = tokio::fs::remove_dir_all(staging.dir()).await;
    }

    #[tokio::test]
    async fn dropped_artifact_removes_its_file() {
        let staging = Staging::new(scratch_dir());
        let staged = staging.stage(7, &artifact()).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.is_file());

        drop(staged);
        assert!(!path.exists());
        let _ = tokio::fs::remove_dir_all(staging.dir()).await;
    }

    #[tokio::test]
    async fn failed_write_leaves_no_part_file() {
        let dir = scratch_dir();
        let staging = Staging::new(&dir);
        // The `.part` parent directory does not exist, so the write fails.
        let bad = Artifact {
            file_name: "nested/Manual.txt".into(),
            content: b"guide".to_vec(),
        };
        assert!(staging.stage(7, &bad).await.is_err());

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
