//! Private temporary directory for server build artifacts.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{BuildError, Result};

/// Parent of every run's temporary directory, under the project root.
pub const TEMP_PARENT: &str = ".vite-ssg-temp";

const SUFFIX_LEN: usize = 10;

/// `<root>/.vite-ssg-temp/<random>`, removed on [`TempBuildDir::close`] or drop.
#[derive(Debug)]
pub struct TempBuildDir {
    parent: PathBuf,
    dir: TempDir,
}

impl TempBuildDir {
    /// Remove a stale parent and create a fresh randomized directory.
    pub async fn create(root: &Path) -> Result<Self> {
        let parent = root.join(TEMP_PARENT);
        if tokio::fs::try_exists(&parent).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&parent)
                .await
                .map_err(|e| BuildError::io(&parent, e))?;
        }
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| BuildError::io(&parent, e))?;

        let dir = tempfile::Builder::new()
            .prefix("")
            .rand_bytes(SUFFIX_LEN)
            .tempdir_in(&parent)
            .map_err(|e| BuildError::io(&parent, e))?;
        tracing::debug!(path = %dir.path().display(), "created temp build directory");

        Ok(Self { parent, dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Server build output directory.
    pub fn dist_dir(&self) -> PathBuf {
        self.path().join("dist")
    }

    /// Write the server entry shim for `entry` and return its path.
    pub async fn write_shim(&self, entry: &Path, code: &str) -> Result<PathBuf> {
        let stem = entry
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "entry".to_string());
        let dir = self.path().join("shim");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| BuildError::io(&dir, e))?;
        let shim = dir.join(format!("{stem}.mjs"));
        tokio::fs::write(&shim, code)
            .await
            .map_err(|e| BuildError::io(&shim, e))?;
        Ok(shim)
    }

    /// Remove the directory, and its parent when nothing else is left in it.
    pub async fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| BuildError::io(&path, e))?;
        // fails while another run still owns a sibling
        let _ = tokio::fs::remove_dir(&self.parent).await;
        tracing::debug!(path = %path.display(), "removed temp build directory");
        Ok(())
    }
}
