//! Build errors.

use std::path::PathBuf;

use thiserror::Error;
use vite_ssg_core::SsgCoreError;
use vite_ssg_render::RenderError;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Core(#[from] SsgCoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shell template not found: {}", path.display())]
    MissingTemplate { path: PathBuf },

    #[error("Bundler failed: {0}")]
    Bundler(String),

    #[error("node script `{script}` failed: {reason}")]
    Node { script: &'static str, reason: String },

    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("[vite-ssg] Error on page: {page}\n{source}")]
    Page {
        page: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("[vite-ssg] {} page(s) failed: {}", failed.len(), failed.join(", "))]
    EntriesFailed { failed: Vec<String> },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
