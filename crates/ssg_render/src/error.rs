//! Render errors including I/O and JS execution.

use thiserror::Error;
use vite_ssg_core::SsgCoreError;

/// Render errors including I/O and JS execution.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Core error: {0}")]
    Core(#[from] SsgCoreError),

    #[error("Failed to load server bundle from {path}: {reason}")]
    BundleLoad { path: String, reason: String },

    #[error("could not locate render entry point: `{export}` is not exported as a function by {path}")]
    MissingExport { export: String, path: String },

    #[error("createApp() in {path} returned an invalid context: {reason}")]
    InvalidContext { path: String, reason: String },

    #[error("JavaScript execution error: {0}")]
    JsExecution(String),

    #[error("The server bundle finished without reporting a render result")]
    NoResult,

    #[error("Failed to start render worker: {0}")]
    WorkerSpawn(String),

    #[error("Render worker channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_export_display() {
        let error = RenderError::MissingExport {
            export: "createApp".to_string(),
            path: "/tmp/main.mjs".to_string(),
        };
        assert!(error
            .to_string()
            .starts_with("could not locate render entry point"));
        assert!(error.to_string().contains("/tmp/main.mjs"));
    }

    #[test]
    fn test_core_error_converts() {
        let error: RenderError = SsgCoreError::MalformedRenderResult("eof".to_string()).into();
        assert_eq!(error.to_string(), "Core error: Malformed render result: eof");
    }
}
