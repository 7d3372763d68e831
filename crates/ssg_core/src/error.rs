//! Core prerender error types (pure - no I/O variants).

use thiserror::Error;

/// Core prerender errors (pure - no I/O variants).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SsgCoreError {
    #[error("Could not find a tag with id=\"{container_id}\" to replace it with server-side rendered HTML")]
    InjectionTargetNotFound { container_id: String },

    #[error("Invalid option `{option}`: {reason}")]
    InvalidOption { option: &'static str, reason: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Malformed render result: {0}")]
    MalformedRenderResult(String),
}

pub type Result<T> = std::result::Result<T, SsgCoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_target_not_found_display() {
        let error = SsgCoreError::InjectionTargetNotFound {
            container_id: "app".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Could not find a tag with id=\"app\" to replace it with server-side rendered HTML"
        );
    }

    #[test]
    fn test_invalid_option_display() {
        let error = SsgCoreError::InvalidOption {
            option: "rootContainerId",
            reason: "must not be empty".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid option `rootContainerId`: must not be empty"
        );
    }
}
