//! Error handling for index publishing
//!
//! Every variant is fatal: these errors abort the whole run before any
//! module is processed.
//! Per-module problems are not errors at this level; they are reported as
//! [`ModuleOutcome`](crate::core::outcome::ModuleOutcome) values instead.

use thiserror::Error;

/// Main error type for publishing runs
#[derive(Error, Debug)]
pub enum PublishError {
    // Pre-flight errors
    #[error("[{index_url}] package index is not reachable: {message}")]
    IndexUnreachable { index_url: String, message: String },

    #[error("[{index_url}] failed to select package index")]
    IndexSelectionFailed { index_url: String },

    #[error("[{index_url}] login failed for user '{username}'")]
    LoginFailed { index_url: String, username: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl PublishError {
    /// Index URL associated with this error, if any
    pub fn index_url(&self) -> Option<&str> {
        match self {
            Self::IndexUnreachable { index_url, .. }
            | Self::IndexSelectionFailed { index_url }
            | Self::LoginFailed { index_url, .. } => Some(index_url),
            Self::ConfigError(_) => None,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexUnreachable { .. } => vec![
                "Check that the devpi server is running",
                "Check the index URL and your network connection",
            ],
            Self::IndexSelectionFailed { .. } => vec![
                "Check that the index exists on the server",
                "Run `devpi use <INDEX_URL>` manually to see the error",
            ],
            Self::LoginFailed { .. } => vec![
                "Check the username and password",
                "Re-run with explicit arguments: panda-publish <INDEX_URL> <PASSWORD>",
            ],
            Self::ConfigError(_) => vec!["Check .panda-publish.yaml and PANDA_* environment variables"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::IndexUnreachable { .. } => "INDEX_UNREACHABLE",
            Self::IndexSelectionFailed { .. } => "INDEX_SELECTION_FAILED",
            Self::LoginFailed { .. } => "LOGIN_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_unreachable_error() {
        let error = PublishError::IndexUnreachable {
            index_url: "http://localhost:3141/root/dev".to_string(),
            message: "connection refused".to_string(),
        };

        assert_eq!(error.index_url(), Some("http://localhost:3141/root/dev"));
        assert_eq!(error.code(), "INDEX_UNREACHABLE");
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_login_failed_error() {
        let error = PublishError::LoginFailed {
            index_url: "http://pypi.internal/root/prod".to_string(),
            username: "root".to_string(),
        };

        assert_eq!(error.index_url(), Some("http://pypi.internal/root/prod"));
        assert_eq!(error.code(), "LOGIN_FAILED");
        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("<INDEX_URL> <PASSWORD>")));
    }

    #[test]
    fn test_selection_failed_error() {
        let error = PublishError::IndexSelectionFailed {
            index_url: "http://x/root/dev".to_string(),
        };

        assert_eq!(error.code(), "INDEX_SELECTION_FAILED");
        assert!(error.to_string().contains("http://x/root/dev"));
    }

    #[test]
    fn test_config_error() {
        let error = PublishError::ConfigError("bad yaml".to_string());

        assert_eq!(error.index_url(), None);
        assert_eq!(error.code(), "CONFIG_ERROR");
        assert_eq!(error.to_string(), "configuration error: bad yaml");
    }
}
