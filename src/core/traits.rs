//! Core traits for the external tools a publishing run drives
//!
//! The publisher never talks to the index or the build backend directly; it
//! goes through [`IndexClient`] and [`Packager`], which keeps the per-module
//! procedure testable with scripted fakes.

use crate::security::credentials::IndexCredentials;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::Arc;

// ============================================================================
// Tool results
// ============================================================================

/// Result of one external tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, when the tool's output was captured in memory
    pub output: String,
}

impl ToolResult {
    pub fn from_output(output: &std::process::Output) -> Self {
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            output: text,
        }
    }

    pub fn from_status(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            output: String::new(),
        }
    }
}

// ============================================================================
// Index client
// ============================================================================

/// Client for the package index service
#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Client name for messages (e.g., "devpi")
    fn name(&self) -> &str;

    /// Verify the index server answers at all
    async fn check_connectivity(&self, index_url: &str) -> anyhow::Result<()>;

    /// Select `index_url` as the upload target
    async fn use_index(&self, index_url: &str) -> anyhow::Result<ToolResult>;

    /// Authenticate against the selected index
    async fn login(&self, credentials: &IndexCredentials) -> anyhow::Result<ToolResult>;

    /// Upload every archive in `<module_dir>/dist`.
    ///
    /// Combined stdout and stderr go to `capture`; the returned
    /// [`ToolResult::output`] is empty.
    async fn upload(&self, module_dir: &Path, capture: &Path) -> anyhow::Result<ToolResult>;
}

// ============================================================================
// Packager
// ============================================================================

/// Build backend producing distribution archives into `<module_dir>/dist`
#[async_trait]
pub trait Packager: Send + Sync {
    fn name(&self) -> &str;

    /// Build a source distribution and a wheel
    async fn build(&self, module_dir: &Path) -> anyhow::Result<ToolResult>;
}

#[async_trait]
impl<T: IndexClient + ?Sized> IndexClient for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn check_connectivity(&self, index_url: &str) -> anyhow::Result<()> {
        (**self).check_connectivity(index_url).await
    }

    async fn use_index(&self, index_url: &str) -> anyhow::Result<ToolResult> {
        (**self).use_index(index_url).await
    }

    async fn login(&self, credentials: &IndexCredentials) -> anyhow::Result<ToolResult> {
        (**self).login(credentials).await
    }

    async fn upload(&self, module_dir: &Path, capture: &Path) -> anyhow::Result<ToolResult> {
        (**self).upload(module_dir, capture).await
    }
}

#[async_trait]
impl<T: Packager + ?Sized> Packager for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn build(&self, module_dir: &Path) -> anyhow::Result<ToolResult> {
        (**self).build(module_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    #[cfg(unix)]
    fn test_from_output_combines_streams() {
        let output = Command::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .output()
            .unwrap();

        let result = ToolResult::from_output(&output);
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[test]
    #[cfg(unix)]
    fn test_from_status() {
        let status = Command::new("sh").args(["-c", "exit 0"]).status().unwrap();
        let result = ToolResult::from_status(status);
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output.is_empty());
    }
}
