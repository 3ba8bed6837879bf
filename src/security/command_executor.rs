//! SafeCommandExecutor: whitelisted execution of the external build and index tools
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only the packaging and index tools can execute
//! - **Injection prevention**: Arguments are passed as a vector, never through a shell
//! - **Working directory validation**: Validates existence before execution
//!
//! Commands run to completion; there is no timeout, so a hung tool stalls the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use panda_publish::SafeCommandExecutor;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! let output = executor.execute("devpi", &["--version"]).await?;
//! println!("{}", String::from_utf8_lossy(&output.stdout));
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist.
///
/// Matched against the file name of the program, so absolute paths such as
/// `/opt/venv/bin/devpi` are accepted. `python` may carry a version suffix
/// (`python3`, `python3.11`).
const ALLOWED_COMMANDS: &[&str] = &["python", "devpi"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Output capture file could not be opened
    #[error("Failed to open capture file {path}: {message}")]
    CaptureFailed { path: PathBuf, message: String },
}

/// Safe command executor bound to one working directory
#[derive(Debug, Clone)]
pub struct SafeCommandExecutor {
    working_dir: PathBuf,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self { working_dir })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Check a program against the whitelist
    pub fn is_allowed(command: &str) -> bool {
        let name = Path::new(command)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(command);

        ALLOWED_COMMANDS.iter().any(|allowed| match name.strip_prefix(allowed) {
            Some("") => true,
            Some(suffix) => {
                *allowed == "python" && suffix.chars().all(|c| c.is_ascii_digit() || c == '.')
            }
            None => false,
        })
    }

    fn command(&self, command: &str, args: &[&str]) -> Result<Command, CommandError> {
        if !Self::is_allowed(command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        tracing::debug!(
            "running `{} {}` in {}",
            command,
            args.join(" "),
            self.working_dir.display()
        );

        let mut cmd = Command::new(command);
        cmd.args(args).current_dir(&self.working_dir).stdin(Stdio::null());
        Ok(cmd)
    }

    /// Execute a command and capture stdout and stderr separately.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    pub async fn execute(&self, command: &str, args: &[&str]) -> Result<Output, CommandError> {
        self.command(command, args)?
            .output()
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", command, e)))
    }

    /// Execute a command with stdout and stderr both redirected into `capture`.
    ///
    /// The file is truncated first. Only the exit status is returned; callers
    /// read the captured text back from the file.
    pub async fn execute_to_file(
        &self,
        command: &str,
        args: &[&str],
        capture: &Path,
    ) -> Result<ExitStatus, CommandError> {
        let capture_err = |e: std::io::Error| CommandError::CaptureFailed {
            path: capture.to_path_buf(),
            message: e.to_string(),
        };

        let stdout = tokio::fs::File::create(capture)
            .await
            .map_err(capture_err)?;
        let stderr = stdout.try_clone().await.map_err(capture_err)?;

        self.command(command, args)?
            .stdout(Stdio::from(stdout.into_std().await))
            .stderr(Stdio::from(stderr.into_std().await))
            .status()
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", command, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allowed_commands() {
        assert!(SafeCommandExecutor::is_allowed("devpi"));
        assert!(SafeCommandExecutor::is_allowed("python"));
        assert!(SafeCommandExecutor::is_allowed("python3"));
        assert!(SafeCommandExecutor::is_allowed("python3.11"));
        assert!(SafeCommandExecutor::is_allowed("/opt/venv/bin/devpi"));
    }

    #[test]
    fn test_rejected_commands() {
        assert!(!SafeCommandExecutor::is_allowed("rm"));
        assert!(!SafeCommandExecutor::is_allowed("sh"));
        assert!(!SafeCommandExecutor::is_allowed("pythonic"));
        assert!(!SafeCommandExecutor::is_allowed("devpi-server"));
    }

    #[tokio::test]
    async fn test_rejected_command_is_not_run() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let result = executor.execute("rm", &["-rf", "/"]).await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(matches!(
            result,
            Err(CommandError::InvalidWorkingDirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_execution_failure() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let result = executor
            .execute("/nonexistent/bin/devpi", &["--version"])
            .await;
        assert!(matches!(result, Err(CommandError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_capture_file_in_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let capture = temp_dir.path().join("missing").join("out.log");
        let result = executor
            .execute_to_file("devpi", &["--version"], &capture)
            .await;
        assert!(matches!(result, Err(CommandError::CaptureFailed { .. })));
    }
}
