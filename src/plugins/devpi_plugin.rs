//! devpi Plugin - index client backed by the `devpi` command-line tool
//!
//! Index selection, login and upload shell out to `devpi`. The connectivity
//! probe is a plain HTTP request to the index URL, since devpi-client has no
//! side-effect-free way to ask whether the server is up.

use crate::core::traits::{IndexClient, ToolResult};
use crate::security::command_executor::SafeCommandExecutor;
use crate::security::credentials::IndexCredentials;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};

/// devpi index client
pub struct DevpiClient {
    program: String,
    /// Directory for commands not tied to a module (use, login)
    base_dir: PathBuf,
    http: reqwest::Client,
}

impl DevpiClient {
    pub fn new(program: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_dir: base_dir.into(),
            http: reqwest::Client::new(),
        }
    }

    fn use_args(index_url: &str) -> Vec<String> {
        vec!["use".to_string(), index_url.to_string()]
    }

    fn login_args(credentials: &IndexCredentials) -> Vec<String> {
        vec![
            "login".to_string(),
            credentials.username().to_string(),
            "--password".to_string(),
            credentials.password().expose_secret().to_string(),
        ]
    }

    fn upload_args() -> Vec<String> {
        vec![
            "upload".to_string(),
            "--from-dir".to_string(),
            "dist".to_string(),
        ]
    }

    async fn run(&self, args: &[String]) -> anyhow::Result<ToolResult> {
        let executor = SafeCommandExecutor::new(&self.base_dir)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = executor.execute(&self.program, &args).await?;
        Ok(ToolResult::from_output(&output))
    }
}

#[async_trait]
impl IndexClient for DevpiClient {
    fn name(&self) -> &str {
        "devpi"
    }

    async fn check_connectivity(&self, index_url: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .get(index_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("connectivity probe {} -> {}", index_url, status);

        if status.is_server_error() {
            anyhow::bail!("server answered {}", status);
        }

        Ok(())
    }

    async fn use_index(&self, index_url: &str) -> anyhow::Result<ToolResult> {
        self.run(&Self::use_args(index_url)).await
    }

    async fn login(&self, credentials: &IndexCredentials) -> anyhow::Result<ToolResult> {
        let mut result = self.run(&Self::login_args(credentials)).await?;
        result.output = credentials.mask_in_string(&result.output);
        Ok(result)
    }

    async fn upload(&self, module_dir: &Path, capture: &Path) -> anyhow::Result<ToolResult> {
        let executor = SafeCommandExecutor::new(module_dir)?;
        let args = Self::upload_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let status = executor.execute_to_file(&self.program, &args, capture).await?;
        Ok(ToolResult::from_status(status))
    }
}
