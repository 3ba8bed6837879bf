//! setuptools Plugin - builds sdist and wheel archives into `dist/`

use crate::core::traits::{Packager, ToolResult};
use crate::security::command_executor::SafeCommandExecutor;
use async_trait::async_trait;
use std::path::Path;

/// Packager running the module's setup script through Python
pub struct SetuptoolsPackager {
    python: String,
}

impl Default for SetuptoolsPackager {
    fn default() -> Self {
        Self::new("python")
    }
}

impl SetuptoolsPackager {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// `setup.py sdist bdist_wheel`, or PEP 517 `build` for pyproject-only modules
    fn build_args(module_dir: &Path) -> Vec<&'static str> {
        if module_dir.join("setup.py").exists() {
            vec!["setup.py", "sdist", "bdist_wheel"]
        } else {
            vec!["-m", "build", "--sdist", "--wheel"]
        }
    }
}

#[async_trait]
impl Packager for SetuptoolsPackager {
    fn name(&self) -> &str {
        "setuptools"
    }

    async fn build(&self, module_dir: &Path) -> anyhow::Result<ToolResult> {
        let executor = SafeCommandExecutor::new(module_dir)?;
        let output = executor
            .execute(&self.python, &Self::build_args(module_dir))
            .await?;
        let result = ToolResult::from_output(&output);

        tracing::debug!(
            "{} build output for {}:\n{}",
            self.name(),
            module_dir.display(),
            result.output
        );

        Ok(result)
    }
}
