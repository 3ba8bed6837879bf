//! Scripted toolchain fakes shared by the orchestration tests

use crate::core::traits::{IndexClient, Packager, ToolResult};
use crate::security::credentials::IndexCredentials;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub fn ok() -> ToolResult {
    ToolResult {
        success: true,
        exit_code: Some(0),
        output: String::new(),
    }
}

pub fn failed(output: &str) -> ToolResult {
    ToolResult {
        success: false,
        exit_code: Some(1),
        output: output.to_string(),
    }
}

/// Creates a module directory with a `setup.py`
pub fn create_module(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let mut file = std::fs::File::create(dir.join("setup.py")).unwrap();
    writeln!(file, "from setuptools import setup\nsetup(name='{}')", name).unwrap();
    dir
}

pub struct FakePackager {
    pub succeed: bool,
    pub create_dist: bool,
    pub builds: Mutex<Vec<PathBuf>>,
}

impl FakePackager {
    pub fn working() -> Self {
        Self {
            succeed: true,
            create_dist: true,
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            create_dist: false,
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn without_dist() -> Self {
        Self {
            succeed: true,
            create_dist: false,
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.lock().unwrap().len()
    }
}

#[async_trait]
impl Packager for FakePackager {
    fn name(&self) -> &str {
        "fake-packager"
    }

    async fn build(&self, module_dir: &Path) -> anyhow::Result<ToolResult> {
        self.builds.lock().unwrap().push(module_dir.to_path_buf());

        if self.create_dist {
            let dist = module_dir.join("dist");
            std::fs::create_dir_all(&dist)?;
            std::fs::write(dist.join("pkg-0.1.0.tar.gz"), b"archive")?;
        }

        if self.succeed {
            Ok(ok())
        } else {
            Ok(failed("error: invalid command 'bdist_wheel'"))
        }
    }
}

pub struct FakeIndex {
    pub reachable: bool,
    pub use_result: ToolResult,
    pub login_result: ToolResult,
    pub upload_output: String,
    pub upload_success: bool,
    pub calls: Mutex<Vec<String>>,
    pub captures: Mutex<Vec<PathBuf>>,
}

impl FakeIndex {
    pub fn uploading(output: &str) -> Self {
        Self {
            reachable: true,
            use_result: ok(),
            login_result: ok(),
            upload_output: output.to_string(),
            upload_success: true,
            calls: Mutex::new(Vec::new()),
            captures: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("upload"))
            .count()
    }

    pub fn captures(&self) -> Vec<PathBuf> {
        self.captures.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexClient for FakeIndex {
    fn name(&self) -> &str {
        "fake-index"
    }

    async fn check_connectivity(&self, index_url: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("ping {}", index_url));
        if self.reachable {
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }

    async fn use_index(&self, index_url: &str) -> anyhow::Result<ToolResult> {
        self.calls.lock().unwrap().push(format!("use {}", index_url));
        Ok(self.use_result.clone())
    }

    async fn login(&self, credentials: &IndexCredentials) -> anyhow::Result<ToolResult> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("login {}", credentials.username()));
        Ok(self.login_result.clone())
    }

    async fn upload(&self, module_dir: &Path, capture: &Path) -> anyhow::Result<ToolResult> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("upload {}", module_dir.display()));
        self.captures.lock().unwrap().push(capture.to_path_buf());
        std::fs::write(capture, &self.upload_output)?;

        Ok(ToolResult {
            success: self.upload_success,
            exit_code: Some(if self.upload_success { 0 } else { 1 }),
            output: String::new(),
        })
    }
}
