//! Module Publisher - builds and uploads a single module
//!
//! The per-module procedure:
//! 1. Skip when the module directory or its package-definition file is missing
//! 2. Enter the module's working context
//! 3. Remove `dist`, `build` and `*.egg-info` left over from earlier builds
//! 4. Build sdist and wheel; a failed build or a missing `dist` is a failure
//! 5. Upload with output captured to a per-module temporary file
//! 6. Classify the captured text and report the outcome
//!
//! Nothing is retried. Every path out of [`ModulePublisher::publish`] drops
//! the [`ModuleContext`], which deletes the capture file.

use crate::core::outcome::{FailureReason, ModuleOutcome, SkipReason, UploadOutcome};
use crate::core::traits::{IndexClient, Packager};
use crate::security::credentials::IndexCredentials;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use walkdir::WalkDir;

/// Build output directories removed before every build
const ARTIFACT_DIRS: &[&str] = &["dist", "build"];

/// A module to publish: its name and the directory it lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl ModuleDescriptor {
    pub fn new(root_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: root_dir.join(name),
        }
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.path.join("dist")
    }
}

/// Working context for one module.
///
/// Commands for the module run with its directory as working directory; the
/// process-wide current directory is left untouched. The upload capture file
/// belongs to the context and is deleted when the context is dropped.
pub struct ModuleContext<'a> {
    module: &'a ModuleDescriptor,
    capture: Option<NamedTempFile>,
}

impl<'a> ModuleContext<'a> {
    pub fn enter(module: &'a ModuleDescriptor) -> Self {
        tracing::debug!("entering {}", module.path.display());
        Self {
            module,
            capture: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.module.path
    }

    /// Create the capture file `upload_<name>_XXXXXX.log` in `capture_dir`
    pub fn create_capture(&mut self, capture_dir: &Path) -> std::io::Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix(&format!("upload_{}_", self.module.name))
            .suffix(".log")
            .tempfile_in(capture_dir)?;
        let path = file.path().to_path_buf();
        self.capture = Some(file);
        Ok(path)
    }
}

impl Drop for ModuleContext<'_> {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take()
            && let Err(e) = capture.close()
        {
            tracing::warn!(
                "failed to remove capture file for {}: {}",
                self.module.name,
                e
            );
        }
        tracing::debug!("leaving {}", self.module.path.display());
    }
}

/// Runs the per-module procedure against an index client and a packager
pub struct ModulePublisher<'a> {
    index: &'a dyn IndexClient,
    packager: &'a dyn Packager,
    package_files: &'a [String],
    capture_dir: &'a Path,
    credentials: &'a IndexCredentials,
}

impl<'a> ModulePublisher<'a> {
    pub fn new(
        index: &'a dyn IndexClient,
        packager: &'a dyn Packager,
        package_files: &'a [String],
        capture_dir: &'a Path,
        credentials: &'a IndexCredentials,
    ) -> Self {
        Self {
            index,
            packager,
            package_files,
            capture_dir,
            credentials,
        }
    }

    /// Build and upload one module
    pub async fn publish(&self, module: &ModuleDescriptor) -> ModuleOutcome {
        println!("\n📦 {}", module.name);

        if !module.path.is_dir() {
            println!("⏭️  {}: directory not found, skipping", module.name);
            return ModuleOutcome::Skipped(SkipReason::MissingDirectory);
        }

        if !self
            .package_files
            .iter()
            .any(|file| module.path.join(file).is_file())
        {
            println!(
                "⏭️  {}: no {} found, skipping",
                module.name,
                self.package_files.join(" or ")
            );
            return ModuleOutcome::Skipped(SkipReason::MissingPackageFile);
        }

        let mut context = ModuleContext::enter(module);

        println!("🧹 Cleaning previous build artifacts");
        clean_artifacts(context.dir()).await;

        println!("🔨 Building distributions with {}", self.packager.name());
        match self.packager.build(context.dir()).await {
            Ok(result) if result.success => {}
            Ok(result) => {
                println!("❌ {}: build failed", module.name);
                print_tail(&result.output, 20);
                return ModuleOutcome::Failed(FailureReason::BuildFailed);
            }
            Err(e) => {
                println!("❌ {}: build failed - {}", module.name, e);
                return ModuleOutcome::Failed(FailureReason::BuildFailed);
            }
        }

        if !module.dist_dir().is_dir() {
            println!("❌ {}: build finished but produced no dist directory", module.name);
            return ModuleOutcome::Failed(FailureReason::MissingDist);
        }

        let capture = match context.create_capture(self.capture_dir) {
            Ok(path) => path,
            Err(e) => {
                println!("❌ {}: cannot create capture file - {}", module.name, e);
                return ModuleOutcome::Failed(FailureReason::ToolError(e.to_string()));
            }
        };

        println!("🚀 Uploading to index via {}", self.index.name());
        let status = match self.index.upload(context.dir(), &capture).await {
            Ok(status) => status,
            Err(e) => {
                println!("❌ {}: upload failed - {}", module.name, e);
                return ModuleOutcome::Failed(FailureReason::ToolError(e.to_string()));
            }
        };

        let output = match fs::read(&capture).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                println!("❌ {}: cannot read upload output - {}", module.name, e);
                return ModuleOutcome::Failed(FailureReason::ToolError(e.to_string()));
            }
        };

        // Classify the raw text; masking can erase a marker that overlaps the password
        match UploadOutcome::classify(&output) {
            UploadOutcome::AlreadyExists => {
                println!(
                    "ℹ️  {}: version already exists on the index, treating as success",
                    module.name
                );
                ModuleOutcome::AlreadyPublished
            }
            UploadOutcome::Failed => {
                let output = self.credentials.mask_in_string(&output);
                println!("❌ {}: upload failed", module.name);
                println!("{}", output);
                ModuleOutcome::Failed(FailureReason::UploadRejected { output })
            }
            UploadOutcome::Uploaded => {
                if !status.success {
                    tracing::warn!(
                        "{}: upload exited with {:?} but reported no failure",
                        module.name,
                        status.exit_code
                    );
                }
                println!("✅ {}: uploaded", module.name);
                ModuleOutcome::Published
            }
        }
    }
}

/// Remove `dist`, `build` and any `*.egg-info` directory (also one level
/// down, for `src/` layouts). Missing directories are fine; other errors are
/// logged and ignored.
pub async fn clean_artifacts(module_dir: &Path) {
    let mut targets: Vec<PathBuf> = ARTIFACT_DIRS.iter().map(|d| module_dir.join(d)).collect();

    targets.extend(
        WalkDir::new(module_dir)
            .min_depth(1)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".egg-info"))
            .map(|entry| entry.into_path()),
    );

    for target in targets {
        match fs::remove_dir_all(&target).await {
            Ok(()) => tracing::debug!("removed {}", target.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not remove {}: {}", target.display(), e),
        }
    }
}

fn print_tail(output: &str, lines: usize) {
    let all: Vec<&str> = output.lines().collect();
    for line in &all[all.len().saturating_sub(lines)..] {
        println!("   {}", line);
    }
}
