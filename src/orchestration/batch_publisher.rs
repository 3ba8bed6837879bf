//! Batch Publisher - pre-flight, the module loop, and the run summary
//!
//! Features:
//! - Pre-flight checks (connectivity, index selection, login) that abort the run
//! - Strictly sequential processing in configured order
//! - Per-module outcomes folded into a [`RunTally`]
//! - Text or JSON summary

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::outcome::{ModuleOutcome, RunTally};
use crate::core::traits::{IndexClient, Packager};
use crate::orchestration::module_publisher::{ModuleDescriptor, ModulePublisher};
use crate::plugins::{DevpiClient, SetuptoolsPackager};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// Outcome of one module within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub outcome: ModuleOutcome,
}

/// Everything a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub index_url: String,
    pub install_hint: String,
    pub tally: RunTally,
    pub modules: Vec<ModuleReport>,
    pub started_at: DateTime<Utc>,
    /// Milliseconds
    pub duration: u64,
}

/// BatchPublisher - publishes the configured module list to one index
pub struct BatchPublisher {
    config: PublisherConfig,
    index: Box<dyn IndexClient>,
    packager: Box<dyn Packager>,
}

impl BatchPublisher {
    /// Create a publisher using devpi and setuptools
    pub fn new(config: PublisherConfig) -> Self {
        let index = DevpiClient::new(config.devpi.clone(), config.root_dir.clone());
        let packager = SetuptoolsPackager::new(config.python.clone());
        Self::with_toolchain(config, Box::new(index), Box::new(packager))
    }

    pub fn with_toolchain(
        config: PublisherConfig,
        index: Box<dyn IndexClient>,
        packager: Box<dyn Packager>,
    ) -> Self {
        Self {
            config,
            index,
            packager,
        }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Pre-flight, then every module in order
    pub async fn run(&self) -> Result<RunSummary, PublishError> {
        self.preflight().await?;
        Ok(self.publish_all().await)
    }

    /// Connectivity, index selection and login. Any failure aborts the run.
    pub async fn preflight(&self) -> Result<(), PublishError> {
        let index_url = &self.config.index_url;
        let credentials = &self.config.credentials;

        println!("🔍 Checking connection to {}", index_url);
        if let Err(e) = self.index.check_connectivity(index_url).await {
            return Err(PublishError::IndexUnreachable {
                index_url: index_url.clone(),
                message: e.to_string(),
            });
        }

        println!("🎯 Selecting index {}", index_url);
        match self.index.use_index(index_url).await {
            Ok(result) if result.success => {}
            Ok(result) => {
                eprintln!("{}", result.output.trim_end());
                return Err(PublishError::IndexSelectionFailed {
                    index_url: index_url.clone(),
                });
            }
            Err(e) => {
                eprintln!("{}", e);
                return Err(PublishError::IndexSelectionFailed {
                    index_url: index_url.clone(),
                });
            }
        }

        println!("🔑 Logging in as {}", credentials.username());
        if credentials.has_password() {
            tracing::debug!("login password: {}", credentials.masked_password());
        } else {
            println!("⚠️  No password given, trying an empty one");
        }
        let login_ok = match self.index.login(credentials).await {
            Ok(result) if result.success => true,
            Ok(result) => {
                eprintln!("{}", credentials.mask_in_string(result.output.trim_end()));
                false
            }
            Err(e) => {
                eprintln!("{}", credentials.mask_in_string(&e.to_string()));
                false
            }
        };

        if !login_ok {
            eprintln!("\n💡 Pass the index URL and password explicitly:");
            eprintln!("   panda-publish {} <PASSWORD>", index_url);
            return Err(PublishError::LoginFailed {
                index_url: index_url.clone(),
                username: credentials.username().to_string(),
            });
        }

        Ok(())
    }

    /// Process every configured module in order. Module failures never abort.
    pub async fn publish_all(&self) -> RunSummary {
        let started_at = Utc::now();
        let start = Instant::now();

        let module_publisher = ModulePublisher::new(
            self.index.as_ref(),
            self.packager.as_ref(),
            &self.config.package_files,
            &self.config.capture_dir,
            &self.config.credentials,
        );

        println!(
            "\n📦 Publishing {} modules: {}",
            self.config.modules.len(),
            self.config.modules.join(", ")
        );

        let mut tally = RunTally::default();
        let mut modules = Vec::with_capacity(self.config.modules.len());

        for name in &self.config.modules {
            let descriptor = ModuleDescriptor::new(&self.config.root_dir, name);
            let outcome = module_publisher.publish(&descriptor).await;
            tally.record(&outcome);
            modules.push(ModuleReport {
                module: name.clone(),
                outcome,
            });
        }

        RunSummary {
            index_url: self.config.index_url.clone(),
            install_hint: self.config.install_hint(),
            tally,
            modules,
            started_at,
            duration: start.elapsed().as_millis() as u64,
        }
    }

    /// Print the run summary
    pub fn print_summary(summary: &RunSummary) {
        println!("\n{}", "=".repeat(60));
        println!("📊 Publish Summary");
        println!("{}", "=".repeat(60));

        println!("\n✅ Succeeded: {}", summary.tally.succeeded);
        println!("❌ Failed: {}", summary.tally.failed);
        if summary.tally.skipped > 0 {
            println!("⏭️  Skipped: {}", summary.tally.skipped);
        }

        for report in summary.modules.iter().filter(|r| r.outcome.is_failure()) {
            if let ModuleOutcome::Failed(reason) = &report.outcome {
                println!("   - {}: {}", report.module, reason);
            }
        }

        println!("\nIndex: {}", summary.index_url);
        println!("Install with:");
        println!("   {}", summary.install_hint);

        println!("\n{}", "=".repeat(60));
        println!("Finished in {}ms", summary.duration);
        println!("{}\n", "=".repeat(60));
    }
}
