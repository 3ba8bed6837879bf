//! Orchestration layer for publishing runs
//!
//! [`BatchPublisher`] owns a run: pre-flight checks, then the configured
//! modules one at a time through [`ModulePublisher`].

pub mod batch_publisher;
pub mod module_publisher;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch_publisher::{BatchPublisher, ModuleReport, RunSummary};
pub use module_publisher::{ModuleContext, ModuleDescriptor, ModulePublisher, clean_artifacts};
