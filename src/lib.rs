pub mod core;
pub mod orchestration;
pub mod plugins;
pub mod security;

pub use crate::core::*;
pub use orchestration::{BatchPublisher, ModuleDescriptor, RunSummary};
pub use plugins::{DevpiClient, SetuptoolsPackager};
pub use security::{CommandError, IndexCredentials, SafeCommandExecutor};
