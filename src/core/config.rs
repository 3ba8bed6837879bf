//! Configuration structures for panda-publish
//!
//! [`ConfigLayer`] is the partial, serde-backed shape shared by every source
//! (project file, environment, CLI). Layers are merged by
//! [`ConfigLoader`](crate::core::config_loader::ConfigLoader) into a resolved
//! [`PublisherConfig`].

use crate::security::credentials::IndexCredentials;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Index used when no URL is given
pub const DEFAULT_INDEX_URL: &str = "http://localhost:3141/root/dev";

/// devpi's built-in administrator account
pub const DEFAULT_USERNAME: &str = "root";

/// Modules published by default, in publish order
pub const DEFAULT_MODULES: &[&str] = &[
    "panda_common",
    "panda_data",
    "panda_data_hub",
    "panda_factor",
    "panda_llm",
    "panda_factor_server",
    "panda_web",
];

/// Package-definition files; any one present makes a directory publishable
pub const DEFAULT_PACKAGE_FILES: &[&str] = &["setup.py"];

/// One configuration source. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Never written back out
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "deserialize_secret"
    )]
    pub password: Option<SecretString>,

    /// Directory containing the module directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Ordered module list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_files: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,

    /// Where upload capture files are created (default: system temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_on_exit: Option<bool>,
}

/// External tool program names
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub devpi: Option<String>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| SecretString::new(v.into())))
}

/// Fully resolved configuration for a run
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub index_url: String,
    pub credentials: IndexCredentials,
    pub root_dir: PathBuf,
    pub modules: Vec<String>,
    pub package_files: Vec<String>,
    pub python: String,
    pub devpi: String,
    pub capture_dir: PathBuf,
    pub pause_on_exit: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            credentials: IndexCredentials::new(DEFAULT_USERNAME, ""),
            root_dir: PathBuf::from("."),
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            package_files: DEFAULT_PACKAGE_FILES.iter().map(|f| f.to_string()).collect(),
            python: "python".to_string(),
            devpi: "devpi".to_string(),
            capture_dir: std::env::temp_dir(),
            pause_on_exit: true,
        }
    }
}

impl PublisherConfig {
    /// Apply a layer on top of this configuration
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(index_url) = layer.index_url {
            self.index_url = index_url;
        }

        match (layer.username, layer.password) {
            (Some(username), Some(password)) => {
                self.credentials = IndexCredentials::from_secret(username, password);
            }
            (Some(username), None) => {
                self.credentials =
                    IndexCredentials::from_secret(username, self.credentials.password().clone());
            }
            (None, Some(password)) => {
                self.credentials =
                    IndexCredentials::from_secret(self.credentials.username(), password);
            }
            (None, None) => {}
        }

        if let Some(root_dir) = layer.root_dir {
            self.root_dir = root_dir;
        }
        if let Some(modules) = layer.modules {
            self.modules = modules;
        }
        if let Some(package_files) = layer.package_files {
            self.package_files = package_files;
        }
        if let Some(tools) = layer.tools {
            if let Some(python) = tools.python {
                self.python = python;
            }
            if let Some(devpi) = tools.devpi {
                self.devpi = devpi;
            }
        }
        if let Some(capture_dir) = layer.capture_dir {
            self.capture_dir = capture_dir;
        }
        if let Some(pause_on_exit) = layer.pause_on_exit {
            self.pause_on_exit = pause_on_exit;
        }
    }

    /// The index's `+simple` page, as used by pip
    pub fn simple_index_url(&self) -> String {
        format!("{}/+simple/", self.index_url.trim_end_matches('/'))
    }

    /// Install command template printed at the end of a run
    pub fn install_hint(&self) -> String {
        format!("pip install -i {} <package>", self.simple_index_url())
    }
}
