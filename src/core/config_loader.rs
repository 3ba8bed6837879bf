//! Configuration file loader for panda-publish
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use crate::security::credentials::IndexCredentials;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".panda-publish.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Directory searched for the project config file
    pub project_path: PathBuf,

    /// Explicit config file; replaces the project config lookup
    pub config_file: Option<PathBuf>,

    /// Home directory for the global config (None disables it)
    pub home_dir: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: ConfigLayer,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables (`PANDA_INDEX_URL`, `PANDA_INDEX_USER`, ...)
    /// 3. Project config (`<project>/.panda-publish.yaml` or `--config`)
    /// 4. Global config (`~/.panda-publish.yaml`)
    /// 5. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut config = PublisherConfig {
            root_dir: options.project_path.clone(),
            ..Default::default()
        };

        if let Some(home_dir) = &options.home_dir
            && let Some(global) = Self::load_config_file(&home_dir.join(CONFIG_FILENAME)).await?
        {
            config.apply(global);
        }

        let project_file = match &options.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(PublishError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => options.project_path.join(CONFIG_FILENAME),
        };
        if let Some(project) = Self::load_config_file(&project_file).await? {
            config.apply(project);
        }

        if let Some(env_layer) = Self::load_env_config(&options.env) {
            config.apply(env_layer);
        }

        config.apply(options.cli_args);

        let config = Self::expand_env_vars(config, &options.env);
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load one layer from a YAML file; a missing file is not an error
    async fn load_config_file(file_path: &Path) -> Result<Option<ConfigLayer>, PublishError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            PublishError::ConfigError(format!(
                "Failed to read config file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let mut layer: ConfigLayer = serde_yaml::from_str(&content).map_err(|e| {
            PublishError::ConfigError(format!(
                "Failed to parse YAML config {}: {}",
                file_path.display(),
                e
            ))
        })?;

        // Relative paths in a file are relative to that file
        if let Some(base) = file_path.parent() {
            if let Some(root_dir) = layer.root_dir.take() {
                layer.root_dir = Some(base.join(root_dir));
            }
            if let Some(capture_dir) = layer.capture_dir.take() {
                layer.capture_dir = Some(base.join(capture_dir));
            }
        }

        tracing::debug!("loaded config layer from {}", file_path.display());
        Ok(Some(layer))
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<ConfigLayer> {
        let mut layer = ConfigLayer::default();
        let mut has_changes = false;

        if let Some(url) = env.get("PANDA_INDEX_URL") {
            layer.index_url = Some(url.clone());
            has_changes = true;
        }

        if let Some(user) = env.get("PANDA_INDEX_USER") {
            layer.username = Some(user.clone());
            has_changes = true;
        }

        if let Some(password) = env.get("PANDA_INDEX_PASSWORD") {
            layer.password = Some(SecretString::new(password.clone().into()));
            has_changes = true;
        }

        // PANDA_PUBLISH_MODULES=a,b,c
        if let Some(modules) = env.get("PANDA_PUBLISH_MODULES") {
            layer.modules = Some(parse_module_list(modules));
            has_changes = true;
        }

        if has_changes { Some(layer) } else { None }
    }

    /// Expand `${VAR}` references in string settings
    fn expand_env_vars(mut config: PublisherConfig, env: &HashMap<String, String>) -> PublisherConfig {
        config.index_url = Self::expand_string(&config.index_url, env);

        let password = Self::expand_string(config.credentials.password().expose_secret(), env);
        let username = Self::expand_string(config.credentials.username(), env);
        config.credentials = IndexCredentials::new(username, password);

        config
    }

    /// Expand environment variables in a single string
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let env_var_regex = match Regex::new(ENV_VAR_PATTERN) {
            Ok(regex) => regex,
            Err(_) => return input.to_string(),
        };

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                eprintln!("⚠️  Environment variable {} not found", var_name);
            }
        }

        result
    }

    /// Validate a resolved configuration
    pub fn validate(config: &PublisherConfig) -> Result<(), PublishError> {
        if !(config.index_url.starts_with("http://") || config.index_url.starts_with("https://")) {
            return Err(PublishError::ConfigError(format!(
                "Index URL must start with http:// or https://: {}",
                config.index_url
            )));
        }

        if config.modules.is_empty() {
            return Err(PublishError::ConfigError(
                "At least one module must be configured".to_string(),
            ));
        }

        for module in &config.modules {
            if module.is_empty()
                || module == "."
                || module == ".."
                || module.contains('/')
                || module.contains('\\')
            {
                return Err(PublishError::ConfigError(format!(
                    "Invalid module name: '{}'",
                    module
                )));
            }
        }

        if config.package_files.is_empty() {
            return Err(PublishError::ConfigError(
                "At least one package-definition file name must be configured".to_string(),
            ));
        }

        Ok(())
    }
}

/// Split a comma-separated module list, dropping empty entries
pub fn parse_module_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        let mut file = std::fs::File::create(dir.join(CONFIG_FILENAME)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    #[tokio::test]
    async fn test_load_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
        assert_eq!(config.root_dir, temp_dir.path());
        assert_eq!(config.modules.len(), DEFAULT_MODULES.len());
    }

    #[tokio::test]
    async fn test_priority_cli_over_env_over_file() {
        let temp_dir = TempDir::new().unwrap();
        write_config(
            temp_dir.path(),
            "indexUrl: http://file:3141/root/dev\nusername: file-user\nmodules: [panda_common]\n",
        );

        let mut env = HashMap::new();
        env.insert("PANDA_INDEX_URL".to_string(), "http://env:3141/root/dev".to_string());
        env.insert("PANDA_INDEX_USER".to_string(), "env-user".to_string());

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            cli_args: ConfigLayer {
                index_url: Some("http://cli:3141/root/dev".to_string()),
                ..Default::default()
            },
            env,
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config.index_url, "http://cli:3141/root/dev");
        assert_eq!(config.credentials.username(), "env-user");
        assert_eq!(config.modules, vec!["panda_common".to_string()]);
    }

    #[tokio::test]
    async fn test_global_config_below_project_config() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_config(home.path(), "username: global-user\npassword: global-pw\n");
        write_config(project.path(), "username: project-user\n");

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: project.path().to_path_buf(),
            home_dir: Some(home.path().to_path_buf()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config.credentials.username(), "project-user");
        assert_eq!(config.credentials.password().expose_secret(), "global-pw");
    }

    #[tokio::test]
    async fn test_explicit_config_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: Some(temp_dir.path().join("nope.yaml")),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(PublishError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), "modules: [unclosed\n");

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(PublishError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_password_expansion_from_env() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), "password: ${DEVPI_PASSWORD}\n");

        let mut env = HashMap::new();
        env.insert("DEVPI_PASSWORD".to_string(), "expanded-secret".to_string());

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            env,
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(
            config.credentials.password().expose_secret(),
            "expanded-secret"
        );
    }

    #[test]
    fn test_expand_string_missing_var_left_alone() {
        let env = HashMap::new();
        assert_eq!(
            ConfigLoader::expand_string("http://${NOPE}/root/dev", &env),
            "http://${NOPE}/root/dev"
        );
    }

    #[test]
    fn test_load_env_modules() {
        let mut env = HashMap::new();
        env.insert(
            "PANDA_PUBLISH_MODULES".to_string(),
            "panda_common, panda_web,,".to_string(),
        );
        let layer = ConfigLoader::load_env_config(&env).unwrap();
        assert_eq!(
            layer.modules,
            Some(vec!["panda_common".to_string(), "panda_web".to_string()])
        );
    }

    #[test]
    fn test_load_env_empty() {
        assert!(ConfigLoader::load_env_config(&HashMap::new()).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PublisherConfig::default();
        config.index_url = "localhost:3141".to_string();
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = PublisherConfig::default();
        config.modules = vec!["../escape".to_string()];
        assert!(ConfigLoader::validate(&config).is_err());

        let mut config = PublisherConfig::default();
        config.modules.clear();
        assert!(ConfigLoader::validate(&config).is_err());

        assert!(ConfigLoader::validate(&PublisherConfig::default()).is_ok());
    }
}
