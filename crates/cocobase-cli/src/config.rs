/*
[INPUT]:  YAML configuration file, environment variables, CLI overrides
[OUTPUT]: Resolved client configuration and session file location
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cocobase::{ClientConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

pub const ENV_BASE_URL: &str = "COCOBASE_BASE_URL";
pub const ENV_API_KEY: &str = "COCOBASE_API_KEY";

/// CLI configuration; every field is optional in the YAML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// API root, defaults to the hosted service
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Where the session token and user are kept
    pub session_file: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Explicit path, else `<config_dir>/cocobase/config.yaml` when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Overlay `COCOBASE_BASE_URL` / `COCOBASE_API_KEY`
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = Some(base_url);
        }
        if let Some(api_key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = Some(api_key);
        }
        self
    }

    /// Overlay command-line flags
    pub fn apply_overrides(mut self, base_url: Option<String>, api_key: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        if api_key.is_some() {
            self.api_key = api_key;
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));
        config.api_key = self.api_key.clone();
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("no data directory; set session_file")?;
        Ok(data_dir.join("cocobase").join("session.json"))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cocobase").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_parse_yaml() {
        let config = assert_ok!(CliConfig::from_yaml(
            "base_url: http://localhost:8000\napi_key: abc\ntimeout_secs: 5\nsession_file: /tmp/s.json\n",
        ));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(assert_ok!(config.session_path()), PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = assert_ok!(CliConfig::from_yaml("  \n"));
        assert!(config.base_url.is_none());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        assert!(CliConfig::from_yaml("- just\n- a list\n").is_err());
    }

    #[test]
    fn test_precedence_file_env_flags() {
        let config = assert_ok!(CliConfig::from_yaml("base_url: http://file\napi_key: file-key\n"))
            .apply_env(|key| match key {
                ENV_BASE_URL => Some("http://env".to_string()),
                ENV_API_KEY => Some(String::new()),
                _ => None,
            });
        assert_eq!(config.base_url.as_deref(), Some("http://env"));
        assert_eq!(config.api_key.as_deref(), Some("file-key"));

        let config = config.apply_overrides(None, Some("flag-key".to_string()));
        assert_eq!(config.base_url.as_deref(), Some("http://env"));
        assert_eq!(config.api_key.as_deref(), Some("flag-key"));
    }

    #[test]
    fn test_client_config() {
        let config = CliConfig {
            timeout_secs: Some(7),
            api_key: Some("k".to_string()),
            ..CliConfig::default()
        };
        let client_config = config.client_config();
        assert_eq!(client_config.base_url, DEFAULT_BASE_URL);
        assert_eq!(client_config.api_key.as_deref(), Some("k"));
        assert_eq!(client_config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_missing_file_is_error() {
        let path = std::env::temp_dir().join(format!("cocobase-missing-{}.yaml", uuid::Uuid::new_v4()));
        assert!(CliConfig::load(Some(&path)).is_err());
    }
}
