use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::client::DEFAULT_BASE_URL;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn save_api_base_url(url: &str) -> Result<()> {
        Self::save_api_base_url_to(&Self::get_config_path()?, url)
    }

    /// Update only the service URL. An unreadable file is kept next to the
    /// new one as `config.json.bak` before it is replaced.
    pub fn save_api_base_url_to(config_path: &Path, url: &str) -> Result<()> {
        let mut config = match Self::load_from(config_path) {
            Ok(config) => config,
            Err(err) => {
                let backup = config_path.with_extension("json.bak");
                tracing::warn!(
                    path = %config_path.display(),
                    backup = %backup.display(),
                    error = %err,
                    "Replacing unreadable config file"
                );
                fs::copy(config_path, &backup)?;
                Self::new()
            }
        };
        config.api_base_url = Some(url.to_string());
        config.save_to(config_path)
    }

    /// Base URL to use, with an optional override (e.g. from the command line)
    pub fn resolve_base_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("brafit").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_base_url: Some("http://fitting.local:9000".to_string()),
            log_level: Some("debug".to_string()),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_url_keeps_other_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config {
            api_base_url: None,
            log_level: Some("debug".to_string()),
        }
        .save_to(&path)
        .unwrap();

        Config::save_api_base_url_to(&path, "http://fitting.local:9000").unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.api_base_url.as_deref(), Some("http://fitting.local:9000"));
        assert_eq!(saved.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_save_url_over_malformed_file_keeps_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"log_level\": \"debug\", }").unwrap();

        Config::save_api_base_url_to(&path, "http://fitting.local:9000").unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.api_base_url.as_deref(), Some("http://fitting.local:9000"));
        assert_eq!(
            fs::read_to_string(dir.path().join("config.json.bak")).unwrap(),
            "{ \"log_level\": \"debug\", }"
        );
    }

    #[test]
    fn test_base_url_precedence() {
        let config = Config {
            api_base_url: Some("http://from-config:1".to_string()),
            log_level: None,
        };
        assert_eq!(config.resolve_base_url(Some("http://cli:2")), "http://cli:2");
        assert_eq!(config.resolve_base_url(None), "http://from-config:1");
        assert_eq!(Config::new().resolve_base_url(None), DEFAULT_BASE_URL);
    }
}
