use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::todo::BackendVariant;

/// Environment variable replacing `api.url`
pub const API_URL_ENV: &str = "TODO_SYNC_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the tasks API
  #[serde(default = "default_url")]
  pub url: String,
  /// How completion changes are sent: generic or state_machine
  #[serde(default)]
  pub backend: BackendVariant,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      backend: BackendVariant::default(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when RUST_LOG is unset
  #[serde(default = "default_level")]
  pub level: String,
  /// Also write a daily log file
  #[serde(default)]
  pub file: bool,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      file: false,
    }
  }
}

fn default_url() -> String {
  "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./todo-sync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/todo-sync/config.yaml
  ///
  /// Without a file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.apply_env(std::env::var(API_URL_ENV).ok());
    config.validate()?;
    Ok(config)
  }

  /// Reject values that would make every request fail.
  pub fn validate(&self) -> Result<()> {
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be at least 1"));
    }
    Ok(())
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("todo-sync.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("todo-sync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  fn apply_env(&mut self, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
      self.api.url = url;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.url, "http://localhost:8080");
    assert_eq!(config.api.backend, BackendVariant::Generic);
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.log.level, "info");
    assert!(!config.log.file);
  }

  #[test]
  fn test_parse_full() {
    let config = Config::parse(
      "api:\n  url: https://tasks.example.com/v1\n  backend: state_machine\n  timeout_secs: 5\nlog:\n  level: debug\n  file: true\n",
    )
    .unwrap();

    assert_eq!(config.api.url, "https://tasks.example.com/v1");
    assert_eq!(config.api.backend, BackendVariant::StateMachine);
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.log.level, "debug");
    assert!(config.log.file);
  }

  #[test]
  fn test_parse_partial_fills_defaults() {
    let config = Config::parse("api:\n  backend: state_machine\n").unwrap();
    assert_eq!(config.api.url, "http://localhost:8080");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.log.level, "info");

    assert_eq!(Config::parse("").unwrap().api.url, "http://localhost:8080");
  }

  #[test]
  fn test_parse_rejects_unknown_backend() {
    assert!(Config::parse("api:\n  backend: graphql\n").is_err());
  }

  #[test]
  fn test_zero_timeout_is_rejected() {
    let config = Config::parse("api:\n  timeout_secs: 0\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));

    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn test_env_overrides_url() {
    let mut config = Config::default();
    config.apply_env(Some("http://10.0.0.2:3000".into()));
    assert_eq!(config.api.url, "http://10.0.0.2:3000");

    config.apply_env(Some("  ".into()));
    config.apply_env(None);
    assert_eq!(config.api.url, "http://10.0.0.2:3000");
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let err = Config::load(Some(Path::new("/nonexistent/todo-sync.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
