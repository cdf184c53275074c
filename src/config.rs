use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::backend::ResponseAdapter;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backends: BackendsConfig,
  #[serde(default)]
  pub transport: TransportConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub messages: MessagesConfig,
}

/// The API instances the console talks to.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendsConfig {
  pub default: BackendConfig,
  pub legacy: BackendConfig,
  pub alternate: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  pub url: Url,
  /// Response envelope handling; each backend has its own default
  pub envelope: Option<ResponseAdapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
  /// Whole-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for TransportConfig {
  fn default() -> Self {
    Self {
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long an entry without subscribers is kept before eviction.
  /// Zero evicts as soon as the last subscriber leaves.
  #[serde(default = "default_gc_time_secs")]
  pub gc_time_secs: u64,
}

impl CacheConfig {
  pub fn gc_time(&self) -> Duration {
    Duration::from_secs(self.gc_time_secs)
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      gc_time_secs: default_gc_time_secs(),
    }
  }
}

fn default_gc_time_secs() -> u64 {
  5 * 60
}

/// User-facing texts produced by the data layer itself.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesConfig {
  /// Shown instead of the server message when a write hits HTTP 409
  #[serde(default = "default_conflict_message")]
  pub conflict: String,
}

impl Default for MessagesConfig {
  fn default() -> Self {
    Self {
      conflict: default_conflict_message(),
    }
  }
}

fn default_conflict_message() -> String {
  "This record was changed by someone else. Reload and try again.".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./console-query.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/console-query/config.yaml
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/console-query/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("console-query.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("console-query").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const MINIMAL: &str = r#"
backends:
  default:
    url: http://localhost:3001/
  legacy:
    url: http://localhost:8080/
  alternate:
    url: http://localhost:8085/
"#;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::from_yaml(MINIMAL).unwrap();
    assert_eq!(config.backends.legacy.url.as_str(), "http://localhost:8080/");
    assert!(config.backends.legacy.envelope.is_none());
    assert_eq!(config.transport.timeout_secs, 30);
    assert_eq!(config.cache.gc_time(), Duration::from_secs(300));
    assert!(config.messages.conflict.contains("changed by someone else"));
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
backends:
  default:
    url: http://localhost:3001/
    envelope: passthrough
  legacy:
    url: http://localhost:8080/
    envelope: response
  alternate:
    url: http://localhost:8085/
    envelope: response-if-present
transport:
  timeout_secs: 5
cache:
  gc_time_secs: 0
messages:
  conflict: Already exists
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(
      config.backends.default.envelope,
      Some(ResponseAdapter::Passthrough)
    );
    assert_eq!(
      config.backends.legacy.envelope,
      Some(ResponseAdapter::UnwrapResponse)
    );
    assert_eq!(
      config.backends.alternate.envelope,
      Some(ResponseAdapter::UnwrapResponseIfPresent)
    );
    assert_eq!(config.transport.timeout_secs, 5);
    assert_eq!(config.cache.gc_time(), Duration::ZERO);
    assert_eq!(config.messages.conflict, "Already exists");
  }

  #[test]
  fn test_missing_backend_is_error() {
    let yaml = "backends:\n  default:\n    url: http://localhost:3001/\n";
    assert!(Config::from_yaml(yaml).is_err());
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.backends.alternate.url.as_str(), "http://localhost:8085/");
  }

  #[test]
  fn test_load_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/console-query.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_example_config_parses() {
    let config = Config::from_yaml(include_str!("../config.example.yaml")).unwrap();
    assert_eq!(config.backends.legacy.url.as_str(), "http://localhost:8080/");
    assert_eq!(config.messages.conflict, default_conflict_message());
  }
}
