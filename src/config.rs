//! Client configuration.
//!
//! Layered as defaults, then `<config_dir>/analysis-form/config.toml`, then
//! environment variables:
//!
//! ```bash
//! ANALYSIS_API_URL=http://10.0.0.4:5000 ANALYSIS_TIMEOUT_SECS=120 analysis-form
//! ```

use crate::submit::FlightPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const APP_DIR: &str = "analysis-form";
const CONFIG_FILENAME: &str = "config.toml";

pub const ENV_BASE_URL: &str = "ANALYSIS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "ANALYSIS_TIMEOUT_SECS";
pub const ENV_FLIGHT_POLICY: &str = "ANALYSIS_FLIGHT_POLICY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` means no timeout.
    pub timeout: Option<Duration>,
    pub flight_policy: FlightPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            flight_policy: FlightPolicy::default(),
        }
    }
}

/// On-disk shape; every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    flight_policy: Option<FlightPolicy>,
}

impl ClientConfig {
    /// Load from the user config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = default_config_path();
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from an optional file plus an environment lookup.
    ///
    /// A missing file is treated as empty.
    pub fn from_sources<F>(file: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = file {
            if let Some(parsed) = read_file(path)? {
                config.apply_file(parsed)?;
            }
        }

        if let Some(url) = env(ENV_BASE_URL) {
            config.base_url = non_empty_url(ENV_BASE_URL, url)?;
        }
        if let Some(raw) = env(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.timeout = Some(timeout_from_secs(ENV_TIMEOUT_SECS, secs)?);
        }
        if let Some(raw) = env(ENV_FLIGHT_POLICY) {
            config.flight_policy = raw.parse().map_err(|_| ConfigError::Invalid {
                key: ENV_FLIGHT_POLICY,
                value: raw.clone(),
            })?;
        }

        tracing::debug!(?config, "client config resolved");
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(url) = file.base_url {
            self.base_url = non_empty_url("base_url", url)?;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Some(timeout_from_secs("timeout_secs", secs)?);
        }
        if let Some(policy) = file.flight_policy {
            self.flight_policy = policy;
        }
        Ok(())
    }
}

/// `<config_dir>/analysis-form/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

fn read_file(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn non_empty_url(key: &'static str, url: String) -> Result<String, ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::Invalid { key, value: url });
    }
    Ok(url.trim().to_string())
}

fn timeout_from_secs(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = ClientConfig::from_sources(None, env_of(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.timeout.is_none());
        assert_eq!(config.flight_policy, FlightPolicy::Reject);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        let config = ClientConfig::from_sources(Some(&path), env_of(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn file_values_are_applied() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
base_url = "http://analysis.internal:8080"
timeout_secs = 30
flight_policy = "replace"
"#,
        );
        let config = ClientConfig::from_sources(Some(&path), env_of(&[])).unwrap();
        assert_eq!(config.base_url, "http://analysis.internal:8080");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.flight_policy, FlightPolicy::Replace);
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "base_url = \"http://from-file\"\ntimeout_secs = 30\n");
        let env = env_of(&[
            (ENV_BASE_URL, "http://from-env"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_FLIGHT_POLICY, "Replace"),
        ]);
        let config = ClientConfig::from_sources(Some(&path), env).unwrap();
        assert_eq!(config.base_url, "http://from-env");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.flight_policy, FlightPolicy::Replace);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientConfig::from_sources(None, env_of(&[(ENV_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_TIMEOUT_SECS, .. }));
    }

    #[test]
    fn garbage_env_values_are_rejected() {
        let err =
            ClientConfig::from_sources(None, env_of(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err =
            ClientConfig::from_sources(None, env_of(&[(ENV_FLIGHT_POLICY, "queue")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_FLIGHT_POLICY, .. }));

        let err = ClientConfig::from_sources(None, env_of(&[(ENV_BASE_URL, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_BASE_URL, .. }));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "bank_names = [\"JP Morgan\"]\n");
        let err = ClientConfig::from_sources(Some(&path), env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
