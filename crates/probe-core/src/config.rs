//! Configuration for the probe harness.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COMMAND_PREFIX: &str = "::";
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub session: SessionConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub assertions: AssertionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProbeConfig {
    /// Config with defaults everywhere except the target fragment.
    pub fn for_target(name: impl Into<String>) -> Self {
        Self {
            session: SessionConfig::default(),
            target: TargetConfig { name: name.into() },
            commands: CommandsConfig::default(),
            timeouts: TimeoutsConfig::default(),
            assertions: AssertionsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Credential handed to the transport; opaque to the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Fragment matched case-insensitively against guild member names.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Window shared by every wait primitive.
    #[serde(default = "default_response_secs")]
    pub response_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            response_secs: default_response_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_secs)
    }
}

fn default_response_secs() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionsConfig {
    /// Case-insensitive substrings that mark a target reply as an error report.
    #[serde(default = "default_error_markers")]
    pub error_markers: Vec<String>,
}

impl Default for AssertionsConfig {
    fn default() -> Self {
        Self {
            error_markers: default_error_markers(),
        }
    }
}

fn default_error_markers() -> Vec<String> {
    vec!["error".to_string(), "exception".to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn parse_probe_config(contents: &str) -> Result<ProbeConfig, toml::de::Error> {
    toml::from_str(contents)
}

pub fn load_probe_config(path: impl AsRef<Path>) -> Result<ProbeConfig, ConfigError> {
    let path_ref = path.as_ref();
    let body = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    parse_probe_config(&body).map_err(|source| ConfigError::Parse {
        path: path_ref.to_path_buf(),
        source,
    })
}
