use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::dirs;
use super::env_var::EnvVars;
use super::output::OutputFormat;

/// Top-level configuration for yx.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// API endpoint and authentication settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Defaults applied when flags are omitted.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Polling settings for `--watch`.
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// OpenAPI base URL (default: "https://openapi-rdc.aliyuncs.com").
    #[serde(default = "default_base_url")]
    #[schemars(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the personal access token
    /// (default: "YUNXIAO_TOKEN").
    #[serde(default = "default_token_env")]
    #[schemars(default = "default_token_env")]
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Organization ID used when `--org` is omitted.
    #[serde(default)]
    pub organization_id: Option<String>,

    /// Repository ID or path used when `--repo` is omitted.
    #[serde(default)]
    pub repository_id: Option<String>,

    /// Output format when `--format` is omitted.
    #[serde(default)]
    pub output: OutputFormat,

    /// Maximum number of changed files listed by `pr diff`/`pr files`.
    #[serde(default = "default_file_limit")]
    #[schemars(default = "default_file_limit")]
    pub file_limit: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            organization_id: None,
            repository_id: None,
            output: OutputFormat::default(),
            file_limit: default_file_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Milliseconds between polls (default: 5000).
    #[serde(default = "default_interval_ms")]
    #[schemars(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Give up waiting after this many milliseconds (default: 600000).
    #[serde(default = "default_timeout_ms")]
    #[schemars(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://openapi-rdc.aliyuncs.com".to_string()
}

fn default_token_env() -> String {
    EnvVars::default_token_name().to_string()
}

fn default_file_limit() -> usize {
    200
}

fn default_interval_ms() -> u64 {
    5_000
}

fn default_timeout_ms() -> u64 {
    600_000
}

impl Config {
    /// Apply environment overrides on top of file values.
    pub fn with_env(mut self, env: &EnvVars) -> Self {
        if let Some(url) = &env.api_base_url {
            self.api.base_url = url.clone();
        }
        if env.organization_id.is_some() {
            self.defaults.organization_id = env.organization_id.clone();
        }
        if env.repository_id.is_some() {
            self.defaults.repository_id = env.repository_id.clone();
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file (permission error, etc.)
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parse error
    #[error("Invalid config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Directory holding config.ya?ml, if one can be determined.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("yx"))
}

/// Load configuration from ~/.config/yx/config.ya?ml.
/// Returns Config::default() if no config file exists.
pub fn load_config() -> anyhow::Result<Config> {
    let Some(dir) = config_dir() else {
        return Ok(Config::default());
    };
    load_config_from_dir(&dir)
}

/// Load configuration from a specific directory.
/// Searches for config.yaml, then config.yml in the given directory.
pub fn load_config_from_dir(dir: &Path) -> anyhow::Result<Config> {
    for filename in &["config.yaml", "config.yml"] {
        let path = dir.join(filename);
        match std::fs::read_to_string(&path) {
            Ok(content) => return parse_config(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(ConfigError::ReadError { path, source: e }.into()),
        }
    }

    Ok(Config::default())
}

fn parse_config(content: &str, path: &Path) -> anyhow::Result<Config> {
    serde_yaml::from_str(content)
        .map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
        .map_err(Into::into)
}

/// Generate JSON Schema for the Config struct.
pub fn generate_schema() -> schemars::Schema {
    schemars::schema_for!(Config)
}
