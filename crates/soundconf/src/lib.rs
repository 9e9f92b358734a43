//! Minimal configuration loading for Soundcheck.
//!
//! No database, no disk state: configuration is the only thing read from
//! the filesystem, and every value can also arrive through the environment,
//! which is how deployments usually set the port and API key.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/soundcheck/config.toml` (system)
//! 2. `~/.config/soundcheck/config.toml` (user)
//! 3. `./soundcheck.toml` (local override, or the explicit `--config` path)
//! 4. Environment variables (`PORT`, `OPENAI_API_KEY`, `AUTH_MODE`,
//!    `SOUNDCHECK_*`)
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! port = 8090
//!
//! [auth]
//! mode = "gateway"
//!
//! [model]
//! model = "gpt-4o"
//! classifier_model = "gpt-4o-mini"
//! timeout_secs = 120
//!
//! [telemetry]
//! log_level = "info"
//! ```

mod loader;

pub use loader::ConfigSources;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Accept everything.
    #[default]
    None,
    /// Trust gateway-injected identity headers (`X-User-ID`, ...).
    Gateway,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(AuthMode::None),
            "gateway" => Ok(AuthMode::Gateway),
            other => Err(format!("unknown auth mode {other:?} (none|gateway)")),
        }
    }
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Gateway => "gateway",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: 8090 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider API key; normally injected via `OPENAI_API_KEY`.
    pub api_key: String,
    /// Base URL override for OpenAI-compatible providers.
    pub base_url: Option<String>,
    /// Model for the generators.
    pub model: String,
    /// Small, cheap model for routing classification.
    pub classifier_model: String,
    /// Per-generator deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o".to_string(),
            classifier_model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Optional telemetry DSN; unused unless an exporter is wired up.
    pub dsn: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            log_level: "info".to_string(),
            dsn: None,
        }
    }
}

/// Complete Soundcheck configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub model: ModelConfig,
    pub telemetry: TelemetryConfig,
}

impl SoundConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from an optional explicit path and report where
    /// values came from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        sources.files = loader::discover_config_files(config_path);

        let mut config = loader::load_merged(&sources.files)?;
        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize to TOML for `--show-config`. The API key is redacted.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Soundcheck Configuration\n\n");

        output.push_str("[server]\n");
        output.push_str(&format!("port = {}\n", self.server.port));

        output.push_str("\n[auth]\n");
        output.push_str(&format!("mode = \"{}\"\n", self.auth.mode.as_str()));

        output.push_str("\n[model]\n");
        let key = if self.model.api_key.is_empty() {
            "(unset)"
        } else {
            "(redacted)"
        };
        output.push_str(&format!("api_key = \"{}\"\n", key));
        if let Some(base_url) = &self.model.base_url {
            output.push_str(&format!("base_url = \"{}\"\n", base_url));
        }
        output.push_str(&format!("model = \"{}\"\n", self.model.model));
        output.push_str(&format!(
            "classifier_model = \"{}\"\n",
            self.model.classifier_model
        ));
        output.push_str(&format!("timeout_secs = {}\n", self.model.timeout_secs));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));
        if let Some(dsn) = &self.telemetry.dsn {
            output.push_str(&format!("dsn = \"{}\"\n", dsn));
        }

        output
    }
}
