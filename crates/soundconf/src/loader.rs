//! File discovery, layered merging, and environment overrides.

use std::path::{Path, PathBuf};

use crate::{ConfigError, SoundConfig};

/// Where the loaded configuration came from.
#[derive(Debug, Default, Clone)]
pub struct ConfigSources {
    /// Config files that were found and merged, in load order.
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode file values.
    pub env_overrides: Vec<String>,
}

/// Candidate config files in load order (later wins). An explicit path
/// replaces the local `./soundcheck.toml` override.
pub fn discover_config_files(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("/etc/soundcheck/config.toml")];

    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(
            PathBuf::from(home)
                .join(".config")
                .join("soundcheck")
                .join("config.toml"),
        );
    }

    match explicit {
        Some(path) => candidates.push(path.to_path_buf()),
        None => candidates.push(PathBuf::from("./soundcheck.toml")),
    }

    candidates.into_iter().filter(|p| p.is_file()).collect()
}

pub fn load_value(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Overlay wins; tables merge recursively so a later file can set one key
/// without clobbering the rest of the section.
pub fn deep_merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merge all discovered files and deserialize; an empty layer stack yields
/// compiled defaults.
pub fn load_merged(files: &[PathBuf]) -> Result<SoundConfig, ConfigError> {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for path in files {
        deep_merge(&mut merged, load_value(path)?);
    }
    merged.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: PathBuf::from("<merged>"),
        message: e.to_string(),
    })
}

/// Apply environment overrides. `PORT`, `OPENAI_API_KEY`, and `AUTH_MODE`
/// are the deployment surface; `SOUNDCHECK_*` covers the rest.
pub fn apply_env_overrides(
    config: &mut SoundConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_env_pairs(config, sources, std::env::vars())
}

fn apply_env_pairs(
    config: &mut SoundConfig,
    sources: &mut ConfigSources,
    vars: impl Iterator<Item = (String, String)>,
) -> Result<(), ConfigError> {
    for (name, value) in vars {
        match name.as_str() {
            "PORT" => {
                config.server.port = value.parse().map_err(|_| ConfigError::Invalid {
                    name: "PORT",
                    message: format!("{value:?} is not a port number"),
                })?;
            }
            "OPENAI_API_KEY" => config.model.api_key = value,
            "OPENAI_BASE_URL" => config.model.base_url = Some(value),
            "AUTH_MODE" => {
                config.auth.mode = value.parse().map_err(|message| ConfigError::Invalid {
                    name: "AUTH_MODE",
                    message,
                })?;
            }
            "SOUNDCHECK_MODEL" => config.model.model = value,
            "SOUNDCHECK_CLASSIFIER_MODEL" => config.model.classifier_model = value,
            "SOUNDCHECK_TIMEOUT_SECS" => {
                config.model.timeout_secs =
                    value.parse().map_err(|_| ConfigError::Invalid {
                        name: "SOUNDCHECK_TIMEOUT_SECS",
                        message: format!("{value:?} is not a number of seconds"),
                    })?;
            }
            "SOUNDCHECK_LOG_LEVEL" => config.telemetry.log_level = value,
            "SOUNDCHECK_TELEMETRY_DSN" => config.telemetry.dsn = Some(value),
            _ => continue,
        }
        sources.env_overrides.push(name);
    }
    Ok(())
}
