//! Configuration discovery and loading.
//!
//! Layers, lowest precedence first:
//! built-in defaults, TOML file, `ADDRESS_WS_*` environment, CLI overrides.

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment variable the service reads.
pub const ENV_PREFIX: &str = "ADDRESS_WS_";

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "ADDRESS_WS_CONFIG";

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "address-ws.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),

    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A configuration file and whether its absence is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub required: bool,
}

/// Everything the loader reads from, gathered up front so loading stays pure.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Optional TOML file.
    pub file: Option<ConfigFile>,
    /// `ADDRESS_WS_*` environment variables, verbatim.
    pub env: Vec<(String, String)>,
    /// Dotted `key=value` overrides, applied in order.
    pub overrides: Vec<(String, String)>,
}

impl ConfigSources {
    /// Work out the file to read and keep the prefixed environment variables.
    ///
    /// An explicit path wins over `ADDRESS_WS_CONFIG`; both must exist.
    /// Otherwise `address-ws.toml` is read if present.
    pub fn discover<I>(explicit: Option<PathBuf>, env: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env_path = None;
        let mut vars = Vec::new();
        for (name, value) in env {
            if name == CONFIG_PATH_ENV {
                env_path = Some(PathBuf::from(value));
            } else if name.starts_with(ENV_PREFIX) {
                vars.push((name, value));
            }
        }
        vars.sort();

        let file = match explicit.or(env_path) {
            Some(path) => ConfigFile {
                path,
                required: true,
            },
            None => ConfigFile {
                path: PathBuf::from(DEFAULT_CONFIG_FILE),
                required: false,
            },
        };

        Self {
            file: Some(file),
            env: vars,
            overrides: Vec::new(),
        }
    }

    /// Append CLI overrides.
    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.overrides.extend(overrides);
        self
    }
}

/// What the loader did, for logging once a subscriber exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// File that was actually read.
    pub file: Option<PathBuf>,
    /// Environment variables with the service prefix that map to no key.
    pub ignored_env: Vec<String>,
}

/// Load, layer and validate configuration.
pub fn load(sources: &ConfigSources) -> Result<AppConfig, ConfigError> {
    load_with_report(sources).map(|(config, _)| config)
}

/// Same as [`load`], also returning a [`LoadReport`].
pub fn load_with_report(sources: &ConfigSources) -> Result<(AppConfig, LoadReport), ConfigError> {
    let mut report = LoadReport::default();

    let mut config = match &sources.file {
        Some(file) => match read_file(&file.path) {
            Ok(config) => {
                report.file = Some(file.path.clone());
                config
            }
            Err(ConfigError::Io { source, .. })
                if !file.required && source.kind() == io::ErrorKind::NotFound =>
            {
                AppConfig::default()
            }
            Err(e) => return Err(e),
        },
        None => AppConfig::default(),
    };

    for (name, value) in &sources.env {
        let key = env_key(name);
        match apply_property(&mut config, &key, value) {
            Ok(()) => {}
            Err(ConfigError::UnknownKey(_)) => report.ignored_env.push(name.clone()),
            Err(e) => return Err(e),
        }
    }

    for (key, value) in &sources.overrides {
        apply_property(&mut config, key, value)?;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok((config, report))
}

/// Load and validate configuration from a single TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `ADDRESS_WS_SERVER__BIND_ADDRESS` → `server.bind_address`.
fn env_key(name: &str) -> String {
    name.trim_start_matches(ENV_PREFIX)
        .to_ascii_lowercase()
        .replace("__", ".")
}

/// Set a single dotted key on `config`.
pub fn apply_property(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "application.name" => config.application.name = value.to_string(),
        "application.environment" => config.application.environment = value.to_string(),
        "server.bind_address" => config.server.bind_address = value.to_string(),
        "server.max_concurrent_requests" => {
            config.server.max_concurrent_requests = parse_value(key, value)?
        }
        "server.request_timeout_secs" => {
            config.server.request_timeout_secs = parse_value(key, value)?
        }
        "server.max_body_bytes" => config.server.max_body_bytes = parse_value(key, value)?,
        "server.shutdown_grace_secs" => {
            config.server.shutdown_grace_secs = parse_value(key, value)?
        }
        "observability.log_level" => config.observability.log_level = value.to_string(),
        "observability.log_format" => {
            config.observability.log_format = parse_value(key, value)?
        }
        "observability.metrics_enabled" => {
            config.observability.metrics_enabled = parse_value(key, value)?
        }
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
