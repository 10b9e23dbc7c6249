use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SEARCH_PATHS: [&str; 2] = ["trainwise.toml", "config/trainwise.toml"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Effective settings: defaults, then the TOML file, then `TRAINWISE_*`
/// variables, then [`ConfigOverrides`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Directory holding the built web client. When set, non-API paths are
    /// served from it with an `index.html` fallback.
    pub static_dir: Option<PathBuf>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Values set by the caller, e.g. from command-line flags. They win over
/// every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("failed to parse `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("config file references unset environment variable `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("config file has a `${{` without a closing `}}`")]
    UnterminatedInterpolation,
    #[error("`{key}` has an invalid value `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://trainwise.db?mode=rwc".to_string(),
            max_connections: 5,
            timeout_secs: 30,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3001,
            static_dir: None,
            graceful_shutdown_secs: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "logging.format `{other}` is not one of compact|pretty|json"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match locate(options.config_path.as_deref()) {
            Some(path) => Self::from_file(&path)?,
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from(SEARCH_PATHS[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => Self::default(),
        };

        config.apply_env()?;
        config.apply_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&expand_env(&raw)?)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        replace(&mut self.database.url, env_value(&["TRAINWISE_DATABASE_URL"])?);
        replace(
            &mut self.database.max_connections,
            env_value(&["TRAINWISE_DATABASE_MAX_CONNECTIONS"])?,
        );
        replace(&mut self.database.timeout_secs, env_value(&["TRAINWISE_DATABASE_TIMEOUT_SECS"])?);

        replace(&mut self.server.bind_address, env_value(&["TRAINWISE_SERVER_BIND_ADDRESS"])?);
        replace(&mut self.server.port, env_value(&["TRAINWISE_SERVER_PORT", "PORT"])?);
        replace(
            &mut self.server.static_dir,
            env_value(&["TRAINWISE_SERVER_STATIC_DIR"])?.map(Some),
        );
        replace(
            &mut self.server.graceful_shutdown_secs,
            env_value(&["TRAINWISE_SERVER_GRACEFUL_SHUTDOWN_SECS"])?,
        );

        replace(
            &mut self.logging.level,
            env_value(&["TRAINWISE_LOGGING_LEVEL", "TRAINWISE_LOG_LEVEL"])?,
        );
        replace(
            &mut self.logging.format,
            env_value(&["TRAINWISE_LOGGING_FORMAT", "TRAINWISE_LOG_FORMAT"])?,
        );
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        replace(&mut self.database.url, overrides.database_url);
        replace(&mut self.logging.level, overrides.log_level);
        replace(&mut self.server.port, overrides.port);
        replace(&mut self.server.static_dir, overrides.static_dir.map(Some));
    }

    /// Rejects the first setting that cannot work, naming its dotted key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        let level = self.logging.level.trim().to_ascii_lowercase();
        let problems = [
            (
                !(url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:"),
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...` or `:memory:`)",
            ),
            (self.database.max_connections == 0, "database.max_connections must be at least 1"),
            (
                !(1..=300).contains(&self.database.timeout_secs),
                "database.timeout_secs must be between 1 and 300",
            ),
            (self.server.port == 0, "server.port must be at least 1"),
            (self.server.bind_address.trim().is_empty(), "server.bind_address is empty"),
            (
                self.server.graceful_shutdown_secs == 0,
                "server.graceful_shutdown_secs must be at least 1",
            ),
            (
                !LOG_LEVELS.contains(&level.as_str()),
                "logging.level must be one of trace|debug|info|warn|error",
            ),
        ];

        match problems.into_iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Validation(message.to_string())),
            None => Ok(()),
        }
    }
}

fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => SEARCH_PATHS.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// First non-blank variable among `keys`, parsed as `T`.
fn env_value<T: FromStr>(keys: &[&str]) -> Result<Option<T>, ConfigError> {
    let found = keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    });
    let Some((key, value)) = found else {
        return Ok(None);
    };

    value.trim().parse().map(Some).map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value,
    })
}

/// Substitutes `${VAR}` from the environment. Lines that are TOML comments
/// are copied untouched.
fn expand_env(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut rest = line;
        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let tail = &rest[start + 2..];
            let end = tail.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
            let var = &tail[..end];
            let value = env::var(var)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
            output.push_str(&value);
            rest = &tail[end + 1..];
        }
        output.push_str(rest);
    }

    Ok(output)
}
