use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::info;

/// Environment variable naming the configuration file, checked when no
/// `--config` flag is given.
pub const CONFIG_ENV_VAR: &str = "SEASHELL_CONFIG";

/// Prefix for configuration overrides taken from the process environment,
/// e.g. `SEASHELL__DATABASE__NAME`.
const ENV_PREFIX: &str = "SEASHELL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Read(#[from] config_rs::ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub scripting: ScriptingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Server URL without a database name, e.g. `postgres://localhost:5432`,
    /// or `sqlite://<directory>` for file-backed databases.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Target database name. Optional here; commands that need an
    /// environment decide what to do when it is absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// When false, a named database that does not exist degrades to a
    /// no-environment session instead of failing.
    #[serde(default = "default_must_exist")]
    pub must_exist: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            name: None,
            pool_size: default_pool_size(),
            must_exist: default_must_exist(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracingConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Log destination. Defaults to stderr so that script output on stdout
    /// stays free of log lines.
    #[serde(default)]
    pub logfile: Option<PathBuf>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScriptingConfig {
    /// Base directory for `import` resolution in scripts.
    #[serde(default)]
    pub modules_path: Option<PathBuf>,
}

/// Values supplied on the command line, merged on top of the file and
/// environment sources during [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub database: Option<String>,
    pub log_level: Option<LogLevel>,
    pub logfile: Option<PathBuf>,
    pub modules_path: Option<PathBuf>,
}

/// Resolve the effective configuration for one invocation.
///
/// Precedence, highest first: explicit overrides (CLI flags), process
/// environment (`SEASHELL__*`), configuration file, built-in defaults.
///
/// The builder starts from built-in defaults on every call, so nothing
/// carries over from a previous resolution in the same process. In
/// particular a database name resolved in an earlier invocation is never
/// inherited by a later one that did not ask for a database.
pub fn resolve(overrides: &Overrides) -> Result<Config, ConfigError> {
    let mut builder = config_rs::Config::builder()
        .set_default("database.url", default_database_url())?
        .set_default("database.pool_size", i64::from(default_pool_size()))?
        .set_default("database.must_exist", default_must_exist())?
        .set_default("tracing.log_level", LogLevel::default().to_string())?;

    if let Some(path) = &overrides.config {
        builder = builder.add_source(config_rs::File::from(path.as_path()).required(true));
    } else if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        builder = builder.add_source(config_rs::File::with_name(&path).required(true));
    }

    builder = builder
        .add_source(config_rs::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .set_override_option("database.name", overrides.database.clone())?
        .set_override_option(
            "tracing.log_level",
            overrides.log_level.map(|level| level.to_string()),
        )?
        .set_override_option(
            "tracing.logfile",
            overrides.logfile.as_ref().map(path_to_string),
        )?
        .set_override_option(
            "scripting.modules_path",
            overrides.modules_path.as_ref().map(path_to_string),
        )?;

    Ok(builder.build()?.try_deserialize()?)
}

/// Log the effective configuration. Called once tracing is up, so the
/// report lands in the log channel and never on stdout.
pub fn report(config: &Config) {
    info!(
        "configuration: database={} url={} log_level={}",
        config.database.name.as_deref().unwrap_or("<none>"),
        config.database.url,
        config.tracing.log_level,
    );
}

fn path_to_string(path: &PathBuf) -> String {
    path.display().to_string()
}

fn default_database_url() -> String {
    "postgres://localhost:5432".to_string()
}

const fn default_pool_size() -> u32 {
    5
}

const fn default_must_exist() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("seashell.toml");
        let mut file = std::fs::File::create(&path).expect("create config file");
        file.write_all(content.as_bytes()).expect("write config file");
        (dir, path)
    }

    #[test]
    fn defaults_without_sources() {
        let config = resolve(&Overrides::default()).expect("resolve defaults");
        assert_eq!(config.database.url, "postgres://localhost:5432");
        assert_eq!(config.database.name, None);
        assert_eq!(config.database.pool_size, 5);
        assert!(config.database.must_exist);
        assert_eq!(config.tracing.log_level, LogLevel::Info);
        assert!(config.tracing.logfile.is_none());
        assert!(config.scripting.modules_path.is_none());
    }

    #[test]
    fn file_values_apply() {
        let (_dir, path) = write_config(
            "[database]\n\
             url = \"sqlite:///tmp/dbs\"\n\
             name = \"filedb\"\n\
             must_exist = false\n\
             \n\
             [tracing]\n\
             log_level = \"warn\"\n",
        );
        let overrides = Overrides {
            config: Some(path),
            ..Overrides::default()
        };
        let config = resolve(&overrides).expect("resolve from file");
        assert_eq!(config.database.url, "sqlite:///tmp/dbs");
        assert_eq!(config.database.name.as_deref(), Some("filedb"));
        assert!(!config.database.must_exist);
        assert_eq!(config.tracing.log_level, LogLevel::Warn);
    }

    #[test]
    fn explicit_values_take_precedence_over_file() {
        let (_dir, path) = write_config(
            "[database]\nname = \"filedb\"\n\n[tracing]\nlog_level = \"warn\"\n",
        );
        let overrides = Overrides {
            config: Some(path),
            database: Some("flagdb".to_string()),
            log_level: Some(LogLevel::Debug),
            ..Overrides::default()
        };
        let config = resolve(&overrides).expect("resolve with overrides");
        assert_eq!(config.database.name.as_deref(), Some("flagdb"));
        assert_eq!(config.tracing.log_level, LogLevel::Debug);
    }

    #[test]
    fn second_resolution_does_not_inherit_database() {
        // A process that resolved a database earlier must not leak it into
        // a later resolution that did not ask for one.
        let overrides = Overrides {
            database: Some("firstdb".to_string()),
            ..Overrides::default()
        };
        let first = resolve(&overrides).expect("first resolution");
        assert_eq!(first.database.name.as_deref(), Some("firstdb"));

        let second = resolve(&Overrides::default()).expect("second resolution");
        assert_eq!(second.database.name, None);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let overrides = Overrides {
            config: Some(PathBuf::from("/nonexistent/seashell.toml")),
            ..Overrides::default()
        };
        assert!(resolve(&overrides).is_err());
    }

    #[test]
    fn log_level_round_trips_through_strings() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let parsed: LogLevel = level.parse().expect("parse log level");
            assert_eq!(parsed.to_string(), level);
        }
        assert!("verbose".parse::<LogLevel>().is_err());
    }
}
