//! Application settings.
//!
//! `Settings::load()` reads `config/config.toml` when present and then
//! environment variables prefixed with `HATCHLING` (sections separated by a
//! double underscore, e.g. `HATCHLING_DATABASE__URI`). Every key has a default,
//! so an empty environment yields a working in-memory setup.

use crate::error::HatchError;
use crate::query::Dialect;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "HATCHLING";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_uri")]
    pub uri: String,
    /// Name of the module holding the models
    #[serde(default = "default_app")]
    pub app: String,
    /// Create missing tables on `Database::init`
    #[serde(default)]
    pub generate_schemas: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_pool_timeout_seconds")]
    pub pool_timeout_seconds: u64,
}

fn default_db_uri() -> String {
    "sqlite://:memory:".to_string()
}

fn default_app() -> String {
    "models".to_string()
}

fn default_max_connections() -> usize {
    10
}

fn default_pool_timeout_seconds() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_db_uri(),
            app: default_app(),
            generate_schemas: false,
            max_connections: default_max_connections(),
            pool_timeout_seconds: default_pool_timeout_seconds(),
        }
    }
}

impl DatabaseConfig {
    /// SQL dialect implied by the URI scheme
    pub fn dialect(&self) -> Result<Dialect, HatchError> {
        Dialect::from_uri(&self.uri)
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Worker threads of the coroutine scheduler
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_addr() -> String {
    "127.0.0.1:5050".to_string()
}

fn default_workers() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    /// Load from `config/config.toml` and the environment
    ///
    /// A config file that exists but cannot be read is reported and ignored;
    /// the environment alone is used instead.
    pub fn load() -> Result<Self, HatchError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Same as [`load`](Self::load) with an explicit file path
    pub fn load_from(path: &Path) -> Result<Self, HatchError> {
        let with_file = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env_source())
            .build();

        let settings = match with_file {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "failed to load {}, falling back to env: {err}",
                        path.display()
                    );
                }
                Config::builder()
                    .add_source(env_source())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "failed to load configuration from file ({err}) and env ({env_err})"
                        ))
                    })?
            }
        };

        Ok(settings.try_deserialize::<Settings>()?)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.database.uri, "sqlite://:memory:");
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.database.pool_timeout(), Duration::from_secs(30));
        assert_eq!(settings.database.dialect().unwrap(), Dialect::Sqlite);
        assert_eq!(settings.server.addr, "127.0.0.1:5050");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[database]\nuri = \"postgres://localhost/blog\"\nmax_connections = 3\n\n[server]\nworkers = 2"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.database.dialect().unwrap(), Dialect::Postgres);
        assert_eq!(settings.database.max_connections, 3);
        assert_eq!(settings.database.app, "models");
        assert_eq!(settings.server.workers, 2);
        assert_eq!(settings.server.addr, "127.0.0.1:5050");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.database.app, "models");
    }
}
