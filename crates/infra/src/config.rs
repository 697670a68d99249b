//! Configuration loading and representation.
//!
//! Settings come from a Java-style properties file (`KEY=value` lines, parsed as
//! top-level INI keys) and may be overridden by `STOREFRONT_*` environment
//! variables. Keys are case-insensitive.
//!
//! | Key                  | Required | Default |
//! |----------------------|----------|---------|
//! | `DB_URL`             | yes      |         |
//! | `DB_USER`            | yes      |         |
//! | `DB_PASSWORD`        | yes      |         |
//! | `QUERY_TIMEOUT_SECS` | no       | `5`     |
//! | `MAX_CONNECTIONS`    | no       | `1`     |
//! | `LOG_FORMAT`         | no       | `text`  |

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, FileSourceFile, Map, Source, Value};
use serde::Deserialize;
use thiserror::Error;

use storefront_observability::LogFormat;

/// Default configuration file, looked up relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.properties";

const ENV_PREFIX: &str = "STOREFRONT";
const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 5;
const DEFAULT_MAX_CONNECTIONS: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for the catalog backend.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    /// Upper bound for every backend call (connection acquisition included).
    pub query_timeout: Duration,
    pub max_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("query_timeout", &self.query_timeout)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Process configuration, built once in `main` and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    db_url: String,
    db_user: String,
    db_password: String,
    query_timeout_secs: u64,
    max_connections: u32,
    log_format: LogFormat,
}

/// The properties file with its keys folded to lowercase.
///
/// The INI reader keeps `DB_URL` as written while defaults and the
/// environment source use `db_url`; every source has to agree on one spelling.
#[derive(Debug, Clone)]
struct PropertiesFile(File<FileSourceFile, FileFormat>);

impl PropertiesFile {
    fn new(path: &Path) -> Self {
        Self(File::new(&path.to_string_lossy(), FileFormat::Ini).required(true))
    }
}

impl Source for PropertiesFile {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
        Ok(self
            .0
            .collect()?
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect())
    }
}

impl AppConfig {
    /// Load configuration from a properties file plus environment overrides.
    ///
    /// A missing or unreadable file is an error; callers treat it as fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path.as_ref(), None)
    }

    /// Like [`AppConfig::load`], reading overrides from `env` instead of the
    /// process environment when given.
    fn load_with_env(
        path: &Path,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let load_err = |source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        };

        let settings = Config::builder()
            .set_default("query_timeout_secs", i64::from(DEFAULT_QUERY_TIMEOUT_SECS))
            .and_then(|b| b.set_default("max_connections", i64::from(DEFAULT_MAX_CONNECTIONS)))
            .and_then(|b| b.set_default("log_format", "text"))
            .map_err(load_err)?
            .add_source(PropertiesFile::new(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()
            .map_err(load_err)?;

        let raw: RawSettings = settings.try_deserialize().map_err(load_err)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let url = raw.db_url.trim().to_string();
        if url.is_empty() {
            return Err(ConfigError::Invalid("DB_URL must not be empty".to_string()));
        }
        if raw.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "QUERY_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if raw.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database: DatabaseConfig {
                url,
                user: raw.db_user,
                password: raw.db_password,
                query_timeout: Duration::from_secs(raw.query_timeout_secs),
                max_connections: raw.max_connections,
            },
            log_format: raw.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_properties(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".properties")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_the_three_connection_settings() {
        let file = write_properties(
            "# storefront\nDB_URL=mysql://localhost:3306/shop\nDB_USER=shop\nDB_PASSWORD=s3cret\n",
        );

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.database.url, "mysql://localhost:3306/shop");
        assert_eq!(config.database.user, "shop");
        assert_eq!(config.database.password, "s3cret");
        assert_eq!(
            config.database.query_timeout,
            Duration::from_secs(u64::from(DEFAULT_QUERY_TIMEOUT_SECS))
        );
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn optional_settings_override_defaults() {
        let file = write_properties(
            "DB_URL=sqlite::memory:\nDB_USER=\nDB_PASSWORD=\nQUERY_TIMEOUT_SECS=12\nMAX_CONNECTIONS=4\nLOG_FORMAT=json\n",
        );

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.database.query_timeout, Duration::from_secs(12));
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn lowercase_keys_in_the_file_are_accepted() {
        let file = write_properties(
            "db_url=sqlite::memory:\ndb_user=\ndb_password=\nmax_connections=2\n",
        );

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 2);
    }

    #[test]
    fn environment_overrides_the_file() {
        let file = write_properties(
            "DB_URL=mysql://localhost/shop\nDB_USER=shop\nDB_PASSWORD=pw\nQUERY_TIMEOUT_SECS=10\n",
        );
        let env: Map<String, String> = [
            ("STOREFRONT_DB_URL", "sqlite::memory:"),
            ("STOREFRONT_QUERY_TIMEOUT_SECS", "3"),
            ("STOREFRONT_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = AppConfig::load_with_env(file.path(), Some(env)).unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.user, "shop");
        assert_eq!(config.database.query_timeout, Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.properties");

        match AppConfig::load(&path) {
            Err(ConfigError::Load { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Load error, got {other:?}"),
        }
    }

    #[test]
    fn missing_password_is_a_load_error() {
        let file = write_properties("DB_URL=mysql://localhost/shop\nDB_USER=shop\n");

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }), "got {err:?}");
    }

    #[test]
    fn blank_url_is_rejected() {
        let file = write_properties("DB_URL=   \nDB_USER=shop\nDB_PASSWORD=pw\n");

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let file = write_properties(
            "DB_URL=sqlite::memory:\nDB_USER=\nDB_PASSWORD=\nQUERY_TIMEOUT_SECS=0\n",
        );

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let file = write_properties("DB_URL=mysql://db/shop\nDB_USER=shop\nDB_PASSWORD=hunter2\n");
        let config = AppConfig::load(file.path()).unwrap();

        let rendered = format!("{:?}", config.database);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
