//! Hierarchical configuration loading.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "schema-migrator.yaml";

/// Optional local overrides, not meant to be committed.
pub const LOCAL_CONFIG_FILE: &str = "schema-migrator.local.yaml";

/// Prefix for nested environment overrides, e.g. `SCHEMA_MIGRATOR_DATABASE__URL`.
pub const ENV_PREFIX: &str = "SCHEMA_MIGRATOR_";

/// Conventional variables and the config keys they set.
const CONVENTIONAL_ENV: [(&str, &str); 3] = [
    ("DATABASE_URL", "database.url"),
    ("DATABASE_SSL", "database.ssl"),
    ("DATABASE_SSL_REJECT_UNAUTHORIZED", "database.ssl_reject_unauthorized"),
];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `database.url` is blank.
    #[error("Database URL cannot be empty")]
    EmptyDatabaseUrl,

    /// `database.max_connections` is zero.
    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    /// `migrations.lock_timeout_secs` is zero.
    #[error("Invalid lock_timeout_secs: {0}. Must be at least 1")]
    InvalidLockTimeout(u64),

    /// `migrations.directory` is empty.
    #[error("Migrations directory cannot be empty")]
    EmptyMigrationsDirectory,

    /// `logging.level` is not a tracing level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Build the provider chain.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or `schema-migrator.yaml` then `schema-migrator.local.yaml`
    /// 3. `SCHEMA_MIGRATOR_*` environment variables (`__` separates sections)
    /// 4. `DATABASE_URL`, `DATABASE_SSL`, `DATABASE_SSL_REJECT_UNAUTHORIZED`
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let figment = match path {
            Some(path) => figment.merge(Yaml::file(path)),
            None => figment.merge(Yaml::file(CONFIG_FILE)).merge(Yaml::file(LOCAL_CONFIG_FILE)),
        };

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(conventional_env())
    }

    /// Load configuration from the working directory and environment
    pub fn load() -> Result<Config> {
        Self::extract(Self::figment(None))
    }

    /// Load configuration from a specific file (plus environment overrides)
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        Self::extract(Self::figment(Some(path)))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Extract and validate a configuration from any provider chain.
    pub fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if config.migrations.directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyMigrationsDirectory);
        }

        if config.migrations.lock_timeout_secs == 0 {
            return Err(ConfigError::InvalidLockTimeout(config.migrations.lock_timeout_secs));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}

fn conventional_env() -> Env {
    Env::raw()
        .only(&CONVENTIONAL_ENV.map(|(var, _)| var))
        .map(|key| {
            CONVENTIONAL_ENV
                .iter()
                .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
                .map_or_else(|| key.into(), |(_, path)| (*path).into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{LogFormat, LoggingConfig};
    use std::path::PathBuf;

    const ALL_VARS: [&str; 5] = [
        "DATABASE_URL",
        "DATABASE_SSL",
        "DATABASE_SSL_REJECT_UNAUTHORIZED",
        "SCHEMA_MIGRATOR_DATABASE__URL",
        "SCHEMA_MIGRATOR_MIGRATIONS__DIRECTORY",
    ];

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:.schema-migrator/app.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.migrations.directory, PathBuf::from("migrations"));
        assert!(config.migrations.advisory_lock);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  url: postgres://app@db/tenants
  ssl: true
  ssl_reject_unauthorized: false
  max_connections: 2
migrations:
  directory: db/migrations
  advisory_lock: false
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.url, "postgres://app@db/tenants");
        assert_eq!(config.database.ssl, Some(true));
        assert_eq!(config.database.ssl_reject_unauthorized, Some(false));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.acquire_timeout_secs, 10);
        assert_eq!(config.migrations.directory, PathBuf::from("db/migrations"));
        assert!(!config.migrations.advisory_lock);
        assert_eq!(config.migrations.lock_timeout_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Json);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_empty_database_url() {
        let mut config = Config::default();
        config.database.url = "   ".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabaseUrl)));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));
    }

    #[test]
    fn test_validate_empty_migrations_directory() {
        let mut config = Config::default();
        config.migrations.directory = PathBuf::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyMigrationsDirectory)
        ));
    }

    #[test]
    fn test_validate_zero_lock_timeout() {
        let mut config = Config::default();
        config.migrations.lock_timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLockTimeout(0))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            logging: LoggingConfig {
                level: "loud".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let (_dir, path) = write_config("database:\n  url: sqlite:tenants.db\nmigrations:\n  directory: sql\n");

        temp_env::with_vars_unset(ALL_VARS.to_vec(), || {
            let config = ConfigLoader::load_from_file(&path).expect("config should load");
            assert_eq!(config.database.url, "sqlite:tenants.db");
            assert_eq!(config.migrations.directory, PathBuf::from("sql"));
            assert_eq!(config.logging.level, "info");
        });
    }

    #[test]
    fn test_prefixed_env_overrides_file() {
        let (_dir, path) = write_config("database:\n  url: sqlite:from_file.db\n");

        temp_env::with_vars(
            vec![
                ("SCHEMA_MIGRATOR_DATABASE__URL", Some("sqlite:from_env.db")),
                ("SCHEMA_MIGRATOR_MIGRATIONS__DIRECTORY", Some("env_migrations")),
                ("DATABASE_URL", None),
                ("DATABASE_SSL", None),
                ("DATABASE_SSL_REJECT_UNAUTHORIZED", None),
            ],
            || {
                let config = ConfigLoader::load_from_file(&path).unwrap();
                assert_eq!(config.database.url, "sqlite:from_env.db");
                assert_eq!(config.migrations.directory, PathBuf::from("env_migrations"));
            },
        );
    }

    #[test]
    fn test_conventional_database_env() {
        let (_dir, path) = write_config("database:\n  url: sqlite:from_file.db\n");

        temp_env::with_vars(
            vec![
                ("DATABASE_URL", Some("postgres://app@db/tenants")),
                ("DATABASE_SSL", Some("true")),
                ("DATABASE_SSL_REJECT_UNAUTHORIZED", Some("false")),
                ("SCHEMA_MIGRATOR_DATABASE__URL", None),
                ("SCHEMA_MIGRATOR_MIGRATIONS__DIRECTORY", None),
            ],
            || {
                let config = ConfigLoader::load_from_file(&path).unwrap();
                assert_eq!(config.database.url, "postgres://app@db/tenants");
                assert_eq!(config.database.ssl, Some(true));
                assert_eq!(config.database.ssl_reject_unauthorized, Some(false));
            },
        );
    }

    #[test]
    fn test_explicit_overrides_merge_last() {
        let (_dir, path) = write_config("database:\n  url: sqlite:from_file.db\n");

        temp_env::with_vars_unset(ALL_VARS.to_vec(), || {
            let figment = ConfigLoader::figment(Some(&path)).merge(("database.url", "sqlite:from_flag.db"));
            let config = ConfigLoader::extract(figment).unwrap();
            assert_eq!(config.database.url, "sqlite:from_flag.db");
        });
    }

    #[test]
    fn test_invalid_file_value_fails_validation() {
        let (_dir, path) = write_config("database:\n  max_connections: 0\n");

        temp_env::with_vars_unset(ALL_VARS.to_vec(), || {
            let err = ConfigLoader::load_from_file(&path).unwrap_err();
            assert!(format!("{err:#}").contains("max_connections"));
        });
    }
}
