use serde::Deserialize;

use crate::directory::BootstrapSettings;
use crate::infrastructure::identity::IdentityOptions;
use crate::infrastructure::session::SessionConfig;
use crate::infrastructure::storage::PostgresConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub identity: IdentityOptions,
    pub session: SessionConfig,
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where accounts and roles are kept
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or `postgres`
    pub backend: String,
    pub postgres: PostgresConfig,
    /// Apply pending schema migrations on startup
    pub run_migrations: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            postgres: PostgresConfig::default(),
            run_migrations: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.identity.password.min_length, 6);
        assert!(!config.identity.require_confirmed_email);
        assert_eq!(config.session.expiration_hours, 8);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = from_toml(
            r#"
            [logging]
            format = "json"

            [storage]
            backend = "postgres"

            [storage.postgres]
            url = "postgres://db/condo"

            [identity.password]
            require_non_alphanumeric = false

            [bootstrap]
            admin_email = "admin@condo.com"
            "#,
        );

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, "postgres");
        assert_eq!(config.storage.postgres.url, "postgres://db/condo");
        assert_eq!(config.storage.postgres.max_connections, 10);
        assert!(!config.identity.password.require_non_alphanumeric);
        assert!(config.identity.password.require_digit);
        assert_eq!(config.bootstrap.admin_email.as_deref(), Some("admin@condo.com"));
        assert_eq!(config.bootstrap.roles.len(), 3);
    }
}
