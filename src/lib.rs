//! Account Directory
//!
//! Credential and role management for the condominium application:
//! - Account registration with password policy and Argon2 hashing
//! - Role definitions and batch membership changes
//! - JWT sessions, revocable on sign-out
//! - In-memory or PostgreSQL storage

pub mod cli;
pub mod config;
pub mod directory;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use directory::{AccountDirectory, DirectoryError, DirectoryOperation};

use std::sync::Arc;

use anyhow::anyhow;
use rand::Rng;
use tracing::{info, warn};

use domain::{AccountRepository, RoleRepository};
use infrastructure::{
    account::{InMemoryAccountRepository, PostgresAccountRepository},
    identity::StoreIdentityProvider,
    password::Argon2Hasher,
    role::{InMemoryRoleRepository, PostgresRoleRepository},
    session::{JwtSessionManager, SessionConfig},
    storage::{self, StorageType},
};

/// Create an account directory with the default configuration (in-memory storage)
pub async fn create_directory() -> anyhow::Result<AccountDirectory> {
    create_directory_with_config(&AppConfig::default()).await
}

/// Create an account directory from configuration
pub async fn create_directory_with_config(config: &AppConfig) -> anyhow::Result<AccountDirectory> {
    let backend = StorageType::parse(&config.storage.backend)
        .ok_or_else(|| anyhow!("Unknown storage backend '{}'", config.storage.backend))?;

    let (accounts, roles): (Arc<dyn AccountRepository>, Arc<dyn RoleRepository>) = match backend {
        StorageType::InMemory => {
            info!("Using in-memory account storage");
            (
                Arc::new(InMemoryAccountRepository::new()),
                Arc::new(InMemoryRoleRepository::new()),
            )
        }
        StorageType::Postgres => {
            let pool = storage::connect(&config.storage.postgres).await?;

            if config.storage.run_migrations {
                storage::run_directory_migrations(&pool).await?;
            }

            info!("Using PostgreSQL account storage");
            (
                Arc::new(PostgresAccountRepository::new(pool.clone())),
                Arc::new(PostgresRoleRepository::new(pool)),
            )
        }
    };

    let provider = StoreIdentityProvider::new(
        accounts,
        roles,
        Arc::new(Argon2Hasher::new()),
        JwtSessionManager::new(session_config(config)),
        config.identity.clone(),
    );

    Ok(AccountDirectory::new(Arc::new(provider)))
}

/// Session settings, with a random secret when none is configured
fn session_config(config: &AppConfig) -> SessionConfig {
    let mut session = config.session.clone();

    if session.secret.is_empty() {
        warn!(
            "No session secret configured. Generating random secret. \
            Sessions will NOT survive a restart. Set APP__SESSION__SECRET to keep them."
        );
        session.secret = generate_random_secret();
    }

    session
}

/// Generate a random session signing secret
fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;

    #[tokio::test]
    async fn test_default_directory_is_usable() {
        let directory = create_directory().await.unwrap();
        assert_eq!(directory.count_accounts().await.unwrap(), 0);

        let result = directory
            .create_account(Account::from_email("a@x.com"), "Secr3t!23")
            .await
            .unwrap();
        assert!(result.succeeded());
        assert_eq!(directory.count_accounts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "mongo".to_string();

        let err = create_directory_with_config(&config).await.unwrap_err();
        assert!(err.to_string().contains("mongo"));
    }

    #[test]
    fn test_session_secret_generated_when_empty() {
        let generated = session_config(&AppConfig::default());
        assert_eq!(generated.secret.len(), 64);

        let mut config = AppConfig::default();
        config.session.secret = "configured".to_string();
        assert_eq!(session_config(&config).secret, "configured");
    }
}
