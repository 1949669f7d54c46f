//! Database migrations for the directory schema

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Applies versioned migrations, recording them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Runs a single migration unless already applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(());
        }

        info!(version = migration.version, description = %migration.description, "Applying migration");

        sqlx::raw_sql(&migration.up)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        Ok(())
    }
}

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
        }
    }
}

/// Migrations for accounts, roles and memberships
pub fn directory_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create accounts table",
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id VARCHAR(64) PRIMARY KEY,
                user_name VARCHAR(256) NOT NULL,
                normalized_user_name VARCHAR(256) NOT NULL,
                email VARCHAR(256) NOT NULL,
                normalized_email VARCHAR(256) NOT NULL,
                email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
                password_hash TEXT,
                status VARCHAR(16) NOT NULL,
                concurrency_stamp VARCHAR(64) NOT NULL,
                profile JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_sign_in_at TIMESTAMPTZ,
                CONSTRAINT accounts_normalized_email_key UNIQUE (normalized_email),
                CONSTRAINT accounts_normalized_user_name_key UNIQUE (normalized_user_name)
            );
            "#,
        ),
        Migration::new(
            2,
            "Create roles table",
            r#"
            CREATE TABLE IF NOT EXISTS roles (
                normalized_name VARCHAR(256) PRIMARY KEY,
                name VARCHAR(256) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        ),
        Migration::new(
            3,
            "Create account_roles table",
            r#"
            CREATE TABLE IF NOT EXISTS account_roles (
                account_id VARCHAR(64) NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                role_normalized_name VARCHAR(256) NOT NULL
                    REFERENCES roles(normalized_name) ON DELETE CASCADE,
                PRIMARY KEY (account_id, role_normalized_name)
            );
            CREATE INDEX IF NOT EXISTS idx_account_roles_role
                ON account_roles(role_normalized_name);
            "#,
        ),
    ]
}

/// Runs all pending directory migrations
pub async fn run_directory_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in directory_migrations() {
        migrator.run_migration(&migration).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new(1, "Test migration", "CREATE TABLE test");

        assert_eq!(migration.version, 1);
        assert_eq!(migration.description, "Test migration");
        assert_eq!(migration.up, "CREATE TABLE test");
    }

    #[test]
    fn test_directory_migrations_order() {
        let migrations = directory_migrations();

        assert!(!migrations.is_empty());

        for pair in migrations.windows(2) {
            assert!(
                pair[1].version > pair[0].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_directory_migrations_content() {
        for migration in directory_migrations() {
            assert!(!migration.description.is_empty());
            assert!(!migration.up.trim().is_empty());
        }
    }

    #[test]
    fn test_memberships_reference_accounts_and_roles() {
        let migrations = directory_migrations();
        let memberships = &migrations[2].up;

        assert!(memberships.contains("REFERENCES accounts(id)"));
        assert!(memberships.contains("REFERENCES roles(normalized_name)"));
    }
}
