//! PostgreSQL role store

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::DomainError;
use crate::domain::account::AccountId;
use crate::domain::role::{RoleName, RoleRepository};

/// PostgreSQL implementation of RoleRepository
#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_role(name: String) -> Result<RoleName, DomainError> {
    RoleName::new(&name)
        .map_err(|e| DomainError::storage(format!("Invalid role name in database: {}", e)))
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create(&self, role: RoleName) -> Result<RoleName, DomainError> {
        sqlx::query("INSERT INTO roles (name, normalized_name) VALUES ($1, $2)")
            .bind(role.as_str())
            .bind(role.normalized())
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    DomainError::conflict(format!("Role '{}' already exists", role))
                }
                _ => DomainError::storage(format!("Failed to create role: {}", e)),
            })?;

        Ok(role)
    }

    async fn find(&self, role: &RoleName) -> Result<Option<RoleName>, DomainError> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM roles WHERE normalized_name = $1")
                .bind(role.normalized())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to get role: {}", e)))?;

        name.map(to_role).transpose()
    }

    async fn add_member(&self, account: &AccountId, role: &RoleName) -> Result<bool, DomainError> {
        if !self.exists(role).await? {
            return Err(DomainError::not_found(format!("Role '{}' not found", role)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO account_roles (account_id, role_normalized_name)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(account.as_str())
        .bind(role.normalized())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to add role membership: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(
        &self,
        account: &AccountId,
        role: &RoleName,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "DELETE FROM account_roles WHERE account_id = $1 AND role_normalized_name = $2",
        )
        .bind(account.as_str())
        .bind(role.normalized())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to remove role membership: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_member(&self, account: &AccountId, role: &RoleName) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM account_roles
                WHERE account_id = $1 AND role_normalized_name = $2
            )
            "#,
        )
        .bind(account.as_str())
        .bind(role.normalized())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to check role membership: {}", e)))
    }

    async fn roles_for(&self, account: &AccountId) -> Result<Vec<RoleName>, DomainError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM account_roles ar
            JOIN roles r ON r.normalized_name = ar.role_normalized_name
            WHERE ar.account_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list account roles: {}", e)))?;

        names.into_iter().map(to_role).collect()
    }
}
