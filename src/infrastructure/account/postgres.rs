//! PostgreSQL account store

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::{DomainError, UniqueKey};
use crate::domain::account::{
    Account, AccountId, AccountRepository, AccountStatus, normalize_key,
};

pub(crate) const EMAIL_CONSTRAINT: &str = "accounts_normalized_email_key";
pub(crate) const USER_NAME_CONSTRAINT: &str = "accounts_normalized_user_name_key";

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_name, email, email_confirmed, password_hash, status,
           concurrency_stamp, profile, created_at, updated_at, last_sign_in_at
    FROM accounts
"#;

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Account>, DomainError> {
        let sql = format!("{} WHERE {} = $1", SELECT_COLUMNS, clause);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        self.fetch_one_where("id", id.as_str()).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        self.fetch_one_where("normalized_email", &normalize_key(email))
            .await
    }

    async fn get_by_user_name(&self, user_name: &str) -> Result<Option<Account>, DomainError> {
        self.fetch_one_where("normalized_user_name", &normalize_key(user_name))
            .await
    }

    async fn create(&self, account: Account) -> Result<Account, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_name, normalized_user_name, email, normalized_email,
                                  email_confirmed, password_hash, status, concurrency_stamp,
                                  profile, created_at, updated_at, last_sign_in_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(account.id().as_str())
        .bind(account.user_name())
        .bind(account.normalized_user_name())
        .bind(account.email())
        .bind(account.normalized_email())
        .bind(account.email_confirmed())
        .bind(account.password_hash())
        .bind(account.status().as_str())
        .bind(account.concurrency_stamp())
        .bind(Json(account.profile()))
        .bind(account.created_at())
        .bind(account.updated_at())
        .bind(account.last_sign_in_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &account, "create"))?;

        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Account, DomainError> {
        let new_stamp = Uuid::new_v4().to_string();

        // The hash and sign-in time are only written by create and record_sign_in
        let row = sqlx::query(
            r#"
            UPDATE accounts
            SET user_name = $2, normalized_user_name = $3, email = $4, normalized_email = $5,
                email_confirmed = $6, status = $7, profile = $8, updated_at = $9,
                concurrency_stamp = $10
            WHERE id = $1 AND concurrency_stamp = $11
            RETURNING password_hash, created_at, last_sign_in_at
            "#,
        )
        .bind(account.id().as_str())
        .bind(account.user_name())
        .bind(account.normalized_user_name())
        .bind(account.email())
        .bind(account.normalized_email())
        .bind(account.email_confirmed())
        .bind(account.status().as_str())
        .bind(Json(account.profile()))
        .bind(account.updated_at())
        .bind(&new_stamp)
        .bind(account.concurrency_stamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, account, "update"))?;

        let Some(row) = row else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
                    .bind(account.id().as_str())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        DomainError::storage(format!("Failed to check account: {}", e))
                    })?;

            return Err(if exists {
                DomainError::conflict(format!(
                    "Account '{}' was modified concurrently",
                    account.id()
                ))
            } else {
                DomainError::not_found(format!("Account '{}' not found", account.id()))
            });
        };

        let column_error = |e: sqlx::Error| DomainError::storage(format!("Invalid account row: {}", e));
        let password_hash: Option<String> = row.try_get("password_hash").map_err(column_error)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column_error)?;
        let last_sign_in_at: Option<DateTime<Utc>> =
            row.try_get("last_sign_in_at").map_err(column_error)?;

        Ok(account.clone().restore(
            password_hash,
            new_stamp,
            created_at,
            account.updated_at(),
            last_sign_in_at,
        ))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count accounts: {}", e)))?;

        Ok(count as usize)
    }

    async fn record_sign_in(&self, id: &AccountId) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE accounts SET last_sign_in_at = NOW() WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record sign-in: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Account '{}' not found", id)));
        }

        Ok(())
    }
}

fn map_write_error(e: sqlx::Error, account: &Account, action: &str) -> DomainError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some(EMAIL_CONSTRAINT) => DomainError::duplicate(
                    UniqueKey::Email,
                    format!("Email '{}' already exists", account.email()),
                ),
                Some(USER_NAME_CONSTRAINT) => DomainError::duplicate(
                    UniqueKey::UserName,
                    format!("User name '{}' already exists", account.user_name()),
                ),
                _ => DomainError::duplicate(
                    UniqueKey::Id,
                    format!("Account with ID '{}' already exists", account.id()),
                ),
            };
        }
    }

    DomainError::storage(format!("Failed to {} account: {}", action, e))
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, DomainError> {
    let column_error = |e: sqlx::Error| DomainError::storage(format!("Invalid account row: {}", e));

    let id: String = row.try_get("id").map_err(column_error)?;
    let user_name: String = row.try_get("user_name").map_err(column_error)?;
    let email: String = row.try_get("email").map_err(column_error)?;
    let email_confirmed: bool = row.try_get("email_confirmed").map_err(column_error)?;
    let password_hash: Option<String> = row.try_get("password_hash").map_err(column_error)?;
    let status: String = row.try_get("status").map_err(column_error)?;
    let concurrency_stamp: String = row.try_get("concurrency_stamp").map_err(column_error)?;
    let Json(profile): Json<BTreeMap<String, String>> =
        row.try_get("profile").map_err(column_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(column_error)?;
    let last_sign_in_at: Option<DateTime<Utc>> =
        row.try_get("last_sign_in_at").map_err(column_error)?;

    let id = AccountId::new(&id)
        .map_err(|e| DomainError::storage(format!("Invalid account ID in database: {}", e)))?;

    let account = profile.into_iter().fold(
        Account::with_id(id, user_name, email)
            .with_status(AccountStatus::parse(&status))
            .with_email_confirmed(email_confirmed),
        |account, (key, value)| account.with_profile_value(key, value),
    );

    Ok(account.restore(
        password_hash,
        concurrency_stamp,
        created_at,
        updated_at,
        last_sign_in_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_column_values() {
        assert_eq!(AccountStatus::Active.as_str(), "active");
        assert_eq!(AccountStatus::parse("suspended"), AccountStatus::Suspended);
    }

    #[test]
    fn test_constraint_names_match_migration() {
        let migrations = crate::infrastructure::storage::directory_migrations();
        let schema = &migrations[0].up;

        assert!(schema.contains(EMAIL_CONSTRAINT));
        assert!(schema.contains(USER_NAME_CONSTRAINT));
    }
}
