//! Account store trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{Account, AccountId};
use crate::domain::DomainError;

/// Persistence port for accounts
///
/// Email and login name lookups are case-insensitive. Writes that collide on
/// a unique key fail with `DomainError::Duplicate`. `update` compares the
/// account's concurrency stamp with the stored one and fails with
/// `DomainError::Conflict` when they differ; on success the stored copy gets a
/// fresh stamp, which is returned. `update` never changes the password hash
/// or the last sign-in time.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get an account by its ID
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Get an account by email
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    /// Get an account by login name
    async fn get_by_user_name(&self, user_name: &str) -> Result<Option<Account>, DomainError>;

    /// Persist a new account
    async fn create(&self, account: Account) -> Result<Account, DomainError>;

    /// Persist changes to an existing account
    async fn update(&self, account: &Account) -> Result<Account, DomainError>;

    /// Number of stored accounts
    async fn count(&self) -> Result<usize, DomainError>;

    /// Stamp the last sign-in time
    async fn record_sign_in(&self, id: &AccountId) -> Result<(), DomainError>;
}
