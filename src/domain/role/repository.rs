//! Role store trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::RoleName;
use crate::domain::DomainError;
use crate::domain::account::AccountId;

/// Persistence port for roles and account memberships
///
/// Role names are matched case-insensitively; the name returned is the one
/// the role was created with.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Create a role, failing with `DomainError::Conflict` if it exists
    async fn create(&self, role: RoleName) -> Result<RoleName, DomainError>;

    /// Resolve a role to its stored name
    async fn find(&self, role: &RoleName) -> Result<Option<RoleName>, DomainError>;

    /// Add a membership; returns false if the account already had the role.
    /// Fails with `DomainError::NotFound` if the role does not exist.
    async fn add_member(&self, account: &AccountId, role: &RoleName) -> Result<bool, DomainError>;

    /// Remove a membership; returns false if the account did not have the role
    async fn remove_member(
        &self,
        account: &AccountId,
        role: &RoleName,
    ) -> Result<bool, DomainError>;

    /// Whether the account has the role
    async fn is_member(&self, account: &AccountId, role: &RoleName) -> Result<bool, DomainError>;

    /// Roles of an account, sorted by name
    async fn roles_for(&self, account: &AccountId) -> Result<Vec<RoleName>, DomainError>;

    /// Whether a role exists
    async fn exists(&self, role: &RoleName) -> Result<bool, DomainError> {
        Ok(self.find(role).await?.is_some())
    }
}
