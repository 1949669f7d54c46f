//! In-memory role store

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::account::AccountId;
use crate::domain::role::{RoleName, RoleRepository};

#[derive(Debug, Default)]
struct RoleIndex {
    /// normalized name -> stored name
    roles: HashMap<String, RoleName>,
    memberships: HashMap<AccountId, BTreeSet<RoleName>>,
}

impl RoleIndex {
    fn resolve(&self, role: &RoleName) -> Option<RoleName> {
        self.roles.get(&role.normalized()).cloned()
    }
}

/// In-memory implementation of RoleRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleRepository {
    inner: Arc<RwLock<RoleIndex>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with the given roles already defined
    pub fn with_roles(roles: impl IntoIterator<Item = RoleName>) -> Self {
        let roles = roles
            .into_iter()
            .map(|role| (role.normalized(), role))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(RoleIndex {
                roles,
                memberships: HashMap::new(),
            })),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create(&self, role: RoleName) -> Result<RoleName, DomainError> {
        let mut index = self.inner.write().await;

        if index.resolve(&role).is_some() {
            return Err(DomainError::conflict(format!(
                "Role '{}' already exists",
                role
            )));
        }

        index.roles.insert(role.normalized(), role.clone());
        Ok(role)
    }

    async fn find(&self, role: &RoleName) -> Result<Option<RoleName>, DomainError> {
        Ok(self.inner.read().await.resolve(role))
    }

    async fn add_member(&self, account: &AccountId, role: &RoleName) -> Result<bool, DomainError> {
        let mut index = self.inner.write().await;

        let stored = index
            .resolve(role)
            .ok_or_else(|| DomainError::not_found(format!("Role '{}' not found", role)))?;

        Ok(index
            .memberships
            .entry(account.clone())
            .or_default()
            .insert(stored))
    }

    async fn remove_member(
        &self,
        account: &AccountId,
        role: &RoleName,
    ) -> Result<bool, DomainError> {
        let mut index = self.inner.write().await;

        let Some(stored) = index.resolve(role) else {
            return Ok(false);
        };

        Ok(index
            .memberships
            .get_mut(account)
            .is_some_and(|roles| roles.remove(&stored)))
    }

    async fn is_member(&self, account: &AccountId, role: &RoleName) -> Result<bool, DomainError> {
        let index = self.inner.read().await;

        Ok(match index.resolve(role) {
            Some(stored) => index
                .memberships
                .get(account)
                .is_some_and(|roles| roles.contains(&stored)),
            None => false,
        })
    }

    async fn roles_for(&self, account: &AccountId) -> Result<Vec<RoleName>, DomainError> {
        let index = self.inner.read().await;

        Ok(index
            .memberships
            .get(account)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }
}
