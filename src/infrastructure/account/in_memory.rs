//! In-memory account store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{DomainError, UniqueKey};
use crate::domain::account::{Account, AccountId, AccountRepository, normalize_key};

#[derive(Debug, Default)]
struct AccountIndex {
    accounts: HashMap<AccountId, Account>,
    /// normalized email -> account ID
    by_email: HashMap<String, AccountId>,
    /// normalized login name -> account ID
    by_user_name: HashMap<String, AccountId>,
}

/// In-memory implementation of AccountRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    inner: Arc<RwLock<AccountIndex>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let index = self.inner.read().await;
        Ok(index.accounts.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let index = self.inner.read().await;

        Ok(index
            .by_email
            .get(&normalize_key(email))
            .and_then(|id| index.accounts.get(id))
            .cloned())
    }

    async fn get_by_user_name(&self, user_name: &str) -> Result<Option<Account>, DomainError> {
        let index = self.inner.read().await;

        Ok(index
            .by_user_name
            .get(&normalize_key(user_name))
            .and_then(|id| index.accounts.get(id))
            .cloned())
    }

    async fn create(&self, account: Account) -> Result<Account, DomainError> {
        let mut index = self.inner.write().await;

        let email = account.normalized_email();
        let user_name = account.normalized_user_name();

        if index.accounts.contains_key(account.id()) {
            return Err(DomainError::duplicate(
                UniqueKey::Id,
                format!("Account with ID '{}' already exists", account.id()),
            ));
        }

        if index.by_email.contains_key(&email) {
            return Err(DomainError::duplicate(
                UniqueKey::Email,
                format!("Email '{}' already exists", account.email()),
            ));
        }

        if index.by_user_name.contains_key(&user_name) {
            return Err(DomainError::duplicate(
                UniqueKey::UserName,
                format!("User name '{}' already exists", account.user_name()),
            ));
        }

        index.by_email.insert(email, account.id().clone());
        index.by_user_name.insert(user_name, account.id().clone());
        index.accounts.insert(account.id().clone(), account.clone());

        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Account, DomainError> {
        let mut index = self.inner.write().await;
        let id = account.id().clone();

        let mut updated = account.clone();
        let (old_email, old_user_name) = match index.accounts.get(&id) {
            Some(stored) if stored.concurrency_stamp() != account.concurrency_stamp() => {
                return Err(DomainError::conflict(format!(
                    "Account '{}' was modified concurrently",
                    id
                )));
            }
            Some(stored) => {
                updated.keep_stored_state(stored);
                (stored.normalized_email(), stored.normalized_user_name())
            }
            None => return Err(DomainError::not_found(format!("Account '{}' not found", id))),
        };

        let new_email = account.normalized_email();
        let new_user_name = account.normalized_user_name();

        if new_email != old_email && index.by_email.contains_key(&new_email) {
            return Err(DomainError::duplicate(
                UniqueKey::Email,
                format!("Email '{}' already exists", account.email()),
            ));
        }

        if new_user_name != old_user_name && index.by_user_name.contains_key(&new_user_name) {
            return Err(DomainError::duplicate(
                UniqueKey::UserName,
                format!("User name '{}' already exists", account.user_name()),
            ));
        }

        index.by_email.remove(&old_email);
        index.by_email.insert(new_email, id.clone());
        index.by_user_name.remove(&old_user_name);
        index.by_user_name.insert(new_user_name, id.clone());

        updated.rotate_concurrency_stamp();
        index.accounts.insert(id, updated.clone());

        Ok(updated)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.inner.read().await.accounts.len())
    }

    async fn record_sign_in(&self, id: &AccountId) -> Result<(), DomainError> {
        let mut index = self.inner.write().await;

        match index.accounts.get_mut(id) {
            Some(account) => {
                account.record_sign_in();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("Account '{}' not found", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryAccountRepository::new();
        let account = Account::from_email("a@x.com");

        repo.create(account.clone()).await.unwrap();

        let retrieved = repo.get(account.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.email(), "a@x.com");
    }

    #[tokio::test]
    async fn test_lookups_are_case_insensitive() {
        let repo = InMemoryAccountRepository::new();
        repo.create(Account::new("JDoe", "JDoe@X.com")).await.unwrap();

        assert!(repo.get_by_email("jdoe@x.com").await.unwrap().is_some());
        assert!(repo.get_by_user_name("jdoe").await.unwrap().is_some());
        assert!(repo.get_by_email("other@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_uniqueness() {
        let repo = InMemoryAccountRepository::new();
        repo.create(Account::new("first", "a@x.com")).await.unwrap();

        let result = repo.create(Account::new("second", "A@X.COM")).await;
        assert!(matches!(
            result,
            Err(DomainError::Duplicate {
                key: UniqueKey::Email,
                ..
            })
        ));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_rotates_stamp() {
        let repo = InMemoryAccountRepository::new();
        let mut account = Account::from_email("a@x.com");
        repo.create(account.clone()).await.unwrap();

        account.set_profile_value("apartment", "12B");
        let stored = repo.update(&account).await.unwrap();

        assert_ne!(stored.concurrency_stamp(), account.concurrency_stamp());
        assert_eq!(
            repo.get(account.id())
                .await
                .unwrap()
                .unwrap()
                .profile_value("apartment"),
            Some("12B")
        );
    }

    #[tokio::test]
    async fn test_update_keeps_hash_and_sign_in_time() {
        let repo = InMemoryAccountRepository::new();
        let mut account = Account::from_email("a@x.com");
        account.set_password_hash("$argon2id$secret");
        repo.create(account.clone()).await.unwrap();
        repo.record_sign_in(account.id()).await.unwrap();

        let json = serde_json::to_string(&account).unwrap();
        let mut incoming: Account = serde_json::from_str(&json).unwrap();
        incoming.set_profile_value("apartment", "12B");

        let updated = repo.update(&incoming).await.unwrap();
        assert_eq!(updated.password_hash(), Some("$argon2id$secret"));
        assert!(updated.last_sign_in_at().is_some());

        let stored = repo.get(account.id()).await.unwrap().unwrap();
        assert_eq!(stored.password_hash(), Some("$argon2id$secret"));
        assert!(stored.last_sign_in_at().is_some());
        assert_eq!(stored.profile_value("apartment"), Some("12B"));
    }

    #[tokio::test]
    async fn test_update_with_stale_stamp_conflicts() {
        let repo = InMemoryAccountRepository::new();
        let account = Account::from_email("a@x.com");
        repo.create(account.clone()).await.unwrap();

        repo.update(&account).await.unwrap();

        let result = repo.update(&account).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_changes_email_index() {
        let repo = InMemoryAccountRepository::new();
        let mut account = Account::new("jdoe", "old@x.com");
        repo.create(account.clone()).await.unwrap();

        account.set_email("new@x.com");
        repo.update(&account).await.unwrap();

        assert!(repo.get_by_email("old@x.com").await.unwrap().is_none());
        assert!(repo.get_by_email("new@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let repo = InMemoryAccountRepository::new();
        let result = repo.update(&Account::from_email("a@x.com")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_count_and_record_sign_in() {
        let repo = InMemoryAccountRepository::new();
        assert_eq!(repo.count().await.unwrap(), 0);

        let account = Account::from_email("a@x.com");
        repo.create(account.clone()).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        repo.record_sign_in(account.id()).await.unwrap();
        let stored = repo.get(account.id()).await.unwrap().unwrap();
        assert!(stored.last_sign_in_at().is_some());
    }
}
