//! Store-backed identity provider

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{DomainError, UniqueKey};
use crate::domain::account::{
    Account, AccountId, AccountRepository, PasswordPolicy, normalize_key, validate_email,
    validate_user_name,
};
use crate::domain::identity::{
    IdentityError, IdentityErrorCode, IdentityProvider, IdentityResult, MembershipOutcome,
    Principal, Session, SignInResult,
};
use crate::domain::role::{RoleName, RoleRepository};
use crate::infrastructure::password::PasswordHasher;
use crate::infrastructure::session::JwtSessionManager;

/// Account and sign-in rules enforced by the provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityOptions {
    pub password: PasswordPolicy,
    /// Refuse sign-in until the account's email is confirmed
    pub require_confirmed_email: bool,
}

/// `IdentityProvider` built on the storage ports
pub struct StoreIdentityProvider {
    accounts: Arc<dyn AccountRepository>,
    roles: Arc<dyn RoleRepository>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: JwtSessionManager,
    options: IdentityOptions,
}

impl Debug for StoreIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreIdentityProvider")
            .field("hasher", &self.hasher)
            .field("sessions", &self.sessions)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

enum MembershipChange {
    Add,
    Remove,
}

impl StoreIdentityProvider {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        roles: Arc<dyn RoleRepository>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: JwtSessionManager,
        options: IdentityOptions,
    ) -> Self {
        Self {
            accounts,
            roles,
            hasher,
            sessions,
            options,
        }
    }

    /// Format and uniqueness checks shared by create and update
    async fn check_account(&self, account: &Account) -> Result<Vec<IdentityError>, DomainError> {
        let mut errors = Vec::new();

        match validate_user_name(account.user_name()) {
            Ok(()) => {
                let taken = self
                    .accounts
                    .get_by_user_name(account.user_name())
                    .await?
                    .is_some_and(|existing| existing.id() != account.id());
                if taken {
                    errors.push(IdentityError::duplicate_user_name(account.user_name()));
                }
            }
            Err(e) => errors.push(e.into()),
        }

        match validate_email(account.email()) {
            Ok(()) => {
                let taken = self
                    .accounts
                    .get_by_email(account.email())
                    .await?
                    .is_some_and(|existing| existing.id() != account.id());
                if taken {
                    errors.push(IdentityError::duplicate_email(account.email()));
                }
            }
            Err(e) => errors.push(e.into()),
        }

        Ok(errors)
    }

    /// The stored copy of an account the caller holds
    async fn stored(&self, account: &Account) -> Result<Account, DomainError> {
        self.accounts
            .get(account.id())
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", account.id())))
    }

    fn verifies(&self, account: &Account, credential: &str) -> bool {
        account
            .password_hash()
            .is_some_and(|hash| self.hasher.verify(credential, hash))
    }

    fn sign_in_refusal(&self, account: &Account) -> Option<String> {
        if !account.status().can_sign_in() {
            return Some(format!(
                "Account '{}' is {}",
                account.id(),
                account.status().as_str()
            ));
        }

        if self.options.require_confirmed_email && !account.email_confirmed() {
            return Some(format!("Account '{}' has not confirmed its email", account.id()));
        }

        None
    }

    async fn start_session(
        &self,
        account: &Account,
        persistent: bool,
    ) -> Result<Session, DomainError> {
        let roles = self.roles(account).await?;
        self.accounts.record_sign_in(account.id()).await?;

        let session = self.sessions.start(account, roles, persistent).await?;
        info!(account_id = %account.id(), session_id = %session.id, persistent, "Signed in");
        Ok(session)
    }

    async fn change_memberships(
        &self,
        account: &Account,
        roles: &[String],
        change: MembershipChange,
    ) -> Result<MembershipOutcome, DomainError> {
        let account = self.stored(account).await?;
        let mut outcome = MembershipOutcome::new();
        let mut seen = HashSet::new();

        for requested in roles {
            if !seen.insert(normalize_key(requested)) {
                continue;
            }

            let role = match RoleName::new(requested) {
                Ok(role) => role,
                Err(e) => {
                    outcome.record_rejected(requested.as_str(), e.into());
                    continue;
                }
            };

            let Some(role) = self.roles.find(&role).await? else {
                outcome.record_rejected(role.as_str(), IdentityError::role_not_found(role.as_str()));
                continue;
            };

            let changed = match change {
                MembershipChange::Add => self.roles.add_member(account.id(), &role).await?,
                MembershipChange::Remove => self.roles.remove_member(account.id(), &role).await?,
            };

            match (changed, &change) {
                (true, _) => outcome.record_applied(role.as_str()),
                (false, MembershipChange::Add) => {
                    outcome.record_rejected(role.as_str(), IdentityError::already_in_role(role.as_str()))
                }
                (false, MembershipChange::Remove) => {
                    outcome.record_rejected(role.as_str(), IdentityError::not_in_role(role.as_str()))
                }
            }
        }

        debug!(
            account_id = %account.id(),
            applied = outcome.applied().len(),
            rejected = outcome.rejected().len(),
            "Membership change processed"
        );

        Ok(outcome)
    }
}

/// Store-level uniqueness races surface as the matching validation failure
fn duplicate_error(key: UniqueKey, message: String) -> IdentityError {
    let code = match key {
        UniqueKey::Email => IdentityErrorCode::DuplicateEmail,
        UniqueKey::UserName => IdentityErrorCode::DuplicateUserName,
        UniqueKey::Id => IdentityErrorCode::DuplicateAccount,
    };
    IdentityError::new(code, message)
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn create(
        &self,
        mut account: Account,
        credential: &str,
    ) -> Result<IdentityResult, DomainError> {
        let mut errors = self.check_account(&account).await?;
        errors.extend(
            self.options
                .password
                .validate(credential)
                .iter()
                .map(IdentityError::from),
        );

        if !errors.is_empty() {
            return Ok(IdentityResult::failed(errors));
        }

        account.set_password_hash(self.hasher.hash(credential)?);

        match self.accounts.create(account).await {
            Ok(account) => {
                info!(account_id = %account.id(), "Account created");
                Ok(IdentityResult::success())
            }
            Err(DomainError::Duplicate { key, message }) => {
                Ok(IdentityResult::failed([duplicate_error(key, message)]))
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, account: &Account) -> Result<IdentityResult, DomainError> {
        let errors = self.check_account(account).await?;
        if !errors.is_empty() {
            return Ok(IdentityResult::failed(errors));
        }

        match self.accounts.update(account).await {
            Ok(_) => Ok(IdentityResult::success()),
            Err(DomainError::Duplicate { key, message }) => {
                Ok(IdentityResult::failed([duplicate_error(key, message)]))
            }
            Err(DomainError::Conflict { .. }) => {
                Ok(IdentityResult::failed([IdentityError::concurrency_failure()]))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, DomainError> {
        // A malformed ID cannot name a stored account
        match AccountId::new(id) {
            Ok(id) => self.accounts.get(&id).await,
            Err(_) => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        self.accounts.get_by_email(email).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, DomainError> {
        self.accounts.get_by_user_name(name).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.accounts.count().await
    }

    async fn create_role(&self, role: &str) -> Result<IdentityResult, DomainError> {
        let role = match RoleName::new(role) {
            Ok(role) => role,
            Err(e) => return Ok(IdentityResult::failed([IdentityError::from(e)])),
        };

        match self.roles.create(role).await {
            Ok(role) => {
                info!(role = %role, "Role created");
                Ok(IdentityResult::success())
            }
            Err(DomainError::Conflict { message }) => Ok(IdentityResult::failed([
                IdentityError::new(IdentityErrorCode::DuplicateRoleName, message),
            ])),
            Err(e) => Err(e),
        }
    }

    async fn role_exists(&self, role: &str) -> Result<bool, DomainError> {
        match RoleName::new(role) {
            Ok(role) => self.roles.exists(&role).await,
            Err(_) => Ok(false),
        }
    }

    async fn add_to_role(
        &self,
        account: &Account,
        role: &str,
    ) -> Result<IdentityResult, DomainError> {
        let outcome = self
            .change_memberships(account, &[role.to_string()], MembershipChange::Add)
            .await?;
        Ok(outcome.to_identity_result())
    }

    async fn add_to_roles(
        &self,
        account: &Account,
        roles: &[String],
    ) -> Result<MembershipOutcome, DomainError> {
        self.change_memberships(account, roles, MembershipChange::Add)
            .await
    }

    async fn remove_from_roles(
        &self,
        account: &Account,
        roles: &[String],
    ) -> Result<MembershipOutcome, DomainError> {
        self.change_memberships(account, roles, MembershipChange::Remove)
            .await
    }

    async fn is_in_role(&self, account: &Account, role: &str) -> Result<bool, DomainError> {
        match RoleName::new(role) {
            Ok(role) => self.roles.is_member(account.id(), &role).await,
            Err(_) => Ok(false),
        }
    }

    async fn roles(&self, account: &Account) -> Result<Vec<String>, DomainError> {
        let roles = self.roles.roles_for(account.id()).await?;
        Ok(roles.into_iter().map(String::from).collect())
    }

    fn hash_credential(&self, _account: &Account, credential: &str) -> Result<String, DomainError> {
        self.hasher.hash(credential)
    }

    async fn check_credential(
        &self,
        account: &Account,
        credential: &str,
    ) -> Result<bool, DomainError> {
        let Some(stored) = self.accounts.get(account.id()).await? else {
            return Ok(false);
        };

        Ok(self.verifies(&stored, credential))
    }

    async fn sign_in(&self, account: &Account, persistent: bool) -> Result<Session, DomainError> {
        let account = self.stored(account).await?;

        if let Some(reason) = self.sign_in_refusal(&account) {
            return Err(DomainError::not_allowed(reason));
        }

        self.start_session(&account, persistent).await
    }

    async fn password_sign_in(
        &self,
        email: &str,
        credential: &str,
        persistent: bool,
    ) -> Result<SignInResult, DomainError> {
        let Some(account) = self.accounts.get_by_email(email).await? else {
            debug!("Password sign-in for unknown email");
            return Ok(SignInResult::Failed);
        };

        if !self.verifies(&account, credential) {
            debug!(account_id = %account.id(), "Password sign-in with wrong credential");
            return Ok(SignInResult::Failed);
        }

        if let Some(reason) = self.sign_in_refusal(&account) {
            debug!(account_id = %account.id(), reason = %reason, "Password sign-in not allowed");
            return Ok(SignInResult::NotAllowed);
        }

        let session = self.start_session(&account, persistent).await?;
        Ok(SignInResult::Succeeded(session))
    }

    async fn sign_out(&self) -> Result<(), DomainError> {
        if let Some(session) = self.sessions.end().await {
            info!(session_id = %session.id, "Signed out");
        }
        Ok(())
    }

    async fn current_principal(&self) -> Option<Principal> {
        self.sessions.current().await
    }

    async fn authenticate(&self, token: &str) -> Result<Option<Principal>, DomainError> {
        let Some(principal) = self.sessions.resolve(token).await else {
            return Ok(None);
        };

        // Tokens outlive status changes; re-check the stored account
        let account = match principal.account_id().map(AccountId::new) {
            Some(Ok(id)) => self.accounts.get(&id).await?,
            _ => None,
        };

        match account {
            Some(account) if self.sign_in_refusal(&account).is_none() => Ok(Some(principal)),
            _ => Ok(None),
        }
    }
}
