//! Account directory: the narrow API the application talks to

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{DirectoryError, DirectoryOperation};
use crate::domain::DomainError;
use crate::domain::account::{Account, normalize_key};
use crate::domain::identity::{
    IdentityProvider, IdentityResult, MembershipOutcome, Principal, Session, SignInResult,
};

/// Log a provider failure and tag it with the operation
fn fail(operation: DirectoryOperation) -> impl FnOnce(DomainError) -> DirectoryError {
    move |source| {
        warn!(operation = %operation, error = %source, "Identity provider call failed");
        DirectoryError::new(operation, source)
    }
}

/// Role names with case-insensitive duplicates dropped, first spelling kept
fn distinct_roles<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    roles
        .into_iter()
        .map(|role| role.as_ref().to_string())
        .filter(|role| seen.insert(normalize_key(role)))
        .collect()
}

/// Account lifecycle, role membership, sessions and credential hashing
///
/// Every call delegates to the injected [`IdentityProvider`]. Provider
/// failures come back as [`DirectoryError`] tagged with the operation;
/// lookups that find nothing return `Ok(None)`.
#[derive(Clone)]
pub struct AccountDirectory {
    provider: Arc<dyn IdentityProvider>,
}

impl Debug for AccountDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDirectory").finish_non_exhaustive()
    }
}

impl AccountDirectory {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Register an account with a plaintext credential
    ///
    /// Validation problems (weak password, malformed or taken email) are
    /// reported in the returned `IdentityResult`, not as an error.
    pub async fn create_account(
        &self,
        account: Account,
        credential: &str,
    ) -> Result<IdentityResult, DirectoryError> {
        let id = account.id().clone();
        let result = self
            .provider
            .create(account, credential)
            .await
            .map_err(fail(DirectoryOperation::Create))?;

        if result.succeeded() {
            info!(account_id = %id, "Account registered");
        } else {
            info!(account_id = %id, result = %result, "Account registration rejected");
        }

        Ok(result)
    }

    /// Add the account to one role; a rejection (unknown role, already a member) is an error
    pub async fn assign_role(&self, account: &Account, role: &str) -> Result<(), DirectoryError> {
        self.provider
            .add_to_role(account, role)
            .await
            .and_then(IdentityResult::into_result)
            .map_err(fail(DirectoryOperation::AssignRole))?;

        info!(account_id = %account.id(), role = %role, "Role assigned");
        Ok(())
    }

    /// Add the account to a set of roles, reporting the outcome per role
    pub async fn assign_roles<I, S>(
        &self,
        account: &Account,
        roles: I,
    ) -> Result<MembershipOutcome, DirectoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = distinct_roles(roles);
        let outcome = self
            .provider
            .add_to_roles(account, &roles)
            .await
            .map_err(fail(DirectoryOperation::AssignRoles))?;

        info!(
            account_id = %account.id(),
            applied = ?outcome.applied(),
            rejected = outcome.rejected().len(),
            "Roles assigned"
        );
        Ok(outcome)
    }

    /// Remove the account from a set of roles, reporting the outcome per role
    pub async fn remove_roles<I, S>(
        &self,
        account: &Account,
        roles: I,
    ) -> Result<MembershipOutcome, DirectoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = distinct_roles(roles);
        let outcome = self
            .provider
            .remove_from_roles(account, &roles)
            .await
            .map_err(fail(DirectoryOperation::RemoveRoles))?;

        info!(
            account_id = %account.id(),
            removed = ?outcome.applied(),
            rejected = outcome.rejected().len(),
            "Roles removed"
        );
        Ok(outcome)
    }

    pub async fn is_in_role(&self, account: &Account, role: &str) -> Result<bool, DirectoryError> {
        self.provider
            .is_in_role(account, role)
            .await
            .map_err(fail(DirectoryOperation::CheckRole))
    }

    /// Role names of the account, sorted by name
    pub async fn list_roles(&self, account: &Account) -> Result<Vec<String>, DirectoryError> {
        self.provider
            .roles(account)
            .await
            .map_err(fail(DirectoryOperation::ListRoles))
    }

    /// Establish a session for an account; `persistent` keeps it beyond the browser session
    pub async fn sign_in(
        &self,
        account: &Account,
        persistent: bool,
    ) -> Result<Session, DirectoryError> {
        self.provider
            .sign_in(account, persistent)
            .await
            .map_err(fail(DirectoryOperation::SignIn))
    }

    /// Verify an email and password pair, then sign in
    pub async fn password_sign_in(
        &self,
        email: &str,
        credential: &str,
        persistent: bool,
    ) -> Result<SignInResult, DirectoryError> {
        self.provider
            .password_sign_in(email, credential, persistent)
            .await
            .map_err(fail(DirectoryOperation::PasswordSignIn))
    }

    /// End the current session; signing out with no session is a no-op
    pub async fn sign_out(&self) -> Result<(), DirectoryError> {
        self.provider
            .sign_out()
            .await
            .map_err(fail(DirectoryOperation::SignOut))
    }

    pub async fn current_principal(&self) -> Option<Principal> {
        self.provider.current_principal().await
    }

    /// Resolve a session token presented by a caller
    pub async fn authenticate(&self, token: &str) -> Result<Option<Principal>, DirectoryError> {
        self.provider
            .authenticate(token)
            .await
            .map_err(fail(DirectoryOperation::Authenticate))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DirectoryError> {
        let account = self
            .provider
            .find_by_email(email)
            .await
            .map_err(fail(DirectoryOperation::FindByEmail))?;

        debug!(found = account.is_some(), "Lookup by email");
        Ok(account)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Account>, DirectoryError> {
        let account = self
            .provider
            .find_by_id(id)
            .await
            .map_err(fail(DirectoryOperation::FindById))?;

        debug!(account_id = %id, found = account.is_some(), "Lookup by ID");
        Ok(account)
    }

    /// Account named by the principal's name claim
    pub async fn find_by_current_principal(
        &self,
        principal: &Principal,
    ) -> Result<Option<Account>, DirectoryError> {
        let name = principal.name().ok_or_else(|| {
            fail(DirectoryOperation::FindByPrincipal)(DomainError::validation(
                "Principal carries no name claim",
            ))
        })?;

        let account = self
            .provider
            .find_by_name(name)
            .await
            .map_err(fail(DirectoryOperation::FindByPrincipal))?;

        debug!(name = %name, found = account.is_some(), "Lookup by principal");
        Ok(account)
    }

    /// Persist changes to an existing account
    ///
    /// Fails when the account is missing, its concurrency stamp is stale, or
    /// its new email or login name is taken.
    pub async fn update_account(&self, account: &Account) -> Result<(), DirectoryError> {
        self.provider
            .update(account)
            .await
            .and_then(IdentityResult::into_result)
            .map_err(fail(DirectoryOperation::Update))?;

        info!(account_id = %account.id(), "Account updated");
        Ok(())
    }

    /// Hash a credential in the provider's format; salted, so repeated calls differ
    pub fn hash_credential(
        &self,
        account: &Account,
        plaintext: &str,
    ) -> Result<String, DirectoryError> {
        self.provider
            .hash_credential(account, plaintext)
            .map_err(fail(DirectoryOperation::HashCredential))
    }

    /// Whether the credential matches the account's stored hash
    pub async fn check_credential(
        &self,
        account: &Account,
        plaintext: &str,
    ) -> Result<bool, DirectoryError> {
        self.provider
            .check_credential(account, plaintext)
            .await
            .map_err(fail(DirectoryOperation::CheckCredential))
    }

    pub async fn count_accounts(&self) -> Result<usize, DirectoryError> {
        self.provider
            .count()
            .await
            .map_err(fail(DirectoryOperation::Count))
    }

    /// Define a new role
    pub async fn create_role(&self, role: &str) -> Result<IdentityResult, DirectoryError> {
        let result = self
            .provider
            .create_role(role)
            .await
            .map_err(fail(DirectoryOperation::CreateRole))?;

        if result.succeeded() {
            info!(role = %role, "Role defined");
        }
        Ok(result)
    }

    pub async fn role_exists(&self, role: &str) -> Result<bool, DirectoryError> {
        self.provider
            .role_exists(role)
            .await
            .map_err(fail(DirectoryOperation::RoleExists))
    }
}
