//! Identity provider port

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::principal::{Principal, Session, SignInResult};
use super::result::{IdentityResult, MembershipOutcome};
use crate::domain::DomainError;
use crate::domain::account::Account;

/// Everything the account directory delegates to
///
/// Validation problems with the caller's input are reported through
/// `IdentityResult` / `MembershipOutcome`; `Err` is reserved for faults and
/// for requests the provider refuses outright (missing account, account not
/// allowed to sign in).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account with the given plaintext credential
    async fn create(&self, account: Account, credential: &str)
    -> Result<IdentityResult, DomainError>;

    /// Persist changes to an existing account
    async fn update(&self, account: &Account) -> Result<IdentityResult, DomainError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    /// Find by login name
    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;

    async fn create_role(&self, role: &str) -> Result<IdentityResult, DomainError>;

    async fn role_exists(&self, role: &str) -> Result<bool, DomainError>;

    async fn add_to_role(&self, account: &Account, role: &str)
    -> Result<IdentityResult, DomainError>;

    async fn add_to_roles(
        &self,
        account: &Account,
        roles: &[String],
    ) -> Result<MembershipOutcome, DomainError>;

    async fn remove_from_roles(
        &self,
        account: &Account,
        roles: &[String],
    ) -> Result<MembershipOutcome, DomainError>;

    async fn is_in_role(&self, account: &Account, role: &str) -> Result<bool, DomainError>;

    /// Role names of an account, sorted by name
    async fn roles(&self, account: &Account) -> Result<Vec<String>, DomainError>;

    /// Hash a credential in the provider's stored format
    fn hash_credential(&self, account: &Account, credential: &str)
    -> Result<String, DomainError>;

    /// Check a credential against the account's stored hash
    async fn check_credential(
        &self,
        account: &Account,
        credential: &str,
    ) -> Result<bool, DomainError>;

    /// Establish a session for the account
    async fn sign_in(&self, account: &Account, persistent: bool) -> Result<Session, DomainError>;

    /// Look up an account by email, verify the credential, then sign in
    async fn password_sign_in(
        &self,
        email: &str,
        credential: &str,
        persistent: bool,
    ) -> Result<SignInResult, DomainError>;

    /// Terminate the current session, if any
    async fn sign_out(&self) -> Result<(), DomainError>;

    /// Principal of the current session
    async fn current_principal(&self) -> Option<Principal>;

    /// Resolve a bearer token to its principal while its session is live
    async fn authenticate(&self, token: &str) -> Result<Option<Principal>, DomainError>;
}
