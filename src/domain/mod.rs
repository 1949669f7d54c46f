//! Domain layer - accounts, roles and the identity provider port

pub mod account;
pub mod error;
pub mod identity;
pub mod role;

pub use account::{Account, AccountId, AccountRepository, AccountStatus, PasswordPolicy};
pub use error::{DomainError, UniqueKey};
pub use identity::{
    IdentityError, IdentityErrorCode, IdentityProvider, IdentityResult, MembershipOutcome,
    Principal, Session, SignInResult,
};
pub use role::{RoleName, RoleRepository};
