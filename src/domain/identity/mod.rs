//! Identity domain
//!
//! The provider port the directory delegates to, plus the outcome, principal
//! and session types that cross it.

mod principal;
mod provider;
mod result;

pub use principal::{Principal, Session, SignInResult};
pub use provider::IdentityProvider;
pub use result::{
    IdentityError, IdentityErrorCode, IdentityResult, MembershipOutcome, RoleChange,
    RoleChangeStatus,
};

#[cfg(test)]
pub use provider::MockIdentityProvider;
