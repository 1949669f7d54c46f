//! Outcome types reported by account mutations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::account::AccountValidationError;
use crate::domain::role::RoleValidationError;

/// Machine-readable reason an identity operation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityErrorCode {
    InvalidAccountId,
    InvalidEmail,
    DuplicateEmail,
    InvalidUserName,
    DuplicateUserName,
    DuplicateAccount,
    PasswordRequired,
    PasswordTooShort,
    PasswordRequiresDigit,
    PasswordRequiresLower,
    PasswordRequiresUpper,
    PasswordRequiresNonAlphanumeric,
    PasswordRequiresUniqueChars,
    InvalidRoleName,
    DuplicateRoleName,
    RoleNotFound,
    UserAlreadyInRole,
    UserNotInRole,
    ConcurrencyFailure,
}

impl fmt::Display for IdentityErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single rejection reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityError {
    pub code: IdentityErrorCode,
    pub description: String,
}

impl IdentityError {
    pub fn new(code: IdentityErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn duplicate_email(email: &str) -> Self {
        Self::new(
            IdentityErrorCode::DuplicateEmail,
            format!("Email '{}' is already taken", email),
        )
    }

    pub fn duplicate_user_name(user_name: &str) -> Self {
        Self::new(
            IdentityErrorCode::DuplicateUserName,
            format!("User name '{}' is already taken", user_name),
        )
    }

    pub fn role_not_found(role: &str) -> Self {
        Self::new(
            IdentityErrorCode::RoleNotFound,
            format!("Role '{}' does not exist", role),
        )
    }

    pub fn already_in_role(role: &str) -> Self {
        Self::new(
            IdentityErrorCode::UserAlreadyInRole,
            format!("User already in role '{}'", role),
        )
    }

    pub fn not_in_role(role: &str) -> Self {
        Self::new(
            IdentityErrorCode::UserNotInRole,
            format!("User is not in role '{}'", role),
        )
    }

    pub fn concurrency_failure() -> Self {
        Self::new(
            IdentityErrorCode::ConcurrencyFailure,
            "Optimistic concurrency failure, account has been modified",
        )
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl From<&AccountValidationError> for IdentityError {
    fn from(error: &AccountValidationError) -> Self {
        use AccountValidationError as E;

        let code = match error {
            E::EmptyId | E::IdTooLong(_) | E::InvalidIdCharacter(_) => {
                IdentityErrorCode::InvalidAccountId
            }
            E::EmptyEmail | E::EmailTooLong(_) | E::InvalidEmail(_) => {
                IdentityErrorCode::InvalidEmail
            }
            E::EmptyUserName | E::UserNameTooLong(_) | E::InvalidUserNameCharacter(_) => {
                IdentityErrorCode::InvalidUserName
            }
            E::PasswordRequired => IdentityErrorCode::PasswordRequired,
            E::PasswordTooShort(_) => IdentityErrorCode::PasswordTooShort,
            E::PasswordRequiresDigit => IdentityErrorCode::PasswordRequiresDigit,
            E::PasswordRequiresLower => IdentityErrorCode::PasswordRequiresLower,
            E::PasswordRequiresUpper => IdentityErrorCode::PasswordRequiresUpper,
            E::PasswordRequiresNonAlphanumeric => {
                IdentityErrorCode::PasswordRequiresNonAlphanumeric
            }
            E::PasswordRequiresUniqueChars(_) => IdentityErrorCode::PasswordRequiresUniqueChars,
        };

        Self::new(code, error.to_string())
    }
}

impl From<AccountValidationError> for IdentityError {
    fn from(error: AccountValidationError) -> Self {
        Self::from(&error)
    }
}

impl From<RoleValidationError> for IdentityError {
    fn from(error: RoleValidationError) -> Self {
        Self::new(IdentityErrorCode::InvalidRoleName, error.to_string())
    }
}

/// Outcome of an account mutation: success, or every reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResult {
    succeeded: bool,
    errors: Vec<IdentityError>,
}

impl IdentityResult {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            errors: Vec::new(),
        }
    }

    /// A failed result; an empty error list still counts as failure
    pub fn failed(errors: impl IntoIterator<Item = IdentityError>) -> Self {
        Self {
            succeeded: false,
            errors: errors.into_iter().collect(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn errors(&self) -> &[IdentityError] {
        &self.errors
    }

    pub fn has_error(&self, code: IdentityErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Turn a rejection into `DomainError::Rejected`
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.succeeded {
            Ok(())
        } else {
            Err(DomainError::rejected(self.to_string()))
        }
    }
}

impl fmt::Display for IdentityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            return write!(f, "Succeeded");
        }

        let codes: Vec<String> = self.errors.iter().map(|e| e.code.to_string()).collect();
        write!(f, "Failed : {}", codes.join(","))
    }
}

/// What happened to one role in a batch membership change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoleChangeStatus {
    Applied,
    Rejected { error: IdentityError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub role: String,
    #[serde(flatten)]
    pub status: RoleChangeStatus,
}

/// Per-role result of adding or removing a set of roles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipOutcome {
    changes: Vec<RoleChange>,
}

impl MembershipOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&mut self, role: impl Into<String>) {
        self.changes.push(RoleChange {
            role: role.into(),
            status: RoleChangeStatus::Applied,
        });
    }

    pub fn record_rejected(&mut self, role: impl Into<String>, error: IdentityError) {
        self.changes.push(RoleChange {
            role: role.into(),
            status: RoleChangeStatus::Rejected { error },
        });
    }

    pub fn changes(&self) -> &[RoleChange] {
        &self.changes
    }

    /// True when every requested role was applied
    pub fn succeeded(&self) -> bool {
        self.changes
            .iter()
            .all(|c| matches!(c.status, RoleChangeStatus::Applied))
    }

    pub fn applied(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter(|c| matches!(c.status, RoleChangeStatus::Applied))
            .map(|c| c.role.as_str())
            .collect()
    }

    pub fn rejected(&self) -> Vec<(&str, &IdentityError)> {
        self.changes
            .iter()
            .filter_map(|c| match &c.status {
                RoleChangeStatus::Rejected { error } => Some((c.role.as_str(), error)),
                RoleChangeStatus::Applied => None,
            })
            .collect()
    }

    /// Collapse into an `IdentityResult` carrying every rejection
    pub fn to_identity_result(&self) -> IdentityResult {
        if self.succeeded() {
            IdentityResult::success()
        } else {
            IdentityResult::failed(self.rejected().into_iter().map(|(_, e)| e.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_display() {
        assert_eq!(IdentityResult::success().to_string(), "Succeeded");
        assert!(IdentityResult::success().into_result().is_ok());
    }

    #[test]
    fn test_failed_display_lists_codes() {
        let result = IdentityResult::failed(vec![
            IdentityError::duplicate_email("a@x.com"),
            IdentityError::from(AccountValidationError::PasswordRequiresDigit),
        ]);

        assert!(!result.succeeded());
        assert!(result.has_error(IdentityErrorCode::DuplicateEmail));
        assert_eq!(
            result.to_string(),
            "Failed : DuplicateEmail,PasswordRequiresDigit"
        );
    }

    #[test]
    fn test_failed_into_rejected_error() {
        let err = IdentityResult::failed(vec![IdentityError::role_not_found("ghost")])
            .into_result()
            .unwrap_err();

        assert!(matches!(err, DomainError::Rejected { .. }));
        assert!(err.to_string().contains("RoleNotFound"));
    }

    #[test]
    fn test_validation_error_codes() {
        let error = IdentityError::from(AccountValidationError::InvalidEmail("x".into()));
        assert_eq!(error.code, IdentityErrorCode::InvalidEmail);

        let error = IdentityError::from(RoleValidationError::Empty);
        assert_eq!(error.code, IdentityErrorCode::InvalidRoleName);
    }

    #[test]
    fn test_membership_outcome_partial() {
        let mut outcome = MembershipOutcome::new();
        outcome.record_applied("Resident");
        outcome.record_rejected("Ghost", IdentityError::role_not_found("Ghost"));

        assert!(!outcome.succeeded());
        assert_eq!(outcome.applied(), vec!["Resident"]);

        let rejected = outcome.rejected();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "Ghost");
        assert_eq!(rejected[0].1.code, IdentityErrorCode::RoleNotFound);

        let result = outcome.to_identity_result();
        assert!(!result.succeeded());
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_empty_outcome_succeeds() {
        assert!(MembershipOutcome::new().succeeded());
    }

    #[test]
    fn test_role_change_serialization() {
        let mut outcome = MembershipOutcome::new();
        outcome.record_applied("Manager");

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["changes"][0]["role"], "Manager");
        assert_eq!(json["changes"][0]["status"], "applied");
    }
}
