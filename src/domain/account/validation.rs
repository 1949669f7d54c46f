//! Account validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during account validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountValidationError {
    #[error("Account ID cannot be empty")]
    EmptyId,

    #[error("Account ID exceeds maximum length of {0} characters")]
    IdTooLong(usize),

    #[error("Account ID contains invalid character: '{0}'")]
    InvalidIdCharacter(char),

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email '{0}' is invalid")]
    InvalidEmail(String),

    #[error("User name cannot be empty")]
    EmptyUserName,

    #[error("User name exceeds maximum length of {0} characters")]
    UserNameTooLong(usize),

    #[error("User name contains invalid character: '{0}'")]
    InvalidUserNameCharacter(char),

    #[error("A password is required")]
    PasswordRequired,

    #[error("Passwords must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Passwords must have at least one digit ('0'-'9')")]
    PasswordRequiresDigit,

    #[error("Passwords must have at least one lowercase ('a'-'z')")]
    PasswordRequiresLower,

    #[error("Passwords must have at least one uppercase ('A'-'Z')")]
    PasswordRequiresUpper,

    #[error("Passwords must have at least one non alphanumeric character")]
    PasswordRequiresNonAlphanumeric,

    #[error("Passwords must use at least {0} different characters")]
    PasswordRequiresUniqueChars(usize),
}

const MAX_ACCOUNT_ID_LENGTH: usize = 64;
const MAX_EMAIL_LENGTH: usize = 256;
const MAX_USER_NAME_LENGTH: usize = 256;

/// Characters accepted in login names besides ASCII alphanumerics
const USER_NAME_EXTRA_CHARS: &str = "-._@+";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Validate an account ID
///
/// Rules:
/// - Cannot be empty
/// - Maximum 64 characters
/// - Only ASCII alphanumerics, hyphens and underscores
pub fn validate_account_id(id: &str) -> Result<(), AccountValidationError> {
    if id.is_empty() {
        return Err(AccountValidationError::EmptyId);
    }

    if id.len() > MAX_ACCOUNT_ID_LENGTH {
        return Err(AccountValidationError::IdTooLong(MAX_ACCOUNT_ID_LENGTH));
    }

    if let Some(c) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
    {
        return Err(AccountValidationError::InvalidIdCharacter(c));
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.trim().is_empty() {
        return Err(AccountValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AccountValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !EMAIL_PATTERN.is_match(email) {
        return Err(AccountValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Validate a login name
///
/// Rules:
/// - Cannot be empty
/// - Maximum 256 characters
/// - Only ASCII alphanumerics and `-._@+`
pub fn validate_user_name(user_name: &str) -> Result<(), AccountValidationError> {
    if user_name.is_empty() {
        return Err(AccountValidationError::EmptyUserName);
    }

    if user_name.len() > MAX_USER_NAME_LENGTH {
        return Err(AccountValidationError::UserNameTooLong(MAX_USER_NAME_LENGTH));
    }

    for c in user_name.chars() {
        if !c.is_ascii_alphanumeric() && !USER_NAME_EXTRA_CHARS.contains(c) {
            return Err(AccountValidationError::InvalidUserNameCharacter(c));
        }
    }

    Ok(())
}

/// Password strength rules applied when an account is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub required_unique_chars: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            required_unique_chars: 1,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

impl PasswordPolicy {
    /// Policy that accepts any non-empty password
    pub fn relaxed() -> Self {
        Self {
            min_length: 1,
            required_unique_chars: 1,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
            require_non_alphanumeric: false,
        }
    }

    /// Check a password against every rule, collecting all violations
    pub fn validate(&self, password: &str) -> Vec<AccountValidationError> {
        if password.is_empty() {
            return vec![AccountValidationError::PasswordRequired];
        }

        let mut errors = Vec::new();

        if password.chars().count() < self.min_length {
            errors.push(AccountValidationError::PasswordTooShort(self.min_length));
        }

        if self.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
            errors.push(AccountValidationError::PasswordRequiresNonAlphanumeric);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(AccountValidationError::PasswordRequiresDigit);
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push(AccountValidationError::PasswordRequiresLower);
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push(AccountValidationError::PasswordRequiresUpper);
        }

        let mut unique: Vec<char> = password.chars().collect();
        unique.sort_unstable();
        unique.dedup();

        if unique.len() < self.required_unique_chars {
            errors.push(AccountValidationError::PasswordRequiresUniqueChars(
                self.required_unique_chars,
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_account_ids() {
        assert!(validate_account_id("0b5c3f9e-8a51-4a8b-9c51-2f1d2a3b4c5d").is_ok());
        assert!(validate_account_id("admin_1").is_ok());
    }

    #[test]
    fn test_invalid_account_ids() {
        assert_eq!(validate_account_id(""), Err(AccountValidationError::EmptyId));
        assert_eq!(
            validate_account_id(&"a".repeat(65)),
            Err(AccountValidationError::IdTooLong(64))
        );
        assert_eq!(
            validate_account_id("bad id"),
            Err(AccountValidationError::InvalidIdCharacter(' '))
        );
    }

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("sindico.bloco-b@condominio.com.br").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(validate_email(""), Err(AccountValidationError::EmptyEmail));
        assert_eq!(validate_email("   "), Err(AccountValidationError::EmptyEmail));
        assert!(matches!(
            validate_email("no-at-sign.com"),
            Err(AccountValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("two@@x.com"),
            Err(AccountValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_user_names() {
        assert!(validate_user_name("a@x.com").is_ok());
        assert!(validate_user_name("john.doe+1").is_ok());
        assert_eq!(
            validate_user_name(""),
            Err(AccountValidationError::EmptyUserName)
        );
        assert_eq!(
            validate_user_name("john doe"),
            Err(AccountValidationError::InvalidUserNameCharacter(' '))
        );
    }

    #[test]
    fn test_default_policy_accepts_strong_password() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Secr3t!23").is_empty());
    }

    #[test]
    fn test_default_policy_reports_every_violation() {
        let policy = PasswordPolicy::default();
        let errors = policy.validate("abc");

        assert!(errors.contains(&AccountValidationError::PasswordTooShort(6)));
        assert!(errors.contains(&AccountValidationError::PasswordRequiresNonAlphanumeric));
        assert!(errors.contains(&AccountValidationError::PasswordRequiresDigit));
        assert!(errors.contains(&AccountValidationError::PasswordRequiresUpper));
        assert!(!errors.contains(&AccountValidationError::PasswordRequiresLower));
    }

    #[test]
    fn test_empty_password_is_required() {
        let policy = PasswordPolicy::relaxed();
        assert_eq!(
            policy.validate(""),
            vec![AccountValidationError::PasswordRequired]
        );
    }

    #[test]
    fn test_unique_chars() {
        let policy = PasswordPolicy {
            required_unique_chars: 3,
            ..PasswordPolicy::relaxed()
        };

        assert_eq!(
            policy.validate("aaaaaa"),
            vec![AccountValidationError::PasswordRequiresUniqueChars(3)]
        );
        assert!(policy.validate("abcabc").is_empty());
    }
}
