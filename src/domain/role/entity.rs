//! Role name type

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::account::normalize_key;

const MAX_ROLE_NAME_LENGTH: usize = 256;

/// Errors that can occur during role validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoleValidationError {
    #[error("Role name cannot be empty")]
    Empty,

    #[error("Role name exceeds maximum length of {0} characters")]
    TooLong(usize),
}

/// Named permission group, compared case-insensitively by the stores
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    pub const ADMINISTRATOR: &'static str = "Administrator";
    pub const MANAGER: &'static str = "Manager";
    pub const RESIDENT: &'static str = "Resident";

    /// Create a role name; surrounding whitespace is dropped
    pub fn new(name: impl AsRef<str>) -> Result<Self, RoleValidationError> {
        let name = name.as_ref().trim();

        if name.is_empty() {
            return Err(RoleValidationError::Empty);
        }

        if name.chars().count() > MAX_ROLE_NAME_LENGTH {
            return Err(RoleValidationError::TooLong(MAX_ROLE_NAME_LENGTH));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key
    pub fn normalized(&self) -> String {
        normalize_key(&self.0)
    }

    /// Roles every condominium directory starts with
    pub fn defaults() -> Vec<RoleName> {
        [Self::ADMINISTRATOR, Self::MANAGER, Self::RESIDENT]
            .into_iter()
            .map(|name| Self(name.to_string()))
            .collect()
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(role: RoleName) -> Self {
        role.0
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
