//! Error returned by every directory operation

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::DomainError;

/// Which directory operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryOperation {
    Create,
    AssignRole,
    AssignRoles,
    RemoveRoles,
    CheckRole,
    ListRoles,
    SignIn,
    SignOut,
    FindByEmail,
    FindById,
    FindByPrincipal,
    Update,
    HashCredential,
    CheckCredential,
    Count,
    CreateRole,
    RoleExists,
    PasswordSignIn,
    Authenticate,
}

impl DirectoryOperation {
    /// Stable kebab-case label, used in logs and for programmatic matching
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::AssignRole => "assign-role",
            Self::AssignRoles => "assign-roles",
            Self::RemoveRoles => "remove-roles",
            Self::CheckRole => "check-role",
            Self::ListRoles => "list-roles",
            Self::SignIn => "sign-in",
            Self::SignOut => "sign-out",
            Self::FindByEmail => "find-by-email",
            Self::FindById => "find-by-id",
            Self::FindByPrincipal => "find-by-principal",
            Self::Update => "update",
            Self::HashCredential => "hash-credential",
            Self::CheckCredential => "check-credential",
            Self::Count => "count",
            Self::CreateRole => "create-role",
            Self::RoleExists => "role-exists",
            Self::PasswordSignIn => "password-sign-in",
            Self::Authenticate => "authenticate",
        }
    }

    /// Human-readable description of the failure
    pub fn message(&self) -> &'static str {
        match self {
            Self::Create => "Failed to create account",
            Self::AssignRole => "Failed to assign role to account",
            Self::AssignRoles => "Failed to assign roles to account",
            Self::RemoveRoles => "Failed to remove roles from account",
            Self::CheckRole => "Failed to check account role",
            Self::ListRoles => "Failed to list account roles",
            Self::SignIn => "Failed to sign in",
            Self::SignOut => "Failed to sign out",
            Self::FindByEmail => "Failed to find account by email",
            Self::FindById => "Failed to find account by ID",
            Self::FindByPrincipal => "Failed to find account for current principal",
            Self::Update => "Failed to update account",
            Self::HashCredential => "Failed to hash credential",
            Self::CheckCredential => "Failed to check credential",
            Self::Count => "Failed to count accounts",
            Self::CreateRole => "Failed to create role",
            Self::RoleExists => "Failed to check role existence",
            Self::PasswordSignIn => "Failed to sign in with password",
            Self::Authenticate => "Failed to authenticate session token",
        }
    }
}

impl fmt::Display for DirectoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A provider failure, tagged with the operation that hit it
#[derive(Debug, Error)]
#[error("{}: {source}", .operation.message())]
pub struct DirectoryError {
    pub operation: DirectoryOperation,
    #[source]
    pub source: DomainError,
}

impl DirectoryError {
    pub fn new(operation: DirectoryOperation, source: DomainError) -> Self {
        Self { operation, source }
    }

    pub fn operation(&self) -> DirectoryOperation {
        self.operation
    }

    /// The wrapped provider error
    pub fn cause(&self) -> &DomainError {
        &self.source
    }

    pub fn into_cause(self) -> DomainError {
        self.source
    }
}
