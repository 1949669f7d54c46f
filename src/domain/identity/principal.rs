//! Authenticated identity and session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::account::normalize_key;

/// The identity carried by a session or request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    /// Name claim; the login name of the account
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

impl Principal {
    /// A principal with no claims
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A principal carrying only a name claim
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn new(
        account_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            account_id: Some(account_id.into()),
            name: Some(name.into()),
            email: Some(email.into()),
            roles,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        let wanted = normalize_key(role);
        self.roles.iter().any(|r| normalize_key(r) == wanted)
    }
}

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Bearer token presented on later requests
    pub token: String,
    pub principal: Principal,
    /// Survives the browser session ("remember me")
    pub persistent: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of signing in with a password
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    Succeeded(Session),
    /// Unknown account or wrong password
    Failed,
    /// Credentials were right but the account may not sign in
    NotAllowed,
}

impl SignInResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Succeeded(session) => Some(session),
            _ => None,
        }
    }
}
