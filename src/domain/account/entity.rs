//! Account entity and related types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{AccountValidationError, validate_account_id};

/// Account identifier - opaque string, UUID v4 when generated
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create an AccountId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, AccountValidationError> {
        let id = id.into();
        validate_account_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account is approved and can sign in
    #[default]
    Active,
    /// Registration awaiting approval by an administrator
    Pending,
    /// Access revoked
    Suspended,
}

impl AccountStatus {
    pub fn can_sign_in(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
        }
    }

    /// Parse a stored status; unknown values map to `Pending`
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "suspended" => Self::Suspended,
            _ => Self::Pending,
        }
    }
}

/// Normalized form used for case-insensitive lookups
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A user identity record with credential and profile fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    /// Login name
    user_name: String,
    email: String,
    #[serde(default)]
    email_confirmed: bool,
    /// Argon2 PHC string, set by the identity provider - never serialized
    #[serde(skip_serializing, default)]
    password_hash: Option<String>,
    #[serde(default)]
    status: AccountStatus,
    /// Regenerated on every persisted update
    concurrency_stamp: String,
    /// Fields owned by the host application
    #[serde(default)]
    profile: BTreeMap<String, String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    last_sign_in_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account with a generated ID
    pub fn new(user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(AccountId::generate(), user_name, email)
    }

    /// Create a new account with a known ID
    pub fn with_id(id: AccountId, user_name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id,
            user_name: user_name.into(),
            email: email.into(),
            email_confirmed: false,
            password_hash: None,
            status: AccountStatus::Active,
            concurrency_stamp: Uuid::new_v4().to_string(),
            profile: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            last_sign_in_at: None,
        }
    }

    /// Account whose login name is its email, as the condominium app registers residents
    pub fn from_email(email: impl Into<String>) -> Self {
        let email = email.into();
        Self::new(email.clone(), email)
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_email_confirmed(mut self, confirmed: bool) -> Self {
        self.email_confirmed = confirmed;
        self
    }

    pub fn with_profile_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.profile.insert(key.into(), value.into());
        self
    }

    // Getters

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn normalized_user_name(&self) -> String {
        normalize_key(&self.user_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn normalized_email(&self) -> String {
        normalize_key(&self.email)
    }

    pub fn email_confirmed(&self) -> bool {
        self.email_confirmed
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn concurrency_stamp(&self) -> &str {
        &self.concurrency_stamp
    }

    pub fn profile(&self) -> &BTreeMap<String, String> {
        &self.profile
    }

    pub fn profile_value(&self, key: &str) -> Option<&str> {
        self.profile.get(key).map(String::as_str)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_sign_in_at(&self) -> Option<DateTime<Utc>> {
        self.last_sign_in_at
    }

    pub fn is_active(&self) -> bool {
        self.status.can_sign_in()
    }

    // Mutators

    pub fn set_user_name(&mut self, user_name: impl Into<String>) {
        self.user_name = user_name.into();
        self.touch();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_confirmed = false;
        self.touch();
    }

    pub fn confirm_email(&mut self) {
        self.email_confirmed = true;
        self.touch();
    }

    pub fn set_status(&mut self, status: AccountStatus) {
        self.status = status;
        self.touch();
    }

    pub fn set_profile_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.profile.insert(key.into(), value.into());
        self.touch();
    }

    pub fn remove_profile_value(&mut self, key: &str) -> Option<String> {
        let removed = self.profile.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    // Provider-side state

    pub(crate) fn set_password_hash(&mut self, hash: impl Into<String>) {
        self.password_hash = Some(hash.into());
        self.touch();
    }

    pub(crate) fn rotate_concurrency_stamp(&mut self) {
        self.concurrency_stamp = Uuid::new_v4().to_string();
    }

    pub(crate) fn record_sign_in(&mut self) {
        self.last_sign_in_at = Some(Utc::now());
    }

    /// Take the credential and sign-in history from the stored copy
    ///
    /// Updates never write these from the caller's copy, which may have been
    /// deserialized without the hash or read before the last sign-in.
    pub(crate) fn keep_stored_state(&mut self, stored: &Account) {
        self.password_hash = stored.password_hash.clone();
        self.created_at = stored.created_at;
        self.last_sign_in_at = stored.last_sign_in_at;
    }

    /// Rebuild stored state that the public constructors always reset
    pub(crate) fn restore(
        mut self,
        password_hash: Option<String>,
        concurrency_stamp: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_sign_in_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.password_hash = password_hash;
        self.concurrency_stamp = concurrency_stamp;
        self.created_at = created_at;
        self.updated_at = updated_at;
        self.last_sign_in_at = last_sign_in_at;
        self
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
