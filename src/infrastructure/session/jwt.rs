//! JWT-backed sessions with server-side revocation

use std::fmt::Debug;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::account::Account;
use crate::domain::identity::{Principal, Session};

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Login name
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Session ID, checked against the current session on every request
    pub sid: String,
    #[serde(default)]
    pub persistent: bool,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl SessionClaims {
    fn new(
        account: &Account,
        roles: Vec<String>,
        persistent: bool,
        lifetime_hours: u64,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        let exp = i64::try_from(lifetime_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "Session lifetime of {} hours is out of range",
                    lifetime_hours
                ))
            })?;

        Ok(Self {
            sub: account.id().as_str().to_string(),
            name: account.user_name().to_string(),
            email: account.email().to_string(),
            roles,
            sid: Uuid::new_v4().to_string(),
            persistent,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    pub fn to_principal(&self) -> Principal {
        Principal::new(&self.sub, &self.name, &self.email, self.roles.clone()).with_session(&self.sid)
    }
}

/// Session token settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HS256 signing secret; a random one is generated at startup when empty
    pub secret: String,
    /// Lifetime of a regular session
    pub expiration_hours: u64,
    /// Lifetime of a "remember me" session
    pub persistent_expiration_hours: u64,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiration_hours: 8,
            persistent_expiration_hours: 24 * 14,
        }
    }
}

/// Issues, resolves and revokes session tokens
///
/// Tokens are self-contained JWTs, but a token only authenticates while its
/// session is the current one. Starting a session revokes the one it
/// replaces and signing out revokes the current one, so no token outlives
/// its session. Session state is process-local.
pub struct JwtSessionManager {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    current: RwLock<Option<Session>>,
}

impl Debug for JwtSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionManager")
            .field("expiration_hours", &self.config.expiration_hours)
            .field(
                "persistent_expiration_hours",
                &self.config.persistent_expiration_hours,
            )
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtSessionManager {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
            current: RwLock::new(None),
        }
    }

    /// Issue a token for the account and make it the current session
    ///
    /// The session it replaces is revoked.
    pub async fn start(
        &self,
        account: &Account,
        roles: Vec<String>,
        persistent: bool,
    ) -> Result<Session, DomainError> {
        let lifetime = if persistent {
            self.config.persistent_expiration_hours
        } else {
            self.config.expiration_hours
        };

        let claims = SessionClaims::new(account, roles, persistent, lifetime)?;
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to issue session token: {}", e)))?;

        let session = Session {
            id: claims.sid.clone(),
            token,
            principal: claims.to_principal(),
            persistent,
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        };

        if let Some(replaced) = self.current.write().await.replace(session.clone()) {
            debug!(session_id = %replaced.id, "Session replaced");
        }

        Ok(session)
    }

    /// Revoke the current session; returns it if there was one
    pub async fn end(&self) -> Option<Session> {
        self.current.write().await.take()
    }

    /// Principal of the current session while it is unexpired
    pub async fn current(&self) -> Option<Principal> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.principal.clone())
    }

    /// Decode and verify a token's signature and expiry
    pub fn validate(&self, token: &str) -> Result<SessionClaims, DomainError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| DomainError::validation(format!("Invalid session token: {}", e)))
    }

    /// Resolve a token to its principal; unknown, expired and revoked tokens resolve to `None`
    pub async fn resolve(&self, token: &str) -> Option<Principal> {
        let claims = match self.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        let is_current = self
            .current
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.id == claims.sid);

        if !is_current {
            debug!(session_id = %claims.sid, "Session token has been revoked");
            return None;
        }

        Some(claims.to_principal())
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtSessionManager {
        JwtSessionManager::new(SessionConfig::new("test-secret"))
    }

    #[tokio::test]
    async fn test_start_issues_token_for_account() {
        let manager = manager();
        let account = Account::from_email("a@x.com");

        let session = manager
            .start(&account, vec!["Resident".into()], false)
            .await
            .unwrap();

        assert!(!session.token.is_empty());
        assert_eq!(session.principal.name(), Some("a@x.com"));
        assert_eq!(session.principal.account_id(), Some(account.id().as_str()));
        assert!(session.principal.is_in_role("resident"));
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(8));

        let claims = manager.validate(&session.token).unwrap();
        assert_eq!(claims.sid, session.id);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_persistent_sessions_live_longer() {
        let manager = manager();
        let account = Account::from_email("a@x.com");

        let session = manager.start(&account, vec![], true).await.unwrap();
        assert!(session.persistent);
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(24 * 14));
    }

    #[tokio::test]
    async fn test_current_follows_latest_session() {
        let manager = manager();
        assert!(manager.current().await.is_none());

        manager
            .start(&Account::from_email("a@x.com"), vec![], false)
            .await
            .unwrap();
        manager
            .start(&Account::from_email("b@x.com"), vec![], false)
            .await
            .unwrap();

        let principal = manager.current().await.unwrap();
        assert_eq!(principal.name(), Some("b@x.com"));
    }

    #[tokio::test]
    async fn test_end_revokes_token() {
        let manager = manager();
        let session = manager
            .start(&Account::from_email("a@x.com"), vec![], false)
            .await
            .unwrap();

        assert!(manager.resolve(&session.token).await.is_some());

        let ended = manager.end().await.unwrap();
        assert_eq!(ended.id, session.id);
        assert!(manager.current().await.is_none());
        assert!(manager.resolve(&session.token).await.is_none());

        // Nothing left to end
        assert!(manager.end().await.is_none());
    }

    #[tokio::test]
    async fn test_new_session_revokes_the_replaced_one() {
        let manager = manager();
        let account = Account::from_email("a@x.com");

        let mut sessions = Vec::new();
        for _ in 0..20 {
            sessions.push(manager.start(&account, vec![], false).await.unwrap());
        }

        let (latest, earlier) = sessions.split_last().unwrap();
        for session in earlier {
            assert!(manager.resolve(&session.token).await.is_none());
        }
        assert!(manager.resolve(&latest.token).await.is_some());

        manager.end().await.unwrap();
        for session in &sessions {
            assert!(manager.resolve(&session.token).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_configuration_error() {
        let manager = JwtSessionManager::new(SessionConfig {
            secret: "test-secret".to_string(),
            expiration_hours: u64::MAX,
            persistent_expiration_hours: i64::MAX as u64,
        });
        let account = Account::from_email("a@x.com");

        let err = manager.start(&account, vec![], false).await.unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        let err = manager.start(&account, vec![], true).await.unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_foreign_and_garbage_tokens_rejected() {
        let manager = manager();
        let other = JwtSessionManager::new(SessionConfig::new("other-secret"));
        let session = other
            .start(&Account::from_email("a@x.com"), vec![], false)
            .await
            .unwrap();

        assert!(manager.validate(&session.token).is_err());
        assert!(manager.resolve(&session.token).await.is_none());
        assert!(manager.resolve("not-a-token").await.is_none());
    }

    #[test]
    fn test_debug_hides_keys() {
        let output = format!("{:?}", manager());
        assert!(output.contains("[hidden]"));
        assert!(!output.contains("test-secret"));
    }
}
