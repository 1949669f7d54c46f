//! First-start seeding of roles and the initial administrator

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::info;

use super::error::{DirectoryError, DirectoryOperation};
use super::facade::AccountDirectory;
use crate::domain::DomainError;
use crate::domain::account::{Account, AccountStatus, PasswordPolicy};
use crate::domain::role::RoleName;

const GENERATED_PASSWORD_LENGTH: usize = 20;
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%&*-_=+?";

/// What to create when the directory starts empty
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Roles that must exist
    pub roles: Vec<String>,
    /// Email of the first administrator; no administrator is seeded without it
    pub admin_email: Option<String>,
    /// Generated when absent
    pub admin_password: Option<String>,
    pub admin_role: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            roles: RoleName::defaults().into_iter().map(String::from).collect(),
            admin_email: None,
            admin_password: None,
            admin_role: RoleName::ADMINISTRATOR.to_string(),
        }
    }
}

/// The administrator created by a bootstrap run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededAdmin {
    pub email: String,
    /// Set when the password was generated and must be handed to the operator
    pub generated_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub roles_created: Vec<String>,
    pub admin: Option<SeededAdmin>,
}

/// Create missing roles, then the first administrator if there are no accounts
///
/// A generated administrator password satisfies `policy`, which should be the
/// policy the directory's provider enforces. Running it again on a seeded
/// directory changes nothing.
pub async fn seed(
    directory: &AccountDirectory,
    settings: &BootstrapSettings,
    policy: &PasswordPolicy,
) -> Result<BootstrapReport, DirectoryError> {
    let mut report = BootstrapReport::default();

    let mut roles = settings.roles.clone();
    if !roles.iter().any(|r| r.eq_ignore_ascii_case(&settings.admin_role)) {
        roles.push(settings.admin_role.clone());
    }

    for role in roles {
        if directory.role_exists(&role).await? {
            continue;
        }

        directory
            .create_role(&role)
            .await?
            .into_result()
            .map_err(|e| DirectoryError::new(DirectoryOperation::CreateRole, e))?;
        report.roles_created.push(role);
    }

    let Some(email) = settings.admin_email.as_deref() else {
        return Ok(report);
    };

    if directory.count_accounts().await? > 0 {
        return Ok(report);
    }

    let (password, generated) = match settings.admin_password.as_deref() {
        Some(p) if !p.is_empty() => (p.to_string(), false),
        _ => {
            let password = generate_password(policy)
                .map_err(|e| DirectoryError::new(DirectoryOperation::Create, e))?;
            (password, true)
        }
    };

    let admin = Account::from_email(email)
        .with_status(AccountStatus::Active)
        .with_email_confirmed(true);
    let admin_id = admin.id().as_str().to_string();

    directory
        .create_account(admin, &password)
        .await?
        .into_result()
        .map_err(|e| DirectoryError::new(DirectoryOperation::Create, e))?;

    let admin = directory.find_by_id(&admin_id).await?.ok_or_else(|| {
        DirectoryError::new(
            DirectoryOperation::FindById,
            DomainError::not_found(format!(
                "Seeded administrator '{}' not found",
                admin_id
            )),
        )
    })?;
    directory.assign_role(&admin, &settings.admin_role).await?;

    info!(email = %email, role = %settings.admin_role, "Initial administrator created");

    report.admin = Some(SeededAdmin {
        email: email.to_string(),
        generated_password: generated.then_some(password),
    });

    Ok(report)
}

/// Random password that passes `policy`
fn generate_password(policy: &PasswordPolicy) -> Result<String, DomainError> {
    if policy.required_unique_chars > PASSWORD_CHARSET.len() {
        return Err(DomainError::configuration(format!(
            "Cannot generate a password with {} unique characters",
            policy.required_unique_chars
        )));
    }

    let length = GENERATED_PASSWORD_LENGTH
        .max(policy.min_length)
        .max(policy.required_unique_chars);
    let mut rng = rand::thread_rng();

    loop {
        let mut chars: Vec<u8> = PASSWORD_CHARSET
            .choose_multiple(&mut rng, policy.required_unique_chars)
            .copied()
            .collect();
        while chars.len() < length {
            chars.push(PASSWORD_CHARSET[rng.gen_range(0..PASSWORD_CHARSET.len())]);
        }
        chars.shuffle(&mut rng);

        let password: String = chars.into_iter().map(char::from).collect();
        if policy.validate(&password).is_empty() {
            return Ok(password);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::identity::MockIdentityProvider;
    use crate::infrastructure::account::InMemoryAccountRepository;
    use crate::infrastructure::identity::{IdentityOptions, StoreIdentityProvider};
    use crate::infrastructure::password::Argon2Hasher;
    use crate::infrastructure::role::InMemoryRoleRepository;
    use crate::infrastructure::session::{JwtSessionManager, SessionConfig};

    fn empty_directory() -> AccountDirectory {
        let provider = StoreIdentityProvider::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryRoleRepository::new()),
            Arc::new(Argon2Hasher::new()),
            JwtSessionManager::new(SessionConfig::new("test-secret")),
            IdentityOptions::default(),
        );
        AccountDirectory::new(Arc::new(provider))
    }

    fn settings() -> BootstrapSettings {
        BootstrapSettings {
            admin_email: Some("admin@condo.com".to_string()),
            admin_password: Some("Adm1n!pass".to_string()),
            ..BootstrapSettings::default()
        }
    }

    #[tokio::test]
    async fn test_seed_creates_roles_and_admin() {
        let directory = empty_directory();

        let report = seed(&directory, &settings(), &PasswordPolicy::default()).await.unwrap();

        assert_eq!(
            report.roles_created,
            vec!["Administrator", "Manager", "Resident"]
        );
        let admin = report.admin.unwrap();
        assert_eq!(admin.email, "admin@condo.com");
        assert!(admin.generated_password.is_none());

        let account = directory
            .find_by_email("admin@condo.com")
            .await
            .unwrap()
            .unwrap();
        assert!(account.email_confirmed());
        assert!(directory.is_in_role(&account, "Administrator").await.unwrap());
        assert_eq!(directory.count_accounts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let directory = empty_directory();

        seed(&directory, &settings(), &PasswordPolicy::default()).await.unwrap();
        let second = seed(&directory, &settings(), &PasswordPolicy::default()).await.unwrap();

        assert_eq!(second, BootstrapReport::default());
        assert_eq!(directory.count_accounts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_without_admin_email_only_defines_roles() {
        let directory = empty_directory();

        let report = seed(
            &directory,
            &BootstrapSettings::default(),
            &PasswordPolicy::default(),
        )
            .await
            .unwrap();

        assert_eq!(report.roles_created.len(), 3);
        assert!(report.admin.is_none());
        assert_eq!(directory.count_accounts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_generates_password_when_missing() {
        let directory = empty_directory();
        let settings = BootstrapSettings {
            admin_password: None,
            ..settings()
        };

        let report = seed(&directory, &settings, &PasswordPolicy::default()).await.unwrap();
        let password = report.admin.unwrap().generated_password.unwrap();

        let result = directory
            .password_sign_in("admin@condo.com", &password, false)
            .await
            .unwrap();
        assert!(result.succeeded());
    }

    #[tokio::test]
    async fn test_seed_adds_custom_admin_role() {
        let directory = empty_directory();
        let settings = BootstrapSettings {
            admin_role: "Syndic".to_string(),
            ..settings()
        };

        let report = seed(&directory, &settings, &PasswordPolicy::default()).await.unwrap();
        assert!(report.roles_created.contains(&"Syndic".to_string()));

        let admin = directory
            .find_by_email("admin@condo.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(directory.list_roles(&admin).await.unwrap(), vec!["Syndic"]);
    }

    #[tokio::test]
    async fn test_seed_rejects_weak_admin_password() {
        let directory = empty_directory();
        let settings = BootstrapSettings {
            admin_password: Some("weak".to_string()),
            ..settings()
        };

        let err = seed(&directory, &settings, &PasswordPolicy::default()).await.unwrap_err();
        assert_eq!(err.operation(), DirectoryOperation::Create);
        assert!(matches!(err.cause(), DomainError::Rejected { .. }));
        assert_eq!(directory.count_accounts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_surfaces_provider_faults() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_role_exists()
            .returning(|_| Err(DomainError::storage("connection reset")));

        let directory = AccountDirectory::new(Arc::new(provider));
        let err = seed(&directory, &settings(), &PasswordPolicy::default()).await.unwrap_err();

        assert_eq!(err.operation(), DirectoryOperation::RoleExists);
    }

    #[test]
    fn test_generated_password_passes_default_policy() {
        let password = generate_password(&PasswordPolicy::default()).unwrap();
        assert_eq!(password.chars().count(), GENERATED_PASSWORD_LENGTH);
        assert!(PasswordPolicy::default().validate(&password).is_empty());
    }

    #[test]
    fn test_generated_password_meets_strict_policy() {
        let policy = PasswordPolicy {
            min_length: 32,
            required_unique_chars: 24,
            ..PasswordPolicy::default()
        };

        let password = generate_password(&policy).unwrap();
        assert_eq!(password.chars().count(), 32);
        assert!(policy.validate(&password).is_empty());
    }

    #[test]
    fn test_unsatisfiable_policy_is_configuration_error() {
        let policy = PasswordPolicy {
            required_unique_chars: PASSWORD_CHARSET.len() + 1,
            ..PasswordPolicy::default()
        };

        let err = generate_password(&policy).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_seed_generates_password_for_configured_policy() {
        let policy = PasswordPolicy {
            min_length: 30,
            ..PasswordPolicy::default()
        };
        let provider = StoreIdentityProvider::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryRoleRepository::new()),
            Arc::new(Argon2Hasher::new()),
            JwtSessionManager::new(SessionConfig::new("test-secret")),
            IdentityOptions {
                password: policy.clone(),
                ..IdentityOptions::default()
            },
        );
        let directory = AccountDirectory::new(Arc::new(provider));
        let settings = BootstrapSettings {
            admin_password: None,
            ..settings()
        };

        let report = seed(&directory, &settings, &policy).await.unwrap();
        let password = report.admin.unwrap().generated_password.unwrap();
        assert_eq!(password.chars().count(), 30);

        let result = directory
            .password_sign_in("admin@condo.com", &password, false)
            .await
            .unwrap();
        assert!(result.succeeded());
    }
}
