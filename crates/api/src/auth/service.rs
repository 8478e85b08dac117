//! Authentication service: registration, login, and account deactivation.
//!
//! Every operation that mutates state runs as one unit of work which also
//! appends the matching audit entry. If the append fails the unit of work is
//! dropped and nothing it staged persists.

use std::sync::Arc;

use pymeauth_core::audit::AuditAction;
use pymeauth_core::email::normalize_email;
use pymeauth_core::error::{CoreError, CoreResult};
use pymeauth_core::registration::{validate_registration, LoginInput, RegisterInput};
use pymeauth_core::roles::Role;
use pymeauth_core::types::DbId;
use pymeauth_db::error::UQ_USERS_EMAIL;
use pymeauth_db::models::audit::CreateAuditLog;
use pymeauth_db::models::user::User;
use pymeauth_db::Store;
use serde::Serialize;

use crate::auth::password::{hash_password, verify_password};
use crate::config::AuthConfig;

/// Hashed once at startup; login attempts for unknown or inactive accounts
/// verify against it so they cost the same as a real verification.
const DUMMY_PASSWORD: &str = "pymeauth-timing-equalizer";

/// Network details of the caller, recorded on audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// The identity returned by a successful register or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    pub user_id: DbId,
    pub email: String,
    pub role: Role,
    pub business_id: DbId,
}

impl From<&User> for AuthIdentity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            business_id: user.business_id,
        }
    }
}

pub struct AuthService {
    store: Arc<dyn Store>,
    config: AuthConfig,
    dummy_hash: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, config: AuthConfig) -> CoreResult<Self> {
        let dummy_hash = hash_password(DUMMY_PASSWORD, &config.password)
            .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))?;
        Ok(Self {
            store,
            config,
            dummy_hash,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a business and its first PYME user.
    ///
    /// Invalid input fails before anything is stored or audited. A taken
    /// email fails with [`CoreError::DuplicateEmail`], whether it is caught by
    /// the pre-check or by the unique index under a concurrent registration.
    pub async fn register(
        &self,
        mut input: RegisterInput,
        client: &ClientInfo,
    ) -> CoreResult<AuthIdentity> {
        input.email = normalize_email(&input.email);
        validate_registration(&input, self.config.min_password_length)?;
        let email = input.email.clone();

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(self.reject_registration(&email, client).await);
        }

        let password_hash = self.hash(input.password).await?;

        let mut uow = self.store.begin().await?;
        let business = uow
            .create_business(input.business_name.trim(), input.business_phone.trim())
            .await?;
        let created = uow
            .create_user(&email, &password_hash, Role::Pyme, business.id)
            .await;
        let user = match created {
            Ok(user) => user,
            Err(e) if e.is_unique_violation(UQ_USERS_EMAIL) => {
                drop(uow);
                return Err(self.reject_registration(&email, client).await);
            }
            Err(e) => return Err(e.into()),
        };
        uow.append_audit(audit_entry(
            AuditAction::RegisterSuccess,
            Some(user.id),
            Some(business.id),
            client,
        ))
        .await?;
        uow.commit().await?;

        tracing::info!(
            user_id = user.id,
            business_id = business.id,
            "Business registered"
        );
        Ok(AuthIdentity::from(&user))
    }

    /// Authenticate with email and password.
    ///
    /// Unknown emails, wrong passwords, and inactive users or businesses all
    /// fail with [`CoreError::InvalidCredentials`] after a full password
    /// verification, and each failure appends one `LOGIN_FAILURE` entry. A
    /// stored hash that cannot be parsed counts as a failed verification.
    pub async fn login(&self, input: LoginInput, client: &ClientInfo) -> CoreResult<AuthIdentity> {
        let email = normalize_email(&input.email);
        let account = self.store.find_account_by_email(&email).await?;

        let usable = account.as_ref().is_some_and(|a| a.can_authenticate());
        let hash = match &account {
            Some(a) if usable => a.user.password_hash.clone(),
            _ => self.dummy_hash.clone(),
        };
        let verified = match self.verify(input.password, hash).await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash could not be verified");
                false
            }
        };

        let user = match account {
            Some(a) if usable && verified => a.user,
            other => {
                let (user_id, business_id) = other
                    .as_ref()
                    .map_or((None, None), |a| (Some(a.user.id), Some(a.user.business_id)));

                let mut uow = self.store.begin().await?;
                uow.append_audit(audit_entry(
                    AuditAction::LoginFailure,
                    user_id,
                    business_id,
                    client,
                ))
                .await?;
                uow.commit().await?;

                tracing::warn!(
                    user_id = ?user_id,
                    ip = ?client.ip_address,
                    "Login failed"
                );
                return Err(CoreError::InvalidCredentials);
            }
        };

        let mut uow = self.store.begin().await?;
        uow.record_login(user.id).await?;
        uow.append_audit(audit_entry(
            AuditAction::LoginSuccess,
            Some(user.id),
            Some(user.business_id),
            client,
        ))
        .await?;
        uow.commit().await?;

        tracing::info!(user_id = user.id, business_id = user.business_id, "Login succeeded");
        Ok(AuthIdentity::from(&user))
    }

    /// Deactivate a user. Returns whether the flag changed; only a change is
    /// audited.
    pub async fn deactivate_user(
        &self,
        id: DbId,
        actor_id: DbId,
        client: &ClientInfo,
    ) -> CoreResult<bool> {
        let user = self
            .store
            .find_user(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "User", id })?;

        let mut uow = self.store.begin().await?;
        let changed = uow.deactivate_user(id).await?;
        if changed {
            uow.append_audit(audit_entry(
                AuditAction::UserDeactivated,
                Some(id),
                Some(user.business_id),
                client,
            ))
            .await?;
        }
        uow.commit().await?;

        tracing::info!(user_id = id, actor_id, changed, "User deactivated");
        Ok(changed)
    }

    /// Deactivate a business. Its users can no longer log in; its audit
    /// history is untouched.
    pub async fn deactivate_business(
        &self,
        id: DbId,
        actor_id: DbId,
        client: &ClientInfo,
    ) -> CoreResult<bool> {
        let mut uow = self.store.begin().await?;
        let changed = uow.deactivate_business(id).await?;
        if changed {
            uow.append_audit(audit_entry(
                AuditAction::BusinessDeactivated,
                None,
                Some(id),
                client,
            ))
            .await?;
        }
        uow.commit().await?;

        tracing::info!(business_id = id, actor_id, changed, "Business deactivated");
        Ok(changed)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Build the duplicate-email error, first auditing the attempt when
    /// failed registrations are configured to be audited.
    async fn reject_registration(&self, email: &str, client: &ClientInfo) -> CoreError {
        tracing::warn!(email, ip = ?client.ip_address, "Registration rejected: duplicate email");

        if self.config.audit_failed_registrations {
            let entry = audit_entry(AuditAction::RegisterFailure, None, None, client);
            if let Err(e) = self.append_standalone(entry).await {
                return e;
            }
        }
        CoreError::DuplicateEmail
    }

    async fn append_standalone(&self, entry: CreateAuditLog) -> CoreResult<()> {
        let mut uow = self.store.begin().await?;
        uow.append_audit(entry).await?;
        uow.commit().await?;
        Ok(())
    }

    /// Argon2 runs on the blocking pool.
    async fn hash(&self, password: String) -> CoreResult<String> {
        let config = self.config.password;
        tokio::task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .map_err(|e| CoreError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))
    }

    async fn verify(&self, password: String, hash: String) -> CoreResult<bool> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| CoreError::Internal(format!("Verification task failed: {e}")))?
            .map_err(|e| CoreError::Internal(format!("Password verification error: {e}")))
    }
}

fn audit_entry(
    action: AuditAction,
    user_id: Option<DbId>,
    business_id: Option<DbId>,
    client: &ClientInfo,
) -> CreateAuditLog {
    CreateAuditLog {
        user_id,
        business_id,
        action,
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
    }
}
