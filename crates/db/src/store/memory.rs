//! In-memory backend.
//!
//! A unit of work holds the store lock for its whole lifetime and mutates a
//! working copy of the state; commit swaps the copy in, drop discards it.
//! Units of work are therefore fully serialized, which is what the
//! constraints below rely on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pymeauth_core::audit::{canonical_entry, compute_integrity_hash, ledger_timestamp};
use pymeauth_core::email::normalize_email;
use pymeauth_core::roles::Role;
use pymeauth_core::types::DbId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{StoreError, FK_USERS_BUSINESS, UQ_USERS_EMAIL};
use crate::models::audit::{AuditLog, AuditLogPage, AuditQuery, CreateAuditLog};
use crate::models::business::Business;
use crate::models::user::{User, UserAccount};
use crate::store::{Store, StoreQueries, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    businesses: BTreeMap<DbId, Business>,
    users: BTreeMap<DbId, User>,
    audit_logs: Vec<AuditLog>,
    last_business_id: DbId,
    last_user_id: DbId,
    last_audit_id: DbId,
}

impl MemoryState {
    fn user_by_email(&self, email: &str) -> Option<&User> {
        let wanted = normalize_email(email);
        self.users
            .values()
            .find(|u| normalize_email(&u.email) == wanted)
    }

    fn account(&self, user: &User) -> UserAccount {
        let business_active = self
            .businesses
            .get(&user.business_id)
            .is_some_and(|b| b.is_active);
        UserAccount {
            user: user.clone(),
            business_active,
        }
    }
}

/// Thread-safe store backed by maps behind a `tokio::sync::Mutex`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    audit_fault: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent audit append fail with [`StoreError::Unavailable`].
    #[cfg(any(test, feature = "test-support"))]
    pub fn inject_audit_fault(&self, enabled: bool) {
        self.audit_fault.store(enabled, Ordering::SeqCst);
    }

    /// Overwrite a stored entry's action tag, bypassing the ledger's
    /// append-only contract. Used to exercise tamper detection.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn tamper_audit_entry(
        &self,
        id: DbId,
        action: pymeauth_core::audit::AuditAction,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state.audit_logs.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.action = action;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl StoreQueries for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.user_by_email(email).cloned())
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_business(&self, id: DbId) -> Result<Option<Business>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.businesses.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.user_by_email(email).map(|u| state.account(u)))
    }

    async fn find_account(&self, id: DbId) -> Result<Option<UserAccount>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| state.account(u)))
    }

    async fn list_audit(&self, params: &AuditQuery) -> Result<AuditLogPage, StoreError> {
        let state = self.state.lock().await;
        let (limit, offset) = params.page();

        let matching: Vec<&AuditLog> = state
            .audit_logs
            .iter()
            .rev()
            .filter(|e| params.matches(e))
            .collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(AuditLogPage { items, total })
    }

    async fn audit_chain(&self) -> Result<Vec<AuditLog>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.audit_logs.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = (*guard).clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            work,
            audit_fault: Arc::clone(&self.audit_fault),
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
    audit_fault: Arc<AtomicBool>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn create_business(&mut self, name: &str, phone: &str) -> Result<Business, StoreError> {
        let now = ledger_timestamp();
        self.work.last_business_id += 1;
        let business = Business {
            id: self.work.last_business_id,
            name: name.to_string(),
            phone: phone.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.businesses.insert(business.id, business.clone());
        Ok(business)
    }

    async fn create_user(
        &mut self,
        email: &str,
        password_hash: &str,
        role: Role,
        business_id: DbId,
    ) -> Result<User, StoreError> {
        if self.work.user_by_email(email).is_some() {
            return Err(StoreError::Conflict {
                constraint: UQ_USERS_EMAIL.to_string(),
            });
        }
        if !self.work.businesses.contains_key(&business_id) {
            return Err(StoreError::Reference {
                constraint: FK_USERS_BUSINESS.to_string(),
            });
        }

        let now = ledger_timestamp();
        self.work.last_user_id += 1;
        let user = User {
            id: self.work.last_user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            business_id,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.work.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn deactivate_user(&mut self, id: DbId) -> Result<bool, StoreError> {
        let user = self
            .work
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "User", id })?;
        if !user.is_active {
            return Ok(false);
        }
        user.is_active = false;
        user.updated_at = ledger_timestamp();
        Ok(true)
    }

    async fn deactivate_business(&mut self, id: DbId) -> Result<bool, StoreError> {
        let business = self
            .work
            .businesses
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "Business",
                id,
            })?;
        if !business.is_active {
            return Ok(false);
        }
        business.is_active = false;
        business.updated_at = ledger_timestamp();
        Ok(true)
    }

    async fn record_login(&mut self, user_id: DbId) -> Result<(), StoreError> {
        if let Some(user) = self.work.users.get_mut(&user_id) {
            user.last_login_at = Some(ledger_timestamp());
        }
        Ok(())
    }

    async fn append_audit(&mut self, entry: CreateAuditLog) -> Result<AuditLog, StoreError> {
        if self.audit_fault.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit ledger rejected the append".into()));
        }

        let prev_hash = self
            .work
            .audit_logs
            .last()
            .and_then(|e| e.integrity_hash.clone());
        let timestamp = ledger_timestamp();
        let canonical = canonical_entry(
            entry.action.as_str(),
            entry.user_id,
            entry.business_id,
            entry.ip_address.as_deref(),
            entry.user_agent.as_deref(),
            timestamp,
        );

        self.work.last_audit_id += 1;
        let log = AuditLog {
            id: self.work.last_audit_id,
            user_id: entry.user_id,
            business_id: entry.business_id,
            action: entry.action,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            timestamp,
            integrity_hash: Some(compute_integrity_hash(prev_hash.as_deref(), &canonical)),
        };
        self.work.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnitOfWork {
            mut guard, work, ..
        } = *self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pymeauth_core::audit::{verify_chain, AuditAction};

    fn login_failure(user_id: Option<DbId>) -> CreateAuditLog {
        CreateAuditLog {
            user_id,
            business_id: None,
            action: AuditAction::LoginFailure,
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
        }
    }

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        let mut uow = store.begin().await.unwrap();
        let business = uow.create_business("Acme", "555-0100").await.unwrap();
        let user = uow
            .create_user(email, "$argon2id$stub", Role::Pyme, business.id)
            .await
            .unwrap();
        uow.commit().await.unwrap();
        user
    }

    #[tokio::test]
    async fn committed_changes_are_visible() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@x.com").await;

        let found = store.find_user_by_email("A@X.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_business(user.business_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn account_reflects_business_activity() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@x.com").await;

        let account = store.find_account_by_email("A@x.com").await.unwrap().unwrap();
        assert_eq!(account.user.id, user.id);
        assert!(account.can_authenticate());

        let mut uow = store.begin().await.unwrap();
        assert!(uow.deactivate_business(user.business_id).await.unwrap());
        uow.commit().await.unwrap();

        let account = store.find_account(user.id).await.unwrap().unwrap();
        assert!(account.user.is_active);
        assert!(!account.business_active);
        assert!(!account.can_authenticate());
        assert!(store.find_account(user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            let business = uow.create_business("Acme", "555-0100").await.unwrap();
            uow.create_user("a@x.com", "h", Role::Pyme, business.id)
                .await
                .unwrap();
            uow.append_audit(login_failure(None)).await.unwrap();
        }

        assert!(store.find_user_by_email("a@x.com").await.unwrap().is_none());
        assert!(store.find_business(1).await.unwrap().is_none());
        assert!(store.audit_chain().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = MemoryStore::new();
        let existing = seed_user(&store, "a@x.com").await;

        let mut uow = store.begin().await.unwrap();
        let err = uow
            .create_user("A@x.COM", "h", Role::Pyme, existing.business_id)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(UQ_USERS_EMAIL));
    }

    #[tokio::test]
    async fn unknown_business_is_a_reference_violation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        assert_matches!(
            uow.create_user("a@x.com", "h", Role::Pyme, 42).await,
            Err(StoreError::Reference { constraint }) if constraint == FK_USERS_BUSINESS
        );
    }

    #[tokio::test]
    async fn deactivation_is_idempotent_and_keeps_rows() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@x.com").await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow.deactivate_business(user.business_id).await.unwrap());
        assert!(!uow.deactivate_business(user.business_id).await.unwrap());
        assert!(uow.deactivate_user(user.id).await.unwrap());
        assert_matches!(
            uow.deactivate_user(999).await,
            Err(StoreError::NotFound { entity: "User", id: 999 })
        );
        uow.commit().await.unwrap();

        let business = store.find_business(user.business_id).await.unwrap().unwrap();
        assert!(!business.is_active);
        assert!(!store.find_user(user.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn audit_fault_fails_the_append() {
        let store = MemoryStore::new();
        store.inject_audit_fault(true);

        let mut uow = store.begin().await.unwrap();
        assert_matches!(
            uow.append_audit(login_failure(None)).await,
            Err(StoreError::Unavailable(_))
        );
    }

    #[tokio::test]
    async fn appends_form_a_verifiable_chain() {
        let store = MemoryStore::new();
        for user_id in [None, Some(1), Some(2)] {
            let mut uow = store.begin().await.unwrap();
            uow.append_audit(login_failure(user_id)).await.unwrap();
            uow.commit().await.unwrap();
        }

        let chain = store.audit_chain().await.unwrap();
        assert_eq!(chain.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(verify_chain(chain.iter().map(AuditLog::chain_link)).chain_valid);

        assert!(store.tamper_audit_entry(2, AuditAction::LoginSuccess).await);
        let chain = store.audit_chain().await.unwrap();
        let result = verify_chain(chain.iter().map(AuditLog::chain_link));
        assert!(!result.chain_valid);
        assert_eq!(result.first_break, Some(2));
    }

    #[tokio::test]
    async fn list_audit_filters_and_pages_newest_first() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        for _ in 0..5 {
            uow.append_audit(login_failure(Some(7))).await.unwrap();
        }
        uow.append_audit(login_failure(Some(8))).await.unwrap();
        uow.commit().await.unwrap();

        let page = store
            .list_audit(&AuditQuery {
                user_id: Some(7),
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.iter().map(|e| e.id).collect::<Vec<_>>(), vec![4, 3]);
    }

    #[tokio::test]
    async fn concurrent_units_of_work_serialize() {
        let store = MemoryStore::new();
        let business_id = seed_user(&store, "owner@x.com").await.business_id;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut uow = store.begin().await?;
                uow.create_user("same@x.com", "h", Role::Pyme, business_id)
                    .await?;
                uow.commit().await
            }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(e) if e.is_unique_violation(UQ_USERS_EMAIL) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((ok, conflicts), (1, 1));
    }
}
