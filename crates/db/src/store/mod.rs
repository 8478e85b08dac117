//! The storage seam used by the authentication boundary.
//!
//! Reads go through [`StoreQueries`] and never mutate. Every mutation goes
//! through a [`UnitOfWork`] obtained from [`Store::begin`]: its changes
//! become visible together on [`UnitOfWork::commit`] and are discarded if the
//! unit of work is dropped uncommitted.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use pymeauth_core::roles::Role;
use pymeauth_core::types::DbId;

use crate::error::StoreError;
use crate::models::audit::{AuditLog, AuditLogPage, AuditQuery, CreateAuditLog};
use crate::models::business::Business;
use crate::models::user::{User, UserAccount};

/// Read-only queries over identities and the audit ledger.
#[async_trait]
pub trait StoreQueries: Send + Sync {
    /// Confirm the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Case-insensitive lookup. Inactive users are returned too.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn find_business(&self, id: DbId) -> Result<Option<Business>, StoreError>;

    /// Case-insensitive lookup of a user together with its business's
    /// active flag, in a single read.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    async fn find_account(&self, id: DbId) -> Result<Option<UserAccount>, StoreError>;

    /// Filtered page of ledger entries, newest first.
    async fn list_audit(&self, params: &AuditQuery) -> Result<AuditLogPage, StoreError>;

    /// Every ledger entry in id order.
    async fn audit_chain(&self) -> Result<Vec<AuditLog>, StoreError>;
}

/// Commands that commit or abort together.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn create_business(&mut self, name: &str, phone: &str) -> Result<Business, StoreError>;

    /// Fails with [`StoreError::Conflict`] on `uq_users_email` for a taken
    /// address and [`StoreError::Reference`] on `fk_users_business` for an
    /// unknown business.
    async fn create_user(
        &mut self,
        email: &str,
        password_hash: &str,
        role: Role,
        business_id: DbId,
    ) -> Result<User, StoreError>;

    /// Returns whether the flag changed. Unknown ids are [`StoreError::NotFound`].
    async fn deactivate_user(&mut self, id: DbId) -> Result<bool, StoreError>;

    /// Returns whether the flag changed. Unknown ids are [`StoreError::NotFound`].
    async fn deactivate_business(&mut self, id: DbId) -> Result<bool, StoreError>;

    async fn record_login(&mut self, user_id: DbId) -> Result<(), StoreError>;

    /// The ledger's only mutator.
    async fn append_audit(&mut self, entry: CreateAuditLog) -> Result<AuditLog, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// A store that can open units of work.
#[async_trait]
pub trait Store: StoreQueries {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}
