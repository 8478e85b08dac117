//! PostgreSQL backend: queries run on the pool, units of work on a
//! `sqlx::Transaction`.

use async_trait::async_trait;
use pymeauth_core::roles::Role;
use pymeauth_core::types::DbId;
use sqlx::{Postgres, Transaction};

use crate::error::StoreError;
use crate::models::audit::{AuditLog, AuditLogPage, AuditQuery, CreateAuditLog};
use crate::models::business::{Business, CreateBusiness};
use crate::models::user::{CreateUser, User, UserAccount};
use crate::repositories::{AuditLogRepo, BusinessRepo, UserRepo};
use crate::store::{Store, StoreQueries, UnitOfWork};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl StoreQueries for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_business(&self, id: DbId) -> Result<Option<Business>, StoreError> {
        Ok(BusinessRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(UserRepo::find_account_by_email(&self.pool, email).await?)
    }

    async fn find_account(&self, id: DbId) -> Result<Option<UserAccount>, StoreError> {
        Ok(UserRepo::find_account_by_id(&self.pool, id).await?)
    }

    async fn list_audit(&self, params: &AuditQuery) -> Result<AuditLogPage, StoreError> {
        let items = AuditLogRepo::query(&self.pool, params).await?;
        let total = AuditLogRepo::count(&self.pool, params).await?;
        Ok(AuditLogPage { items, total })
    }

    async fn audit_chain(&self) -> Result<Vec<AuditLog>, StoreError> {
        Ok(AuditLogRepo::fetch_chain(&self.pool).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// Rolled back by sqlx when dropped without [`UnitOfWork::commit`].
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn create_business(&mut self, name: &str, phone: &str) -> Result<Business, StoreError> {
        let input = CreateBusiness {
            name: name.to_string(),
            phone: phone.to_string(),
        };
        Ok(BusinessRepo::create(&mut *self.tx, &input).await?)
    }

    async fn create_user(
        &mut self,
        email: &str,
        password_hash: &str,
        role: Role,
        business_id: DbId,
    ) -> Result<User, StoreError> {
        let input = CreateUser {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            business_id,
        };
        Ok(UserRepo::create(&mut *self.tx, &input).await?)
    }

    async fn deactivate_user(&mut self, id: DbId) -> Result<bool, StoreError> {
        if UserRepo::deactivate(&mut *self.tx, id).await? {
            return Ok(true);
        }
        match UserRepo::find_by_id(&mut *self.tx, id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound { entity: "User", id }),
        }
    }

    async fn deactivate_business(&mut self, id: DbId) -> Result<bool, StoreError> {
        if BusinessRepo::deactivate(&mut *self.tx, id).await? {
            return Ok(true);
        }
        match BusinessRepo::find_by_id(&mut *self.tx, id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound {
                entity: "Business",
                id,
            }),
        }
    }

    async fn record_login(&mut self, user_id: DbId) -> Result<(), StoreError> {
        Ok(UserRepo::record_successful_login(&mut *self.tx, user_id).await?)
    }

    async fn append_audit(&mut self, entry: CreateAuditLog) -> Result<AuditLog, StoreError> {
        Ok(AuditLogRepo::append(&mut *self.tx, &entry).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }
}
