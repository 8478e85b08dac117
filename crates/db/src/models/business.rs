//! Business entity model and DTOs.

use pymeauth_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full row from `identity.businesses`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Business {
    pub id: DbId,
    pub name: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a business.
#[derive(Debug, Clone)]
pub struct CreateBusiness {
    pub name: String,
    pub phone: String,
}
