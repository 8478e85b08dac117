use std::sync::Arc;

use pymeauth_db::Store;

use crate::auth::service::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Identity and audit storage (PostgreSQL in production).
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthService>,
    pub config: Arc<ServerConfig>,
}
