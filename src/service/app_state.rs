use std::sync::Arc;

use axum::Router;
use cyder_tools::log::info;
use thiserror::Error;

use crate::config::CONFIG;
use crate::store::admin::AdminStore;
use crate::store::audit::AuditTrail;
use crate::store::category::CategoryStore;
use crate::store::provider::ProviderStore;
use crate::store::seed;

use super::usage::UsageService;

/// Process-wide application state: the in-memory entity stores, the audit
/// trail and the usage slider state. Single writer, read-after-write
/// consistent.
pub struct AppState {
    pub providers: ProviderStore,
    pub categories: CategoryStore,
    pub admins: AdminStore,
    pub audit: AuditTrail,
    pub usage: UsageService,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            providers: ProviderStore::new(),
            categories: CategoryStore::new(),
            admins: AdminStore::new(),
            audit: AuditTrail::new(),
            usage: UsageService::new(CONFIG.catalog.ranking_settle()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppStoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub fn create_app_state() -> Arc<AppState> {
    let app_state = Arc::new(AppState::new());
    if CONFIG.catalog.seed {
        seed::seed(&app_state);
        info!("seeded in-memory catalog with mock data");
    }
    app_state
}

pub type StateRouter = Router<Arc<AppState>>;

pub fn create_state_router() -> StateRouter {
    Router::<Arc<AppState>>::new()
}
