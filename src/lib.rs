pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod repositories;
pub mod services;
pub mod storage;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use api::create_api_router;

use crate::config::AuthConfig;
use crate::storage::FileStore;

/// Shared handles, cloned into every request through an `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub store: Arc<dyn FileStore>,
    /// Server the legacy product images are synced from, when configured.
    pub legacy_store: Option<Arc<dyn FileStore>>,
    pub auth: Arc<AuthConfig>,
    pub bundle_skip_failed: bool,
    pub upload_size_limit: usize,
}
