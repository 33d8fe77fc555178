use sea_orm::Database;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use oxford_catalog::config::{AppConfig, FileStoreKind};
use oxford_catalog::entities::setup_schema;
use oxford_catalog::storage::{FileStore, FtpStore, MemoryStore};
use oxford_catalog::{create_api_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to the database");
    setup_schema(&db).await.expect("Failed to create the database schema");

    let store: Arc<dyn FileStore> = match (&config.file_store, config.ftp.clone()) {
        (FileStoreKind::Ftp, Some(ftp)) => {
            info!(host = %ftp.host, "Using FTP file store");
            Arc::new(FtpStore::new(ftp))
        }
        _ => {
            info!("Using in-memory file store");
            Arc::new(MemoryStore::new())
        }
    };
    let legacy_store = config.legacy_ftp.clone().map(|ftp| {
        info!(host = %ftp.host, "Legacy image sync enabled");
        Arc::new(FtpStore::new(ftp)) as Arc<dyn FileStore>
    });

    let state = AppState {
        db: Arc::new(db),
        store,
        legacy_store,
        auth: Arc::new(config.auth.clone()),
        bundle_skip_failed: config.bundle_skip_failed,
        upload_size_limit: config.upload_size_limit,
    };

    let app = create_api_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("Failed to bind address");
    info!(address = %config.bind_address, "Listening");
    axum::serve(listener, app).await.expect("Server error");
}
