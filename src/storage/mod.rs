pub mod ftp;
pub mod memory;
pub mod path;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use ftp::FtpStore;
pub use memory::MemoryStore;
pub use path::{ImagePath, PathError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File not found on the file server: {0}")]
    NotFound(String),
    #[error("File server rejected the credentials: {0}")]
    Auth(String),
    #[error("File server connection failed: {0}")]
    Transient(String),
    #[error("File server did not answer within {0:?}")]
    Timeout(Duration),
    #[error("File server error: {0}")]
    Protocol(String),
}

impl StoreError {
    /// Connection drops and timeouts are worth another attempt; anything the
    /// server answered explicitly is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient(_) | StoreError::Timeout(_))
    }
}

/// Remote file storage. Paths are relative and `/` separated.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<(), StoreError>;

    async fn download(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// File names (not paths) directly inside `dir`.
    async fn list(&self, dir: &str) -> Result<Vec<String>, StoreError>;

    async fn make_dir(&self, dir: &str) -> Result<(), StoreError>;

    /// Creates `dir` and every missing parent.
    async fn ensure_dir(&self, dir: &str) -> Result<(), StoreError> {
        let mut current = String::new();
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            current = path::join(&current, segment);
            if !self.exists(&current).await? {
                self.make_dir(&current).await?;
            }
        }
        Ok(())
    }
}
