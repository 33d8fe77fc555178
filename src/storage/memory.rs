use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{path, FileStore, StoreError};

/// In-process store used for local development and tests. Behaves like the
/// FTP server where it matters: uploads need an existing directory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(&path::normalize(path)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Seeds a file, creating its directories.
    pub fn insert(&self, file_path: &str, data: impl Into<Vec<u8>>) {
        let file_path = path::normalize(file_path);
        let mut inner = self.lock();
        let mut current = String::new();
        for segment in path::parent_dir(&file_path).split('/').filter(|s| !s.is_empty()) {
            current = path::join(&current, segment);
            inner.dirs.insert(current.clone());
        }
        inner.files.insert(file_path, data.into());
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn upload(&self, file_path: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let file_path = path::normalize(file_path);
        let dir = path::parent_dir(&file_path);
        let mut inner = self.lock();
        if !dir.is_empty() && !inner.dirs.contains(dir) {
            return Err(StoreError::NotFound(dir.to_string()));
        }
        inner.files.insert(file_path, data);
        Ok(())
    }

    async fn download(&self, file_path: &str) -> Result<Vec<u8>, StoreError> {
        let file_path = path::normalize(file_path);
        self.lock()
            .files
            .get(&file_path)
            .cloned()
            .ok_or(StoreError::NotFound(file_path))
    }

    async fn delete(&self, file_path: &str) -> Result<(), StoreError> {
        let file_path = path::normalize(file_path);
        match self.lock().files.remove(&file_path) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(file_path)),
        }
    }

    async fn exists(&self, file_path: &str) -> Result<bool, StoreError> {
        let file_path = path::normalize(file_path);
        let file_path = file_path.trim_end_matches('/');
        let inner = self.lock();
        Ok(inner.files.contains_key(file_path) || inner.dirs.contains(file_path))
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let dir = path::normalize(dir);
        let dir = dir.trim_end_matches('/');
        let inner = self.lock();
        if !dir.is_empty() && !inner.dirs.contains(dir) {
            return Err(StoreError::NotFound(dir.to_string()));
        }
        Ok(inner
            .files
            .keys()
            .filter(|key| path::parent_dir(key) == dir)
            .map(|key| path::file_name(key).to_string())
            .collect())
    }

    async fn make_dir(&self, dir: &str) -> Result<(), StoreError> {
        let dir = path::normalize(dir);
        self.lock().dirs.insert(dir.trim_end_matches('/').to_string());
        Ok(())
    }
}
