//! In-process store, used for tests and dry runs.
//!
//! Every facade call is appended to an operation log so callers can assert
//! which calls a flow made. A few switches let tests make individual calls
//! decline or fail.

use super::{app_path, name_from_path, numbered_name, sanitize_name, BlobStore, FsItem, KvStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    kv: BTreeMap<String, String>,
    log: Vec<String>,
    upload_limit: Option<usize>,
    uploads: usize,
    failing_reads: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
    fail_flush: bool,
}

/// Mutex-guarded [`BlobStore`] + [`KvStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads after the first `n` are declined (`Ok(None)`).
    pub fn with_upload_limit(self, n: usize) -> Self {
        self.lock().upload_limit = Some(n);
        self
    }

    /// Reading `path` fails with a backend error.
    pub fn with_failing_read(self, path: impl Into<String>) -> Self {
        self.lock().failing_reads.insert(path.into());
        self
    }

    /// Deleting `path` fails with a backend error.
    pub fn with_failing_delete(self, path: impl Into<String>) -> Self {
        self.lock().failing_deletes.insert(path.into());
        self
    }

    /// `flush` fails with a backend error.
    pub fn with_failing_flush(self) -> Self {
        self.lock().fail_flush = true;
        self
    }

    /// Seed a blob without logging an operation.
    pub fn insert_file(&self, name: &str, bytes: &[u8]) -> String {
        let name = sanitize_name(name);
        self.lock().files.insert(name.clone(), bytes.to_vec());
        app_path(&name)
    }

    /// Seed a key without logging an operation.
    pub fn insert_value(&self, key: &str, value: &str) {
        self.lock().kv.insert(key.to_string(), value.to_string());
    }

    /// Every call made so far, as `op:argument`.
    pub fn operations(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    pub fn key_count(&self) -> usize {
        self.lock().kv.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock only happens in a failing test.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<Option<FsItem>, StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("upload:{name}"));
        if let Some(limit) = inner.upload_limit {
            if inner.uploads >= limit {
                return Ok(None);
            }
        }
        inner.uploads += 1;

        let base = sanitize_name(name);
        let mut candidate = base.clone();
        let mut n = 0;
        while inner.files.contains_key(&candidate) {
            n += 1;
            candidate = numbered_name(&base, n);
        }
        inner.files.insert(candidate.clone(), bytes.to_vec());
        Ok(Some(FsItem {
            id: candidate.clone(),
            name: candidate.clone(),
            path: app_path(&candidate),
            is_dir: false,
            size: bytes.len() as u64,
        }))
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("read:{path}"));
        if inner.failing_reads.contains(path) {
            return Err(StoreError::Backend(format!("read refused for {path}")));
        }
        let name = name_from_path(path)?;
        Ok(inner.files.get(name).cloned())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("delete:{path}"));
        if inner.failing_deletes.contains(path) {
            return Err(StoreError::Backend(format!("delete refused for {path}")));
        }
        let name = name_from_path(path)?.to_string();
        inner.files.remove(&name);
        Ok(())
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FsItem>, StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("read_dir:{path}"));
        Ok(inner
            .files
            .iter()
            .map(|(name, bytes)| FsItem {
                id: name.clone(),
                name: name.clone(),
                path: app_path(name),
                is_dir: false,
                size: bytes.len() as u64,
            })
            .collect())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("get:{key}"));
        Ok(inner.kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("set:{key}"));
        inner.kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.log.push("flush".to_string());
        if inner.fail_flush {
            return Err(StoreError::Backend("flush refused".into()));
        }
        inner.kv.clear();
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut inner = self.lock();
        inner.log.push(format!("list:{prefix}"));
        Ok(inner
            .kv
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
