//! On-disk store: one directory per user.
//!
//! ```text
//! <root>/<user>/files/   uploaded blobs, flat
//! <root>/<user>/kv.json  key-value namespace
//! ```
//!
//! The key-value map is cached in memory behind a mutex and written through
//! on every `set`/`flush` via temp file + rename, so a crash never leaves a
//! half-written `kv.json` and reads after writes always see the write.

use super::{app_path, name_from_path, numbered_name, sanitize_name, BlobStore, FsItem, KvStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

const MAX_NAME_ATTEMPTS: usize = 10_000;

/// Filesystem-backed [`BlobStore`] + [`KvStore`] for one user.
#[derive(Debug)]
pub struct LocalStore {
    files_dir: PathBuf,
    kv_path: PathBuf,
    kv: Mutex<Option<BTreeMap<String, String>>>,
}

impl LocalStore {
    /// Open (creating if needed) the namespace of `user` under `root`.
    ///
    /// The username is used verbatim as a directory name, so one that is
    /// empty, hidden or contains a path separator is refused.
    pub async fn open(root: impl AsRef<Path>, user: &str) -> Result<Self, StoreError> {
        if !is_plain_username(user) {
            return Err(StoreError::InvalidPath(user.to_string()));
        }
        let user_dir = root.as_ref().join(user);
        let files_dir = user_dir.join("files");
        tokio::fs::create_dir_all(&files_dir)
            .await
            .map_err(|e| StoreError::io(&files_dir, e))?;
        info!("Opened local store at {}", user_dir.display());
        Ok(Self {
            files_dir,
            kv_path: user_dir.join("kv.json"),
            kv: Mutex::new(None),
        })
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    async fn load_kv(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read(&self.kv_path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::io(&self.kv_path, e)),
        }
    }

    async fn persist_kv(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(map)?;
        let tmp = self.kv_path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.kv_path)
            .await
            .map_err(|e| StoreError::io(&self.kv_path, e))
    }

    fn item_for(&self, name: &str, size: u64, is_dir: bool) -> FsItem {
        FsItem {
            id: name.to_string(),
            name: name.to_string(),
            path: app_path(name),
            is_dir,
            size,
        }
    }
}

fn is_plain_username(user: &str) -> bool {
    !user.trim().is_empty()
        && user.trim() == user
        && !user.starts_with('.')
        && !user.contains(['/', '\\', '\0'])
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<Option<FsItem>, StoreError> {
        let base = sanitize_name(name);
        for n in 0..MAX_NAME_ATTEMPTS {
            let candidate = if n == 0 {
                base.clone()
            } else {
                numbered_name(&base, n)
            };
            let target = self.files_dir.join(&candidate);
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await;
            match file {
                Ok(mut f) => {
                    use tokio::io::AsyncWriteExt;
                    f.write_all(bytes)
                        .await
                        .map_err(|e| StoreError::io(&target, e))?;
                    f.flush().await.map_err(|e| StoreError::io(&target, e))?;
                    debug!("Stored {} ({} bytes)", candidate, bytes.len());
                    return Ok(Some(self.item_for(&candidate, bytes.len() as u64, false)));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::io(&target, e)),
            }
        }
        Ok(None)
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let target = self.files_dir.join(name_from_path(path)?);
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&target, e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let target = self.files_dir.join(name_from_path(path)?);
        let removed = match tokio::fs::symlink_metadata(&target).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&target).await,
            Ok(_) => tokio::fs::remove_file(&target).await,
            Err(e) => Err(e),
        };
        match removed {
            Ok(()) => {
                debug!("Deleted {}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&target, e)),
        }
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FsItem>, StoreError> {
        if path != super::APP_ROOT && path != "." && !path.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        let mut entries = tokio::fs::read_dir(&self.files_dir)
            .await
            .map_err(|e| StoreError::io(&self.files_dir, e))?;
        let mut items = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.files_dir, e))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| StoreError::io(entry.path(), e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            items.push(self.item_for(&name, meta.len(), meta.is_dir()));
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

#[async_trait]
impl KvStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut guard = self.kv.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_kv().await?);
        }
        Ok(guard.as_ref().and_then(|m| m.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.kv.lock().await;
        let mut map = match guard.take() {
            Some(map) => map,
            None => self.load_kv().await?,
        };
        map.insert(key.to_string(), value.to_string());
        // On failure the cache stays empty and the next read reloads from disk.
        self.persist_kv(&map).await?;
        *guard = Some(map);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut guard = self.kv.lock().await;
        let map = BTreeMap::new();
        self.persist_kv(&map).await?;
        *guard = Some(map);
        info!("Flushed key-value store");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut guard = self.kv.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_kv().await?);
        }
        Ok(guard
            .as_ref()
            .map(|m| {
                m.keys()
                    .filter(|k| k.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
