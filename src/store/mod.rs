//! Storage facades: a path-addressed blob store and a string key-value store.
//!
//! Both are scoped to one user. The flows only ever see the traits; the
//! hosted platform, the on-disk [`LocalStore`] and the in-process
//! [`MemoryStore`] are interchangeable behind them.
//!
//! ## Contract
//!
//! * `upload` and `read` return `Ok(None)` when the store declines or the
//!   blob does not exist; `Err` is reserved for the call itself failing.
//! * A `set` followed by a `get` on the same key through the same store
//!   value must observe the write. The upload flow re-reads nothing, but the
//!   viewer relies on it right after a submission completes.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Directory that holds everything the app uploaded.
pub const APP_ROOT: &str = "./";

/// A file-listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsItem {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
}

/// Binary blobs addressed by path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a name derived from `name`; the returned item
    /// carries the path actually used.
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<Option<FsItem>, StoreError>;

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    async fn read_dir(&self, path: &str) -> Result<Vec<FsItem>, StoreError>;
}

/// String values addressed by key.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove every key in the namespace.
    async fn flush(&self) -> Result<(), StoreError>;

    /// Keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Reduce an uploaded name to a bare file name.
///
/// Separators and parent references are dropped so an upload can never
/// escape the user's namespace.
pub(crate) fn sanitize_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.');
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

/// `stem-N.ext` for the N-th collision of `name`.
pub(crate) fn numbered_name(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{name}-{n}"),
    }
}

/// Path string handed back to callers for a stored file.
pub(crate) fn app_path(name: &str) -> String {
    format!("{APP_ROOT}{name}")
}

/// Inverse of [`app_path`]; rejects anything outside the app root.
pub(crate) fn name_from_path(path: &str) -> Result<&str, StoreError> {
    let name = path.strip_prefix(APP_ROOT).unwrap_or(path);
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == ".."
    {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(name)
}
