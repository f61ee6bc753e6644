//! Wipe: delete every stored file and directory of the signed-in user and
//! flush the key-value store.
//!
//! Deletions run with bounded concurrency (`wipe_concurrency`) and are all
//! awaited before the key-value store is flushed. A failed delete does not
//! stop the others; failures are collected in [`WipeReport::failed`]. The
//! file list is re-read at the end so the caller sees what is really left.

use crate::auth::{require_auth, Route};
use crate::context::ReviewContext;
use crate::error::ReviewError;
use crate::store::{FsItem, APP_ROOT};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A file that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WipeFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of [`wipe`].
#[derive(Debug, Clone, Serialize)]
pub struct WipeReport {
    pub user: String,
    /// Paths deleted, in completion order.
    pub deleted: Vec<String>,
    pub failed: Vec<WipeFailure>,
    /// Listing after the flush.
    pub remaining: Vec<FsItem>,
}

impl WipeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.remaining.is_empty()
    }
}

/// Files in the user's application root.
pub async fn list_files(ctx: &ReviewContext) -> Result<Vec<FsItem>, ReviewError> {
    require_auth(ctx.session.as_ref(), Route::Wipe)?;
    Ok(ctx.blobs.read_dir(APP_ROOT).await?)
}

/// Delete all files and flush the key-value store.
///
/// # Errors
/// - [`ReviewError::Unauthenticated`] for an anonymous session
/// - [`ReviewError::Storage`] when listing or flushing fails; individual
///   delete failures are reported, not returned
pub async fn wipe(ctx: &ReviewContext) -> Result<WipeReport, ReviewError> {
    let user = require_auth(ctx.session.as_ref(), Route::Wipe)?;
    let files = ctx.blobs.read_dir(APP_ROOT).await?;
    let total = files.len();
    info!("Wiping {} files for {}", total, user.username);
    if let Some(ref cb) = ctx.config.status_callback {
        cb.on_wipe_start(total);
    }

    let results: Vec<(String, Result<(), String>)> = stream::iter(files.into_iter().map(|file| {
        let blobs = Arc::clone(&ctx.blobs);
        let cb = ctx.config.status_callback.clone();
        async move {
            let result = blobs.delete(&file.path).await.map_err(|e| e.to_string());
            if let Some(cb) = cb {
                match &result {
                    Ok(()) => cb.on_file_deleted(&file.path),
                    Err(e) => cb.on_file_error(&file.path, e),
                }
            }
            (file.path, result)
        }
    }))
    .buffer_unordered(ctx.config.wipe_concurrency)
    .collect()
    .await;

    let mut deleted = Vec::with_capacity(total);
    let mut failed = Vec::new();
    for (path, result) in results {
        match result {
            Ok(()) => {
                debug!("Deleted {}", path);
                deleted.push(path);
            }
            Err(error) => {
                warn!("Could not delete {}: {}", path, error);
                failed.push(WipeFailure { path, error });
            }
        }
    }

    ctx.kv.flush().await?;
    let remaining = ctx.blobs.read_dir(APP_ROOT).await?;
    info!(
        "Wipe done: {} deleted, {} failed, {} remaining",
        deleted.len(),
        failed.len(),
        remaining.len()
    );

    Ok(WipeReport {
        user: user.username,
        deleted,
        failed,
        remaining,
    })
}
