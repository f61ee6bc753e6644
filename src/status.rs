//! Status-callback trait for the upload and wipe flows.
//!
//! Inject an [`Arc<dyn StatusCallback>`] via
//! [`crate::config::ReviewConfigBuilder::status_callback`] to receive the
//! human-readable status line as each upload step begins, plus per-file
//! events while a wipe runs.
//!
//! # Example
//!
//! ```rust
//! use resumer::{ReviewConfig, StatusCallback, StatusUpdate};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Transcript(Mutex<Vec<String>>);
//!
//! impl StatusCallback for Transcript {
//!     fn on_status(&self, update: &StatusUpdate) {
//!         self.0.lock().unwrap().push(update.to_string());
//!     }
//! }
//!
//! let config = ReviewConfig::builder()
//!     .status_callback(Arc::new(Transcript::default()))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::{ErrorKind, ReviewError};
use std::fmt;
use std::sync::Arc;

/// One step of the upload pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    UploadingFile,
    Converting,
    UploadingImage,
    Preparing,
    Analyzing,
    Complete,
}

impl UploadStage {
    pub fn message(self) -> &'static str {
        match self {
            UploadStage::UploadingFile => "Uploading the file...",
            UploadStage::Converting => "Converting to image...",
            UploadStage::UploadingImage => "Uploading the image...",
            UploadStage::Preparing => "Preparing data...",
            UploadStage::Analyzing => "Analyzing...",
            UploadStage::Complete => "Analysis complete, redirecting...",
        }
    }
}

/// A status line shown to the user while a submission runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// A step has started.
    Stage(UploadStage),
    /// The pipeline halted; `message` is the error's display string.
    Failed { kind: ErrorKind, message: String },
}

impl StatusUpdate {
    pub fn failed(err: &ReviewError) -> Self {
        StatusUpdate::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StatusUpdate::Failed { .. })
    }
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusUpdate::Stage(stage) => f.write_str(stage.message()),
            StatusUpdate::Failed { message, .. } => f.write_str(message),
        }
    }
}

/// Receives progress from the orchestration flows.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Wipe events may arrive concurrently from several
/// in-flight deletions.
pub trait StatusCallback: Send + Sync {
    /// Called when an upload step begins, and once more if the pipeline halts.
    fn on_status(&self, update: &StatusUpdate) {
        let _ = update;
    }

    /// Called once a wipe knows how many files it will delete.
    fn on_wipe_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called after a file was deleted.
    fn on_file_deleted(&self, path: &str) {
        let _ = path;
    }

    /// Called when deleting a file failed; the wipe carries on.
    fn on_file_error(&self, path: &str, error: &str) {
        let _ = (path, error);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopStatusCallback;

impl StatusCallback for NoopStatusCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReviewConfig`].
pub type SharedStatusCallback = Arc<dyn StatusCallback>;
