//! Error types for the resumer library.
//!
//! Three error types reflect three failure modes:
//!
//! * [`ReviewError`]: **Fatal** for the current flow. A submission stops at
//!   the first failed step, a guarded route refuses an anonymous session, a
//!   wipe cannot flush the key-value store. Every variant maps to an
//!   [`ErrorKind`] so callers can branch without matching strings.
//!
//! * [`StoreError`]: what a storage facade reports when the call
//!   itself fails (I/O, transport, serialisation). The orchestrators fold it
//!   into the `ReviewError` of the step that made the call.
//!
//! * [`HydrationError`]: **Non-fatal**. One artifact of a stored review
//!   could not be read. The viewer keeps going and reports what is missing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ReviewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingFile,
    Upload,
    Conversion,
    ImageUpload,
    Persist,
    Analysis,
    FeedbackParse,
    Unauthenticated,
    Input,
    Storage,
    Provider,
    Config,
    Internal,
}

/// All fatal errors returned by the resumer library.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Upload pipeline ───────────────────────────────────────────────────
    /// The submission carried no resume file.
    #[error("Error: No resume file selected")]
    MissingFile,

    /// The original PDF could not be stored.
    #[error("Error: Failed to upload file")]
    UploadFailed { detail: Option<String> },

    /// The PDF could not be rasterised into a preview image.
    #[error("Error: Failed to convert PDF to image")]
    ConversionFailed { detail: String },

    /// The preview image could not be stored.
    #[error("Error: Failed to upload image")]
    ImageUploadFailed { detail: Option<String> },

    /// The review record could not be written to the key-value store.
    #[error("Error: Failed to save resume data")]
    PersistFailed { key: String, detail: String },

    /// The AI call failed, timed out, or returned nothing.
    #[error("Error: Failed to analyze resume")]
    AnalysisFailed { detail: Option<String> },

    /// The AI answered, but not with a JSON critique.
    #[error("Error: Failed to read analysis: {detail}")]
    FeedbackParse { detail: String },

    // ── Session ───────────────────────────────────────────────────────────
    /// The route requires a signed-in user.
    #[error("Sign-in required, continue at {redirect}")]
    Unauthenticated { redirect: String },

    // ── Input ─────────────────────────────────────────────────────────────
    /// Resume file was not found at the given path.
    #[error("Resume file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The file was read but is not a PDF.
    #[error("'{path}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// An http(s) resume could not be downloaded.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Backends ──────────────────────────────────────────────────────────
    /// A storage call outside the upload pipeline failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::MissingFile => ErrorKind::MissingFile,
            ReviewError::UploadFailed { .. } => ErrorKind::Upload,
            ReviewError::ConversionFailed { .. } => ErrorKind::Conversion,
            ReviewError::ImageUploadFailed { .. } => ErrorKind::ImageUpload,
            ReviewError::PersistFailed { .. } => ErrorKind::Persist,
            ReviewError::AnalysisFailed { .. } => ErrorKind::Analysis,
            ReviewError::FeedbackParse { .. } => ErrorKind::FeedbackParse,
            ReviewError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ReviewError::FileNotFound { .. }
            | ReviewError::NotAPdf { .. }
            | ReviewError::DownloadFailed { .. } => ErrorKind::Input,
            ReviewError::Storage(_) => ErrorKind::Storage,
            ReviewError::ProviderNotConfigured { .. } | ReviewError::PdfiumBindingFailed(_) => {
                ErrorKind::Provider
            }
            ReviewError::InvalidConfig(_) => ErrorKind::Config,
            ReviewError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Underlying cause, when the step recorded one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ReviewError::UploadFailed { detail }
            | ReviewError::ImageUploadFailed { detail }
            | ReviewError::AnalysisFailed { detail } => detail.as_deref(),
            ReviewError::ConversionFailed { detail }
            | ReviewError::PersistFailed { detail, .. }
            | ReviewError::FeedbackParse { detail } => Some(detail),
            _ => None,
        }
    }
}

/// Failure reported by a storage facade.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt key-value data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("Call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A non-fatal error while hydrating a stored review.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum HydrationError {
    /// The blob is gone (deleted or never written).
    #[error("'{path}' is missing from storage")]
    BlobMissing { path: String },

    /// The store failed while reading the blob.
    #[error("Reading '{path}' failed: {detail}")]
    BlobReadFailed { path: String, detail: String },
}
