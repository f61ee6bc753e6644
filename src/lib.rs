//! # resumer
//!
//! AI resume review: upload a PDF resume with a target job, get a scored
//! critique back, browse past reviews and wipe everything on demand.
//!
//! ## Flows
//!
//! ```text
//! analyze   upload PDF ─▶ render preview ─▶ upload PNG ─▶ save record
//!                      ─▶ AI critique ─▶ parse ─▶ save record ─▶ /resume/<id>
//! hydrate   record ─▶ resume + preview artifacts ─▶ Pending | Processing | Ready
//! wipe      list files ─▶ bounded deletes (all awaited) ─▶ flush kv ─▶ re-list
//! ```
//!
//! Every flow takes a [`ReviewContext`] holding the session, the blob and
//! key-value facades, the AI client, the preview renderer and the
//! [`ReviewConfig`]. The facades are traits, so the bundled on-disk
//! [`LocalStore`] and pdfium/LLM implementations can be swapped for the
//! in-memory [`MemoryStore`] or anything else.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumer::{analyze, LocalSession, ResumeFile, ReviewConfig, ReviewContext, UploadRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ReviewConfig::default();
//!     let ctx = ReviewContext::local("./data", LocalSession::signed_in("ada"), config).await?;
//!     let request = UploadRequest {
//!         company_name: "Acme".into(),
//!         job_title: "Backend Engineer".into(),
//!         job_description: "Rust, Postgres, on-call".into(),
//!         file: Some(ResumeFile::new("resume.pdf", std::fs::read("resume.pdf")?)),
//!     };
//!     let outcome = analyze(&ctx, request).await?;
//!     println!("review ready at {}", outcome.next);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resumer` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod ai;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod record;
pub mod report;
pub mod status;
pub mod store;
pub mod upload;
pub mod viewer;
pub mod wipe;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use ai::{
    AiResponse, ContentPart, FeedbackClient, LlmFeedbackClient, MessageContent, NoFeedbackClient,
};
pub use auth::{require_auth, LocalSession, Route, Session, User};
pub use config::{ReviewConfig, ReviewConfigBuilder};
pub use context::ReviewContext;
pub use error::{ErrorKind, HydrationError, ReviewError, StoreError};
pub use pipeline::input::{resolve_resume, ResumeFile};
pub use pipeline::render::{PdfiumRenderer, PreviewImage, PreviewRenderer};
pub use record::{Feedback, ResumeRecord, Section, Tip, TipKind};
pub use status::{NoopStatusCallback, StatusCallback, StatusUpdate, UploadStage};
pub use store::{BlobStore, FsItem, KvStore, LocalStore, MemoryStore};
pub use upload::{analyze, AnalysisOutcome, UploadRequest};
pub use viewer::{hydrate, list_reviews, Artifact, ResumeView, ViewState};
pub use wipe::{list_files, wipe, WipeFailure, WipeReport};
