//! Pipeline stages behind the upload flow.
//!
//! Each submodule implements exactly one transformation step so the
//! orchestrator in [`crate::upload`] stays a plain sequence of calls.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ (upload, AI call) ──▶ feedback
//! (path/URL)  (pdfium)   (PNG)                          (extract + parse)
//! ```
//!
//! 1. [`input`]: read the resume from disk or download it, check `%PDF`
//! 2. [`render`]: rasterise pages; runs in `spawn_blocking` because pdfium
//!    is not async-safe
//! 3. [`encode`]: PNG bytes for the preview upload, base64 `ImageData`
//!    for the model
//! 4. [`feedback`]: pull the critique text out of the AI response and parse it

pub mod encode;
pub mod feedback;
pub mod input;
pub mod render;
