//! Upload orchestration: store the resume, preview it, ask for a critique.
//!
//! ```text
//! upload PDF ─▶ render preview ─▶ upload PNG ─▶ save record ─▶ AI call ─▶ parse ─▶ save record
//! ```
//!
//! Every step needs the previous step's output, so the sequence is strictly
//! linear. The first failure ends the submission: a final
//! [`StatusUpdate::Failed`] is emitted and the typed error returned. Nothing
//! is retried or rolled back; blobs uploaded before the failure stay in
//! storage, and a record saved before the AI call keeps its empty feedback.

use crate::auth::{require_auth, Route};
use crate::context::ReviewContext;
use crate::error::ReviewError;
use crate::pipeline::feedback::extract_feedback;
use crate::pipeline::input::ResumeFile;
use crate::prompts::prepare_instructions;
use crate::record::ResumeRecord;
use crate::status::{StatusUpdate, UploadStage};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One submission from the upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: Option<ResumeFile>,
}

/// Result of a completed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// The record as finally persisted, feedback included.
    pub record: ResumeRecord,
    /// Where the caller should go next: the detail view of `record`.
    pub next: Route,
    pub duration_ms: u64,
}

/// Run the full upload-and-analyze pipeline.
///
/// # Errors
/// - [`ReviewError::Unauthenticated`] for an anonymous session
/// - [`ReviewError::MissingFile`] before any storage or AI call when
///   `request.file` is `None`
/// - one of `UploadFailed`, `ConversionFailed`, `ImageUploadFailed`,
///   `PersistFailed`, `AnalysisFailed`, `FeedbackParse` for the step that
///   failed
pub async fn analyze(
    ctx: &ReviewContext,
    request: UploadRequest,
) -> Result<AnalysisOutcome, ReviewError> {
    let UploadRequest {
        company_name,
        job_title,
        job_description,
        file,
    } = request;
    require_auth(ctx.session.as_ref(), Route::Upload)?;
    let Some(file) = file else {
        debug!("Submission without a file, nothing to do");
        return Err(ReviewError::MissingFile);
    };

    let start = Instant::now();
    let result = run_pipeline(ctx, file, company_name, job_title, job_description).await;
    match result {
        Ok(record) => {
            let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            info!("Analysis of {} complete in {}ms", record.id, duration_ms);
            Ok(AnalysisOutcome {
                next: Route::Resume(record.id),
                record,
                duration_ms,
            })
        }
        Err(e) => {
            warn!("Submission halted: {} ({:?})", e, e.detail());
            ctx.emit(StatusUpdate::failed(&e));
            Err(e)
        }
    }
}

async fn run_pipeline(
    ctx: &ReviewContext,
    file: ResumeFile,
    company_name: String,
    job_title: String,
    job_description: String,
) -> Result<ResumeRecord, ReviewError> {
    // ── Step 1: Upload the original ──────────────────────────────────────
    ctx.emit(StatusUpdate::Stage(UploadStage::UploadingFile));
    let uploaded = ctx
        .blobs
        .upload(&file.name, &file.bytes)
        .await
        .map_err(|e| ReviewError::UploadFailed {
            detail: Some(e.to_string()),
        })?
        .ok_or(ReviewError::UploadFailed { detail: None })?;
    debug!("Resume stored at {}", uploaded.path);

    // ── Step 2: Render the preview ───────────────────────────────────────
    ctx.emit(StatusUpdate::Stage(UploadStage::Converting));
    let preview = ctx
        .renderer
        .render_preview(&file)
        .await
        .map_err(|e| match e {
            ReviewError::ConversionFailed { .. } => e,
            other => ReviewError::ConversionFailed {
                detail: other.to_string(),
            },
        })?;

    // ── Step 3: Upload the preview ───────────────────────────────────────
    ctx.emit(StatusUpdate::Stage(UploadStage::UploadingImage));
    let uploaded_image = ctx
        .blobs
        .upload(&preview.name, &preview.png)
        .await
        .map_err(|e| ReviewError::ImageUploadFailed {
            detail: Some(e.to_string()),
        })?
        .ok_or(ReviewError::ImageUploadFailed { detail: None })?;
    debug!("Preview stored at {}", uploaded_image.path);

    // ── Step 4: Persist the record with empty feedback ───────────────────
    ctx.emit(StatusUpdate::Stage(UploadStage::Preparing));
    let mut record = ResumeRecord {
        id: Uuid::new_v4(),
        resume_path: uploaded.path,
        image_path: uploaded_image.path,
        company_name,
        job_title,
        job_description,
        feedback: None,
    };
    save(ctx, &record).await?;

    // ── Step 5: Ask for the critique ─────────────────────────────────────
    ctx.emit(StatusUpdate::Stage(UploadStage::Analyzing));
    let instructions = prepare_instructions(&record.job_title, &record.job_description);
    let response = ctx
        .ai
        .feedback(&record.resume_path, &instructions)
        .await
        .map_err(|e| match e {
            ReviewError::AnalysisFailed { .. } => e,
            other => ReviewError::AnalysisFailed {
                detail: Some(other.to_string()),
            },
        })?
        .ok_or(ReviewError::AnalysisFailed { detail: None })?;

    // ── Step 6: Parse and persist the feedback ───────────────────────────
    record.feedback = Some(extract_feedback(&response)?);
    save(ctx, &record).await?;

    ctx.emit(StatusUpdate::Stage(UploadStage::Complete));
    Ok(record)
}

async fn save(ctx: &ReviewContext, record: &ResumeRecord) -> Result<(), ReviewError> {
    let key = record.key();
    let persist_err = |detail: String| ReviewError::PersistFailed {
        key: key.clone(),
        detail,
    };
    let body = record.to_json().map_err(|e| persist_err(e.to_string()))?;
    ctx.kv
        .set(&key, &body)
        .await
        .map_err(|e| persist_err(e.to_string()))?;
    debug!("Saved {} (feedback: {})", key, record.has_feedback());
    Ok(())
}
