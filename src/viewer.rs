//! Resume viewer: load a stored review and its two artifacts.
//!
//! Hydration never fails because something is missing. An unknown id gives
//! a view in [`ViewState::Pending`]; an unreadable blob leaves that artifact
//! out and is listed in [`ResumeView::issues`]. Only storage errors and an
//! anonymous session are fatal.

use crate::auth::{require_auth, Route};
use crate::context::ReviewContext;
use crate::error::{HydrationError, ReviewError};
use crate::pipeline::encode;
use crate::record::{record_key, Feedback, ResumeRecord, RECORD_KEY_PREFIX};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const PDF_MIME: &str = "application/pdf";

/// Bytes of a stored blob plus the type to display them as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Artifact {
    /// Self-contained `data:` URL for the artifact.
    pub fn data_url(&self) -> String {
        encode::data_url(&self.content_type, &self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File name part of `path`.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// No record under this id (yet).
    Pending,
    /// Record saved, critique not written.
    Processing,
    Ready,
}

/// Everything the detail view shows for one id.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeView {
    pub id: Uuid,
    pub record: Option<ResumeRecord>,
    pub resume: Option<Artifact>,
    pub preview: Option<Artifact>,
    pub issues: Vec<HydrationError>,
}

impl ResumeView {
    fn pending(id: Uuid) -> Self {
        Self {
            id,
            record: None,
            resume: None,
            preview: None,
            issues: Vec::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        match &self.record {
            None => ViewState::Pending,
            Some(r) if r.feedback.is_none() => ViewState::Processing,
            Some(_) => ViewState::Ready,
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.record.as_ref().and_then(|r| r.feedback.as_ref())
    }

    /// Both artifacts loaded; the preview links to the PDF only then.
    pub fn has_preview(&self) -> bool {
        self.resume.is_some() && self.preview.is_some()
    }
}

/// Load the review stored under `id`.
pub async fn hydrate(ctx: &ReviewContext, id: Uuid) -> Result<ResumeView, ReviewError> {
    require_auth(ctx.session.as_ref(), Route::Resume(id))?;

    let Some(raw) = ctx.kv.get(&record_key(&id)).await? else {
        info!("No record for {}, still pending", id);
        return Ok(ResumeView::pending(id));
    };
    let record = ResumeRecord::from_json(&raw)?;

    let mut view = ResumeView::pending(id);
    view.resume = load_artifact(ctx, &record.resume_path, PDF_MIME, &mut view.issues).await;
    view.preview = load_artifact(
        ctx,
        &record.image_path,
        image_mime(&record.image_path),
        &mut view.issues,
    )
    .await;
    debug!(
        "Hydrated {}: resume={} preview={} feedback={}",
        id,
        view.resume.is_some(),
        view.preview.is_some(),
        record.has_feedback()
    );
    view.record = Some(record);
    Ok(view)
}

/// All reviews of the signed-in user, in key order.
pub async fn list_reviews(ctx: &ReviewContext) -> Result<Vec<ResumeRecord>, ReviewError> {
    require_auth(ctx.session.as_ref(), Route::Home)?;
    let keys = ctx.kv.list(RECORD_KEY_PREFIX).await?;
    let mut records = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(raw) = ctx.kv.get(&key).await? else {
            continue;
        };
        match ResumeRecord::from_json(&raw) {
            Ok(r) => records.push(r),
            Err(e) => warn!("Skipping unreadable record {}: {}", key, e),
        }
    }
    Ok(records)
}

async fn load_artifact(
    ctx: &ReviewContext,
    path: &str,
    content_type: &str,
    issues: &mut Vec<HydrationError>,
) -> Option<Artifact> {
    match ctx.blobs.read(path).await {
        Ok(Some(data)) => Some(Artifact {
            path: path.to_string(),
            content_type: content_type.to_string(),
            data,
        }),
        Ok(None) => {
            warn!("Blob {} is missing", path);
            issues.push(HydrationError::BlobMissing {
                path: path.to_string(),
            });
            None
        }
        Err(e) => {
            warn!("Reading {} failed: {}", path, e);
            issues.push(HydrationError::BlobReadFailed {
                path: path.to_string(),
                detail: e.to_string(),
            });
            None
        }
    }
}

fn image_mime(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
