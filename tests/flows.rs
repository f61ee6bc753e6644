//! Integration tests for the upload, viewer and wipe flows.
//!
//! Every test runs against in-memory (or temp-dir) storage with a scripted
//! AI client and renderer, so neither network access nor pdfium is needed.
//!
//! Run with:
//!   cargo test --test flows

use async_trait::async_trait;
use resumer::pipeline::feedback::extract_feedback;
use resumer::{
    analyze, hydrate, list_files, list_reviews, wipe, AiResponse, BlobStore, ContentPart,
    ErrorKind, Feedback, FeedbackClient, HydrationError, KvStore, LocalSession, LocalStore,
    MemoryStore, PreviewImage, PreviewRenderer, ResumeFile, ResumeRecord, ReviewConfig,
    ReviewContext, ReviewError, Route, Section, StatusCallback, StatusUpdate, Tip, UploadRequest,
    UploadStage, ViewState,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Log to the test writer; `RUST_LOG=resumer=debug` shows the flow traces.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";
const ATS_80: &str = r#"{"ATS":{"score":80,"tips":[]}}"#;

/// What the scripted AI client answers.
#[derive(Clone)]
enum Script {
    Reply(AiResponse),
    Nothing,
    Fail(String),
}

struct ScriptedFeedback {
    script: Script,
    calls: AtomicUsize,
    kv: Option<Arc<dyn KvStore>>,
    /// Feedback state of the stored record at the moment of the call.
    seen_pending: Mutex<Vec<bool>>,
}

impl ScriptedFeedback {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            kv: None,
            seen_pending: Mutex::new(Vec::new()),
        })
    }

    fn watching(script: Script, kv: Arc<dyn KvStore>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            kv: Some(kv),
            seen_pending: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackClient for ScriptedFeedback {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<Option<AiResponse>, ReviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(document_path.ends_with(".pdf"), "got {document_path}");
        assert!(!instructions.is_empty());

        if let Some(ref kv) = self.kv {
            for key in kv.list("resume:").await? {
                if let Some(raw) = kv.get(&key).await? {
                    let record = ResumeRecord::from_json(&raw)?;
                    self.seen_pending.lock().unwrap().push(!record.has_feedback());
                }
            }
        }

        match &self.script {
            Script::Reply(r) => Ok(Some(r.clone())),
            Script::Nothing => Ok(None),
            Script::Fail(msg) => Err(ReviewError::AnalysisFailed {
                detail: Some(msg.clone()),
            }),
        }
    }
}

#[derive(Default)]
struct FakeRenderer {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeRenderer {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewRenderer for FakeRenderer {
    async fn render_preview(&self, file: &ResumeFile) -> Result<PreviewImage, ReviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ReviewError::ConversionFailed {
                detail: "no pages".into(),
            });
        }
        Ok(PreviewImage {
            name: file.preview_name(),
            png: PNG.to_vec(),
        })
    }
}

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<StatusUpdate>>,
    wipe_total: Mutex<Option<usize>>,
    deleted: AtomicUsize,
    errors: AtomicUsize,
}

impl Recorder {
    fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl StatusCallback for Recorder {
    fn on_status(&self, update: &StatusUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
    fn on_wipe_start(&self, total_files: usize) {
        *self.wipe_total.lock().unwrap() = Some(total_files);
    }
    fn on_file_deleted(&self, _path: &str) {
        self.deleted.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_error(&self, _path: &str, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    ai: Arc<ScriptedFeedback>,
    renderer: Arc<FakeRenderer>,
    recorder: Arc<Recorder>,
    ctx: ReviewContext,
}

fn harness_with(
    store: MemoryStore,
    script: Script,
    renderer: Arc<FakeRenderer>,
    session: LocalSession,
) -> Harness {
    init_tracing();
    let store = Arc::new(store);
    let ai = ScriptedFeedback::watching(script, store.clone());
    let recorder = Arc::new(Recorder::default());
    let config = ReviewConfig::builder()
        .wipe_concurrency(2)
        .status_callback(recorder.clone())
        .build()
        .unwrap();
    let ctx = ReviewContext::new(
        Arc::new(session),
        store.clone(),
        store.clone(),
        ai.clone(),
        renderer.clone(),
        config,
    );
    Harness {
        store,
        ai,
        renderer,
        recorder,
        ctx,
    }
}

fn harness(script: Script) -> Harness {
    harness_with(
        MemoryStore::new(),
        script,
        FakeRenderer::ok(),
        LocalSession::signed_in("ada"),
    )
}

fn request() -> UploadRequest {
    UploadRequest {
        company_name: "Acme".into(),
        job_title: "Backend Engineer".into(),
        job_description: "Rust services, Postgres, on-call rotation.".into(),
        file: Some(ResumeFile::new("jane-doe.pdf", PDF.to_vec())),
    }
}

fn ats_only(score: f64, tips: Vec<Tip>) -> Section {
    Section { score, tips }
}

fn last_failure(h: &Harness) -> Option<(ErrorKind, String)> {
    match h.recorder.updates().last() {
        Some(StatusUpdate::Failed { kind, message }) => Some((*kind, message.clone())),
        _ => None,
    }
}

// ── Upload orchestrator ──────────────────────────────────────────────────────

#[tokio::test]
async fn successful_run_persists_one_record_and_navigates_to_it() {
    let h = harness(Script::Reply(AiResponse::text(ATS_80)));

    let outcome = analyze(&h.ctx, request()).await.unwrap();

    assert_eq!(outcome.next, Route::Resume(outcome.record.id));
    assert!(outcome.duration_ms < 60_000);
    assert_eq!(h.store.key_count(), 1);
    let key = outcome.record.key();
    let sets: Vec<_> = h
        .store
        .operations()
        .into_iter()
        .filter(|op| op.starts_with("set:"))
        .collect();
    assert_eq!(sets, vec![format!("set:{key}"), format!("set:{key}")]);

    // The AI saw the record with empty feedback; the store now has it parsed.
    assert_eq!(*h.ai.seen_pending.lock().unwrap(), vec![true]);
    let raw = h.store.get(&key).await.unwrap().unwrap();
    let stored = ResumeRecord::from_json(&raw).unwrap();
    assert_eq!(stored, outcome.record);
    assert!(stored.has_feedback());
}

#[tokio::test]
async fn string_content_is_persisted_as_parsed_feedback() {
    let h = harness(Script::Reply(AiResponse::text(ATS_80)));

    let outcome = analyze(&h.ctx, request()).await.unwrap();

    let raw = h.store.get(&outcome.record.key()).await.unwrap().unwrap();
    let stored = ResumeRecord::from_json(&raw).unwrap();
    assert_eq!(
        stored.feedback,
        Some(Feedback::from_value(json!({"ATS": {"score": 80, "tips": []}})))
    );
    assert!(raw.contains(r#""score":80"#), "{raw}");
    assert_eq!(stored.feedback.unwrap().ats(), ats_only(80.0, vec![]));
}

#[tokio::test]
async fn part_list_content_matches_string_content() {
    let text = r#"{"ATS":{"score":50,"tips":["x"]}}"#;
    let from_string = extract_feedback(&AiResponse::text(text)).unwrap();
    let from_parts = extract_feedback(&AiResponse::parts(vec![ContentPart::text(text)])).unwrap();
    assert_eq!(from_string, from_parts);
    assert_eq!(from_parts.ats(), ats_only(50.0, vec![Tip::Text("x".into())]));

    let h = harness(Script::Reply(AiResponse::parts(vec![ContentPart::text(text)])));
    let outcome = analyze(&h.ctx, request()).await.unwrap();
    assert_eq!(outcome.record.feedback, Some(from_string));
}

#[tokio::test]
async fn missing_file_makes_no_calls() {
    let h = harness(Script::Reply(AiResponse::text(ATS_80)));
    let req = UploadRequest {
        file: None,
        ..request()
    };

    let err = analyze(&h.ctx, req).await.unwrap_err();

    assert!(matches!(err, ReviewError::MissingFile));
    assert_eq!(err.to_string(), "Error: No resume file selected");
    assert!(h.store.operations().is_empty());
    assert_eq!(h.ai.calls(), 0);
    assert_eq!(h.renderer.calls(), 0);
    assert!(h.recorder.updates().is_empty());
}

#[tokio::test]
async fn declined_resume_upload_halts_before_ai() {
    let h = harness_with(
        MemoryStore::new().with_upload_limit(0),
        Script::Reply(AiResponse::text(ATS_80)),
        FakeRenderer::ok(),
        LocalSession::signed_in("ada"),
    );

    let err = analyze(&h.ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upload);
    assert_eq!(h.renderer.calls(), 0);
    assert_eq!(h.ai.calls(), 0);
    assert_eq!(h.store.key_count(), 0);
    assert_eq!(
        last_failure(&h),
        Some((ErrorKind::Upload, "Error: Failed to upload file".to_string()))
    );
}

#[tokio::test]
async fn declined_image_upload_halts_before_ai() {
    let h = harness_with(
        MemoryStore::new().with_upload_limit(1),
        Script::Reply(AiResponse::text(ATS_80)),
        FakeRenderer::ok(),
        LocalSession::signed_in("ada"),
    );

    let err = analyze(&h.ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ImageUpload);
    assert_eq!(err.to_string(), "Error: Failed to upload image");
    assert_eq!(h.renderer.calls(), 1);
    assert_eq!(h.ai.calls(), 0);
    // The resume blob stays behind; nothing is rolled back.
    assert_eq!(h.store.file_count(), 1);
    assert_eq!(h.store.key_count(), 0);
}

#[tokio::test]
async fn conversion_failure_halts_before_image_upload() {
    let h = harness_with(
        MemoryStore::new(),
        Script::Reply(AiResponse::text(ATS_80)),
        FakeRenderer::failing(),
        LocalSession::signed_in("ada"),
    );

    let err = analyze(&h.ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.to_string(), "Error: Failed to convert PDF to image");
    let uploads = h
        .store
        .operations()
        .into_iter()
        .filter(|op| op.starts_with("upload:"))
        .count();
    assert_eq!(uploads, 1);
    assert_eq!(h.ai.calls(), 0);
}

#[tokio::test]
async fn empty_ai_response_leaves_record_pending() {
    let h = harness(Script::Nothing);

    let err = analyze(&h.ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Analysis);
    assert_eq!(err.to_string(), "Error: Failed to analyze resume");
    assert_eq!(h.store.key_count(), 1);

    let reviews = list_reviews(&h.ctx).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert!(!reviews[0].has_feedback());
    let view = hydrate(&h.ctx, reviews[0].id).await.unwrap();
    assert_eq!(view.state(), ViewState::Processing);
}

#[tokio::test]
async fn ai_error_is_reported_as_analysis_failure() {
    let h = harness(Script::Fail("rate limited".into()));

    let err = analyze(&h.ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Analysis);
    assert_eq!(err.detail(), Some("rate limited"));
}

#[tokio::test]
async fn prose_reply_is_a_parse_failure() {
    let h = harness(Script::Reply(AiResponse::text(
        "Your resume looks great, well done!",
    )));

    let err = analyze(&h.ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FeedbackParse);
    assert!(last_failure(&h).is_some());
}

#[tokio::test]
async fn loosely_shaped_feedback_is_stored_and_viewable() {
    let replies = [
        (r#"{"ATS":{"score":null,"tips":[]}}"#, 0.0, None),
        (r#"{"ATS":{"score":"75","tips":["Add metrics"]}}"#, 75.0, Some("Add metrics")),
        (
            r#"{"ATS":{"score":61,"tips":[{"type":"improve","title":"One page"}]}}"#,
            61.0,
            Some("One page"),
        ),
    ];
    for (reply, score, first_tip) in replies {
        let h = harness(Script::Reply(AiResponse::text(reply)));

        let outcome = analyze(&h.ctx, request()).await.unwrap();
        let view = hydrate(&h.ctx, outcome.record.id).await.unwrap();

        assert_eq!(view.state(), ViewState::Ready, "{reply}");
        let ats = view.feedback().unwrap().ats();
        assert_eq!(ats.score, score, "{reply}");
        assert_eq!(ats.tips.first().map(Tip::text), first_tip, "{reply}");
        let expected: serde_json::Value = serde_json::from_str(reply).unwrap();
        assert_eq!(view.feedback().unwrap().as_value(), &expected);
    }
}

#[tokio::test]
async fn stored_feedback_of_any_shape_hydrates() {
    let h = harness(Script::Nothing);
    let id = Uuid::new_v4();
    let raw = format!(
        r#"{{"id":"{id}","resumePath":"./cv.pdf","imagePath":"./cv.png",
            "feedback":{{"ATS":{{"score":"88","tips":[{{"note":"odd"}}]}},"skills":{{"score":null}}}}}}"#
    );
    h.store.insert_value(&format!("resume:{id}"), &raw);
    h.store.insert_file("cv.pdf", PDF);
    h.store.insert_file("cv.png", PNG);

    let view = hydrate(&h.ctx, id).await.unwrap();

    assert_eq!(view.state(), ViewState::Ready);
    let feedback = view.feedback().unwrap();
    assert_eq!(feedback.ats().score, 88.0);
    assert_eq!(feedback.ats().tips.len(), 1);
    assert_eq!(feedback.sections()[0].1.score, 0.0);
    assert!(resumer::report::render_view(&view).contains("## ATS Score: 88/100"));
}

#[tokio::test]
async fn status_lines_follow_pipeline_order() {
    let h = harness(Script::Reply(AiResponse::text(ATS_80)));

    analyze(&h.ctx, request()).await.unwrap();

    let lines: Vec<String> = h.recorder.updates().iter().map(|u| u.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "Uploading the file...",
            "Converting to image...",
            "Uploading the image...",
            "Preparing data...",
            "Analyzing...",
            "Analysis complete, redirecting...",
        ]
    );
    assert_eq!(
        h.recorder.updates().last(),
        Some(&StatusUpdate::Stage(UploadStage::Complete))
    );
}

// ── Viewer ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_id_is_pending_not_an_error() {
    let h = harness(Script::Nothing);
    let id = Uuid::new_v4();

    let view = hydrate(&h.ctx, id).await.unwrap();

    assert_eq!(view.state(), ViewState::Pending);
    assert!(view.record.is_none());
    assert!(view.issues.is_empty());
    assert_eq!(h.store.operations(), vec![format!("get:resume:{id}")]);
}

#[tokio::test]
async fn completed_review_hydrates_both_artifacts() {
    let h = harness(Script::Reply(AiResponse::text(ATS_80)));
    let outcome = analyze(&h.ctx, request()).await.unwrap();

    let view = hydrate(&h.ctx, outcome.record.id).await.unwrap();

    assert_eq!(view.state(), ViewState::Ready);
    assert!(view.has_preview());
    let resume = view.resume.as_ref().unwrap();
    assert_eq!(resume.content_type, "application/pdf");
    assert_eq!(resume.data, PDF);
    let preview = view.preview.as_ref().unwrap();
    assert_eq!(preview.content_type, "image/png");
    assert_eq!(preview.file_name(), "jane-doe.png");
    assert!(preview.data_url().starts_with("data:image/png;base64,"));
    assert_eq!(view.feedback().map(Feedback::ats), Some(ats_only(80.0, vec![])));
}

#[tokio::test]
async fn missing_blob_degrades_instead_of_failing() {
    let h = harness(Script::Nothing);
    let pdf_path = h.store.insert_file("cv.pdf", PDF);
    let record = ResumeRecord {
        id: Uuid::new_v4(),
        resume_path: pdf_path,
        image_path: "./gone.png".into(),
        company_name: String::new(),
        job_title: String::new(),
        job_description: String::new(),
        feedback: None,
    };
    h.store
        .insert_value(&record.key(), &record.to_json().unwrap());

    let view = hydrate(&h.ctx, record.id).await.unwrap();

    assert_eq!(view.state(), ViewState::Processing);
    assert!(view.resume.is_some());
    assert!(view.preview.is_none());
    assert_eq!(
        view.issues,
        vec![HydrationError::BlobMissing {
            path: "./gone.png".into()
        }]
    );
}

#[tokio::test]
async fn unreadable_preview_is_reported_and_feedback_still_shows() {
    let h = harness_with(
        MemoryStore::new().with_failing_read("./cv.png"),
        Script::Nothing,
        FakeRenderer::ok(),
        LocalSession::signed_in("ada"),
    );
    let resume_path = h.store.insert_file("cv.pdf", PDF);
    let image_path = h.store.insert_file("cv.png", PNG);
    let record = ResumeRecord {
        id: Uuid::new_v4(),
        resume_path,
        image_path,
        company_name: "Acme".into(),
        job_title: "SRE".into(),
        job_description: String::new(),
        feedback: Some(Feedback::from_value(json!({"ATS": {"score": 70, "tips": []}}))),
    };
    h.store
        .insert_value(&record.key(), &record.to_json().unwrap());

    let view = hydrate(&h.ctx, record.id).await.unwrap();

    assert_eq!(view.state(), ViewState::Ready);
    assert!(view.resume.is_some());
    assert!(view.preview.is_none());
    assert_eq!(
        view.issues,
        vec![HydrationError::BlobReadFailed {
            path: "./cv.png".into(),
            detail: "read refused for ./cv.png".into(),
        }]
    );
    let md = resumer::report::render_view(&view);
    assert!(md.contains("## ATS Score: 70/100"));
    assert!(md.contains("./cv.png"));
}

#[tokio::test]
async fn persisted_record_round_trips() {
    let h = harness(Script::Nothing);
    let record = ResumeRecord {
        id: Uuid::new_v4(),
        resume_path: "./cv.pdf".into(),
        image_path: "./cv.png".into(),
        company_name: "Acme".into(),
        job_title: "SRE".into(),
        job_description: "Keep things up".into(),
        feedback: Some(Feedback::from_value(
            json!({"ATS": {"score": 64, "tips": ["Use keywords"]}}),
        )),
    };

    tokio_test::assert_ok!(h.store.set(&record.key(), &record.to_json().unwrap()).await);
    let raw = tokio_test::assert_ok!(h.store.get(&record.key()).await).unwrap();
    assert_eq!(ResumeRecord::from_json(&raw).unwrap(), record);
}

// ── Wipe ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn wipe_with_no_files_still_flushes() {
    let h = harness(Script::Nothing);
    h.store.insert_value("resume:stale", "{}");

    let report = wipe(&h.ctx).await.unwrap();

    assert!(report.deleted.is_empty());
    assert!(report.is_clean());
    assert_eq!(report.user, "ada");
    assert_eq!(h.store.key_count(), 0);
    assert!(h.store.operations().contains(&"flush".to_string()));
    assert_eq!(*h.recorder.wipe_total.lock().unwrap(), Some(0));
}

#[tokio::test]
async fn wipe_awaits_every_delete_before_flushing() {
    let h = harness(Script::Nothing);
    for name in ["a.pdf", "b.png", "c.pdf", "d.png", "e.pdf"] {
        h.store.insert_file(name, b"x");
    }
    h.store.insert_value("resume:1", "{}");

    let report = wipe(&h.ctx).await.unwrap();

    assert_eq!(report.deleted.len(), 5);
    assert!(report.is_clean());
    assert_eq!(h.store.file_count(), 0);
    assert_eq!(h.recorder.deleted.load(Ordering::SeqCst), 5);

    let ops = h.store.operations();
    let flush_at = ops.iter().position(|op| op == "flush").unwrap();
    let last_delete = ops.iter().rposition(|op| op.starts_with("delete:")).unwrap();
    assert!(last_delete < flush_at);
    assert_eq!(ops.last().map(String::as_str), Some("read_dir:./"));
}

#[tokio::test]
async fn wipe_reports_failed_deletes_and_continues() {
    let store = MemoryStore::new().with_failing_delete("./b.png");
    let h = harness_with(
        store,
        Script::Nothing,
        FakeRenderer::ok(),
        LocalSession::signed_in("ada"),
    );
    for name in ["a.pdf", "b.png", "c.pdf"] {
        h.store.insert_file(name, b"x");
    }

    let report = wipe(&h.ctx).await.unwrap();

    assert_eq!(report.deleted.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "./b.png");
    assert_eq!(report.remaining.len(), 1);
    assert_eq!(report.remaining[0].path, "./b.png");
    assert!(!report.is_clean());
    assert_eq!(h.recorder.errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wipe_fails_when_flush_fails() {
    let h = harness_with(
        MemoryStore::new().with_failing_flush(),
        Script::Nothing,
        FakeRenderer::ok(),
        LocalSession::signed_in("ada"),
    );

    let err = wipe(&h.ctx).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[tokio::test]
async fn list_files_shows_uploaded_blobs() {
    let h = harness(Script::Reply(AiResponse::text(ATS_80)));
    analyze(&h.ctx, request()).await.unwrap();

    let names: Vec<String> = list_files(&h.ctx)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["jane-doe.pdf", "jane-doe.png"]);
}

// ── Authentication guard ─────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_session_is_redirected_everywhere() {
    let h = harness_with(
        MemoryStore::new(),
        Script::Reply(AiResponse::text(ATS_80)),
        FakeRenderer::ok(),
        LocalSession::anonymous(),
    );
    let id = Uuid::new_v4();

    let redirect = |e: ReviewError| match e {
        ReviewError::Unauthenticated { redirect } => redirect,
        other => panic!("expected a redirect, got {other}"),
    };

    assert_eq!(
        redirect(analyze(&h.ctx, request()).await.unwrap_err()),
        "/auth?next=/upload"
    );
    assert_eq!(
        redirect(hydrate(&h.ctx, id).await.unwrap_err()),
        format!("/auth?next=/resume/{id}")
    );
    assert_eq!(
        redirect(wipe(&h.ctx).await.unwrap_err()),
        "/auth?next=/wipe"
    );
    assert!(h.store.operations().is_empty());
    assert_eq!(h.ai.calls(), 0);
}

// ── On-disk store ────────────────────────────────────────────────────────────

#[tokio::test]
async fn local_store_keeps_reviews_across_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(dir.path(), "ada").await.unwrap());
    let ai = ScriptedFeedback::new(Script::Reply(AiResponse::text(ATS_80)));
    let ctx = ReviewContext::new(
        Arc::new(LocalSession::signed_in("ada")),
        store.clone(),
        store.clone(),
        ai.clone(),
        FakeRenderer::ok(),
        ReviewConfig::default(),
    );

    let outcome = analyze(&ctx, request()).await.unwrap();
    assert_eq!(ai.calls(), 1);

    let reopened = LocalStore::open(dir.path(), "ada").await.unwrap();
    let raw = reopened.get(&outcome.record.key()).await.unwrap().unwrap();
    assert_eq!(ResumeRecord::from_json(&raw).unwrap(), outcome.record);
    let pdf = reopened
        .read(&outcome.record.resume_path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pdf, PDF);
}

#[tokio::test]
async fn wipe_removes_directories_on_local_store() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(dir.path(), "ada").await.unwrap());
    store.upload("cv.pdf", PDF).await.unwrap().unwrap();
    let old = store.files_dir().join("old");
    std::fs::create_dir(&old).unwrap();
    std::fs::write(old.join("cv.png"), PNG).unwrap();
    let ctx = ReviewContext::new(
        Arc::new(LocalSession::signed_in("ada")),
        store.clone(),
        store.clone(),
        ScriptedFeedback::new(Script::Nothing),
        FakeRenderer::ok(),
        ReviewConfig::default(),
    );

    let report = wipe(&ctx).await.unwrap();

    let mut deleted = report.deleted.clone();
    deleted.sort();
    assert_eq!(deleted, vec!["./cv.pdf", "./old"]);
    assert!(report.is_clean(), "{report:?}");
    assert!(!old.exists());
}
