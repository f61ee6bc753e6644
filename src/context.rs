//! The client object every flow receives.
//!
//! [`ReviewContext`] bundles the session, the storage and AI facades, the
//! preview renderer and the configuration. It is built once at start-up and
//! passed by reference into [`crate::upload::analyze`],
//! [`crate::viewer::hydrate`] and [`crate::wipe::wipe`].

use crate::ai::{resolve_provider, FeedbackClient, LlmFeedbackClient, NoFeedbackClient};
use crate::auth::{LocalSession, Session};
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::pipeline::render::{PdfiumRenderer, PreviewRenderer};
use crate::status::StatusUpdate;
use crate::store::{BlobStore, KvStore, LocalStore, MemoryStore};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReviewContext {
    pub session: Arc<dyn Session>,
    pub blobs: Arc<dyn BlobStore>,
    pub kv: Arc<dyn KvStore>,
    pub ai: Arc<dyn FeedbackClient>,
    pub renderer: Arc<dyn PreviewRenderer>,
    pub config: ReviewConfig,
}

impl ReviewContext {
    pub fn new(
        session: Arc<dyn Session>,
        blobs: Arc<dyn BlobStore>,
        kv: Arc<dyn KvStore>,
        ai: Arc<dyn FeedbackClient>,
        renderer: Arc<dyn PreviewRenderer>,
        config: ReviewConfig,
    ) -> Self {
        Self {
            session,
            blobs,
            kv,
            ai,
            renderer,
            config,
        }
    }

    /// Wire the on-disk store, pdfium and the configured LLM for `session`.
    ///
    /// Anonymous sessions get an empty in-memory store and nothing is
    /// created under `root`; the guarded flows refuse them anyway.
    pub async fn local(
        root: impl AsRef<Path>,
        session: LocalSession,
        config: ReviewConfig,
    ) -> Result<Self, ReviewError> {
        let (blobs, kv) = open_store(root, &session).await?;
        let provider = resolve_provider(&config)?;
        let ai = Arc::new(LlmFeedbackClient::new(provider, Arc::clone(&blobs), &config));
        let renderer = Arc::new(PdfiumRenderer::new(config.max_rendered_pixels));
        Ok(Self::new(
            Arc::new(session),
            blobs,
            kv,
            ai,
            renderer,
            config,
        ))
    }

    /// Like [`ReviewContext::local`] but without an LLM provider, for
    /// viewing, listing and wiping. [`crate::upload::analyze`] fails at the
    /// AI step.
    pub async fn local_without_ai(
        root: impl AsRef<Path>,
        session: LocalSession,
        config: ReviewConfig,
    ) -> Result<Self, ReviewError> {
        let (blobs, kv) = open_store(root, &session).await?;
        let renderer = Arc::new(PdfiumRenderer::new(config.max_rendered_pixels));
        Ok(Self::new(
            Arc::new(session),
            blobs,
            kv,
            Arc::new(NoFeedbackClient),
            renderer,
            config,
        ))
    }

    pub(crate) fn emit(&self, update: StatusUpdate) {
        tracing::info!("{}", update);
        if let Some(ref cb) = self.config.status_callback {
            cb.on_status(&update);
        }
    }
}

async fn open_store(
    root: impl AsRef<Path>,
    session: &LocalSession,
) -> Result<(Arc<dyn BlobStore>, Arc<dyn KvStore>), ReviewError> {
    let Some(user) = session.user() else {
        tracing::debug!("Anonymous session, not opening an on-disk store");
        let store = Arc::new(MemoryStore::new());
        let blobs: Arc<dyn BlobStore> = store.clone();
        let kv: Arc<dyn KvStore> = store;
        return Ok((blobs, kv));
    };
    let store = Arc::new(LocalStore::open(root, &user.username).await?);
    let blobs: Arc<dyn BlobStore> = store.clone();
    let kv: Arc<dyn KvStore> = store;
    Ok((blobs, kv))
}
