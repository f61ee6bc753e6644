//! AI feedback facade.
//!
//! [`FeedbackClient::feedback`] takes the storage path of an uploaded
//! resume plus the instructions and returns a chat-style response. Depending
//! on provider routing the message content is either a plain string or a
//! list of content parts; [`MessageContent`] models both and
//! [`MessageContent::text`] is the single place that tells them apart.
//!
//! [`LlmFeedbackClient`] is the bundled implementation: it reads the PDF from
//! the user's [`BlobStore`], rasterises the leading pages and sends them as
//! images to an `edgequake_llm` provider.

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::pipeline::{encode, render};
use crate::prompts::REVIEWER_SYSTEM_PROMPT;
use crate::store::BlobStore;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Chat-style answer to a feedback request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub message: AiMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: MessageContent,
}

/// The two content shapes providers return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The string itself, or the `text` of the first part.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(parts) => parts.first().and_then(|p| p.text.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".into()),
            text: Some(text.into()),
        }
    }
}

impl AiResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_content(MessageContent::Text(content.into()))
    }

    pub fn parts(parts: Vec<ContentPart>) -> Self {
        Self::with_content(MessageContent::Parts(parts))
    }

    fn with_content(content: MessageContent) -> Self {
        Self {
            message: AiMessage {
                role: Some("assistant".into()),
                content,
            },
        }
    }
}

/// Requests a critique of a stored document.
///
/// `Ok(None)` means the service answered without a usable response.
#[async_trait]
pub trait FeedbackClient: Send + Sync {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<Option<AiResponse>, ReviewError>;
}

/// [`FeedbackClient`] that renders the resume and asks a vision LLM.
pub struct LlmFeedbackClient {
    provider: Arc<dyn LLMProvider>,
    blobs: Arc<dyn BlobStore>,
    max_pixels: u32,
    max_pages: usize,
    options: CompletionOptions,
    timeout: Duration,
}

impl LlmFeedbackClient {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        blobs: Arc<dyn BlobStore>,
        config: &ReviewConfig,
    ) -> Self {
        Self {
            provider,
            blobs,
            max_pixels: config.max_rendered_pixels,
            max_pages: config.max_analyzed_pages,
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

#[async_trait]
impl FeedbackClient for LlmFeedbackClient {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<Option<AiResponse>, ReviewError> {
        let Some(pdf) = self.blobs.read(document_path).await? else {
            warn!("Document {} not found in storage", document_path);
            return Ok(None);
        };

        let pages = render::render_pages(pdf, self.max_pixels, self.max_pages).await?;
        let mut images = Vec::with_capacity(pages.len());
        for page in &pages {
            let png = encode::png_bytes(page).map_err(|e| ReviewError::AnalysisFailed {
                detail: Some(format!("image encoding failed: {e}")),
            })?;
            images.push(encode::image_data(&png));
        }

        let messages = vec![
            ChatMessage::system(REVIEWER_SYSTEM_PROMPT),
            ChatMessage::user_with_images(instructions, images),
        ];

        let start = Instant::now();
        let call = self.provider.chat(&messages, Some(&self.options));
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(ReviewError::AnalysisFailed {
                    detail: Some(e.to_string()),
                })
            }
            Err(_) => {
                return Err(ReviewError::AnalysisFailed {
                    detail: Some(format!("timed out after {}s", self.timeout.as_secs())),
                })
            }
        };
        debug!(
            "Feedback: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            warn!("Model returned empty content");
            return Ok(None);
        }
        Ok(Some(AiResponse::text(response.content)))
    }
}

/// [`FeedbackClient`] for contexts that never analyze (viewing, wiping).
///
/// Every call fails with [`ReviewError::ProviderNotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedbackClient;

#[async_trait]
impl FeedbackClient for NoFeedbackClient {
    async fn feedback(
        &self,
        _document_path: &str,
        _instructions: &str,
    ) -> Result<Option<AiResponse>, ReviewError> {
        Err(ReviewError::ProviderNotConfigured {
            provider: "none".to_string(),
            hint: "this context was opened without an LLM provider".to_string(),
        })
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present** (`OPENAI_API_KEY`).
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &ReviewConfig) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReviewError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    info!("Using LLM provider {} ({})", name, model);
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        ReviewError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}
