//! Configuration for the review flows.
//!
//! Every knob lives in [`ReviewConfig`], built via [`ReviewConfigBuilder`].
//! The config travels inside [`crate::context::ReviewContext`] so each flow
//! sees the same settings without any process-wide state.

use crate::error::ReviewError;
use crate::status::SharedStatusCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration shared by upload, viewer and wipe flows.
///
/// # Example
/// ```rust
/// use resumer::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .model("gpt-4.1-mini")
///     .api_timeout_secs(90)
///     .wipe_concurrency(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.wipe_concurrency, 8);
/// ```
#[derive(Clone)]
pub struct ReviewConfig {
    /// Longest edge of the rendered preview image, in pixels. Default: 1600.
    pub max_rendered_pixels: u32,

    /// Pages of the resume sent to the model. Default: 2.
    ///
    /// Resumes rarely run past two pages; anything beyond is ignored.
    pub max_analyzed_pages: usize,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the critique. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Timeout for the AI feedback call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Timeout for http(s) resume downloads in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Deletions in flight at once during a wipe. Default: 4.
    pub wipe_concurrency: usize,

    /// Receives status lines and wipe events.
    pub status_callback: Option<SharedStatusCallback>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 1600,
            max_analyzed_pages: 2,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            wipe_concurrency: 4,
            status_callback: None,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("max_analyzed_pages", &self.max_analyzed_pages)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("wipe_concurrency", &self.wipe_concurrency)
            .field(
                "status_callback",
                &self.status_callback.as_ref().map(|_| "<dyn StatusCallback>"),
            )
            .finish()
    }
}

impl ReviewConfig {
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn max_analyzed_pages(mut self, n: usize) -> Self {
        self.config.max_analyzed_pages = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn wipe_concurrency(mut self, n: usize) -> Self {
        self.config.wipe_concurrency = n;
        self
    }

    pub fn status_callback(mut self, cb: SharedStatusCallback) -> Self {
        self.config.status_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ReviewError> {
        let c = &self.config;
        if c.max_analyzed_pages == 0 {
            return Err(ReviewError::InvalidConfig(
                "At least one page must be analyzed".into(),
            ));
        }
        if c.wipe_concurrency == 0 {
            return Err(ReviewError::InvalidConfig(
                "Wipe concurrency must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ReviewError::InvalidConfig(
                "API timeout must be at least one second".into(),
            ));
        }
        Ok(self.config)
    }
}
