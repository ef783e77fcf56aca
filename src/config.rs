//! Configuration types for diary-photo processing.
//!
//! All pipeline behaviour is controlled through [`ProcessConfig`], built via
//! its [`ProcessConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across tasks and to diff two runs when their
//! outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor breaks on every new field. The builder lets
//! callers set only what they care about and rely on documented defaults for
//! the rest.

use crate::error::Diary2MdError;
use crate::provider::VisionProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default model identifier used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for processing one diary photo.
///
/// Built via [`ProcessConfig::builder()`] or using
/// [`ProcessConfig::default()`].
///
/// # Example
/// ```rust
/// use diary2md::ProcessConfig;
///
/// let config = ProcessConfig::builder()
///     .model("gpt-4o-mini")
///     .max_tokens(1024)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessConfig {
    /// Vision model identifier, e.g. "gpt-4o", "gpt-4o-mini". Default: "gpt-4o".
    pub model: String,

    /// Sampling temperature for the completion. Default: 0.0.
    ///
    /// Zero makes the model deterministic and faithful to what it sees on
    /// the page, which is exactly what transcription needs. Higher values
    /// introduce creativity that corrupts the diarist's words.
    pub temperature: f32,

    /// Maximum tokens the model may generate for the note. Default: 2048.
    ///
    /// A dense A5 diary page transcribes to well under 1 500 tokens including
    /// front matter and inserted headers. Setting this too low silently
    /// truncates the note mid-sentence.
    pub max_tokens: usize,

    /// Image detail level requested from the model. Default: [`ImageDetail::High`].
    ///
    /// Handwriting lives or dies on fine strokes. `High` lets GPT-4-class
    /// models spend their full image tile budget on the photo; `Low` forces a
    /// single 512 px overview tile and loses most of the writing.
    pub detail: ImageDetail,

    /// HTTP client timeout for the single model call, in seconds. Default: 120.
    ///
    /// This is transport configuration on the provider's HTTP client, not a
    /// pipeline deadline; request-lifetime cancellation belongs to the
    /// runtime that owns the request.
    pub api_timeout_secs: u64,

    /// Base URL of an OpenAI-compatible endpoint. Default: the OpenAI API.
    ///
    /// Point this at any compatible server (vLLM, LiteLLM, a corporate
    /// gateway) without touching the rest of the config.
    pub base_url: Option<String>,

    /// API key for the built-in OpenAI-compatible provider.
    /// If None, `OPENAI_API_KEY` is read from the environment.
    pub api_key: Option<String>,

    /// Pre-constructed vision provider. Takes precedence over `api_key` and
    /// `base_url`; this is the seam tests use to inject a deterministic mock.
    pub provider: Option<Arc<dyn VisionProvider>>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            detail: ImageDetail::default(),
            api_timeout_secs: 120,
            base_url: None,
            api_key: None,
            provider: None,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("detail", &self.detail)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider.as_ref().map(|_| "<dyn VisionProvider>"))
            .finish()
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
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

    pub fn detail(mut self, detail: ImageDetail) -> Self {
        self.config.detail = detail;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn VisionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, Diary2MdError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Diary2MdError::InvalidConfig(
                "model must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Diary2MdError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Resolution at which the model analyses the photo.
///
/// Maps directly onto the `detail` field of the vision request. `High` is
/// the default because handwriting transcription degrades sharply below full
/// resolution; `Low` exists for cost probes and `Auto` defers to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// Full image tile budget. (default)
    #[default]
    High,
    /// Single overview tile.
    Low,
    /// Let the model choose.
    Auto,
}

impl ImageDetail {
    /// Wire value sent to the completion API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::High => "high",
            ImageDetail::Low => "low",
            ImageDetail::Auto => "auto",
        }
    }
}
