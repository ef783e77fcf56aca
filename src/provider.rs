//! The vision-completion capability and its OpenAI-compatible implementation.
//!
//! The pipeline never talks to a vendor SDK directly. Everything it needs
//! from the outside world is one operation: send a prompt plus an image,
//! get text back. [`VisionProvider`] captures that operation as an
//! object-safe trait so the production HTTP client and the deterministic
//! mocks used in tests are interchangeable behind an `Arc`.
//!
//! [`OpenAiVision`] is the single production implementation. It speaks the
//! OpenAI chat-completions wire format, which most self-hosted gateways
//! (vLLM, LiteLLM, corporate proxies) also accept, so one implementation
//! covers every endpoint reachable via `base_url`.

use crate::config::ImageDetail;
use crate::error::Diary2MdError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default endpoint for [`OpenAiVision`].
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// One fully-composed vision request: the fixed instruction text plus
/// exactly one image, with the sampling knobs resolved from config.
///
/// Identical across requests except for the embedded image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Instruction text sent as the text part of the user message.
    pub prompt: String,
    /// RFC 2397 data URI carrying the base64-encoded image.
    pub image_url: String,
    /// Resolution the model should analyse the image at.
    pub detail: ImageDetail,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: usize,
}

/// The raw result of one vision call.
///
/// `content` may be empty: providers occasionally return a choice with no
/// text. That is a valid transport-level outcome; rejecting it is the
/// invoker's job, not the provider's.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// Raw completion text, before any sanitising.
    pub content: String,
    /// Prompt tokens consumed, as reported by the service (0 if unreported).
    pub prompt_tokens: usize,
    /// Completion tokens generated, as reported by the service.
    pub completion_tokens: usize,
}

/// The external vision-completion capability.
///
/// Exactly one call per [`VisionRequest`]; implementations must not retry
/// internally. Inject implementations through
/// [`crate::config::ProcessConfig::provider`].
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Short provider name used in error messages and logs.
    fn name(&self) -> &str;

    /// Issue one completion request and await the full (non-streamed) result.
    async fn complete(&self, request: &VisionRequest) -> Result<Completion, Diary2MdError>;
}

// ── OpenAI-compatible provider ───────────────────────────────────────────

/// Vision provider speaking the OpenAI `/chat/completions` wire format.
///
/// Constructed once and shared immutably; the inner `reqwest::Client` pools
/// connections across requests.
pub struct OpenAiVision {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiVision {
    /// Create a provider against the public OpenAI endpoint.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, Diary2MdError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL, timeout_secs)
    }

    /// Create a provider against any OpenAI-compatible endpoint.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, Diary2MdError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Diary2MdError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VisionProvider for OpenAiVision {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<Completion, Diary2MdError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![WireMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrlPart {
                            url: &request.image_url,
                            detail: request.detail.as_str(),
                        },
                    },
                ],
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "POST {} model={} detail={}",
            self.completions_url(),
            self.model,
            request.detail.as_str()
        );

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Diary2MdError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Diary2MdError::AuthRejected {
                provider: self.name().to_string(),
                detail: read_api_error(response).await,
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(Diary2MdError::RateLimited {
                provider: self.name().to_string(),
                retry_after_secs,
            });
        }
        if !status.is_success() {
            return Err(Diary2MdError::ApiError {
                provider: self.name().to_string(),
                message: format!("HTTP {}: {}", status, read_api_error(response).await),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| Diary2MdError::ApiError {
                    provider: self.name().to_string(),
                    message: format!("unreadable response body: {e}"),
                })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let usage = parsed.usage.unwrap_or_default();

        Ok(Completion {
            content,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}

/// Best-effort extraction of the service's own error message.
async fn read_api_error(response: reqwest::Response) -> String {
    match response.json::<ApiErrorBody>().await {
        Ok(body) if !body.error.message.is_empty() => body.error.message,
        _ => "no error detail".to_string(),
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrlPart<'a> },
}

#[derive(Serialize)]
struct ImageUrlPart<'a> {
    url: &'a str,
    detail: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> VisionRequest {
        VisionRequest {
            prompt: "transcribe".into(),
            image_url: "data:image/jpeg;base64,AAAA".into(),
            detail: ImageDetail::High,
            temperature: 0.0,
            max_tokens: 2048,
        }
    }

    #[test]
    fn request_wire_shape() {
        let request = sample_request();
        let body = ChatRequest {
            model: "gpt-4o",
            messages: vec![WireMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrlPart {
                            url: &request.image_url,
                            detail: request.detail.as_str(),
                        },
                    },
                ],
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["detail"],
            "high"
        );
    }

    #[test]
    fn response_parses_with_missing_usage() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"note text"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("note text"));
        assert!(parsed.usage.is_none());
    }

    #[test]
    fn response_parses_with_null_content() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null}}],"usage":{"prompt_tokens":10,"completion_tokens":0}}"#,
        )
        .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 10);
    }

    #[test]
    fn completions_url_handles_trailing_slash() {
        let p = OpenAiVision::with_base_url("k", "m", "http://localhost:8000/v1/", 5).unwrap();
        assert_eq!(p.completions_url(), "http://localhost:8000/v1/chat/completions");
    }
}
