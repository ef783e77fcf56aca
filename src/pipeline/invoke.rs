//! VLM interaction: compose the vision request and drive the single call.
//!
//! This stage is intentionally thin. The instruction text lives in
//! [`crate::prompts`] and the transport lives behind
//! [`crate::provider::VisionProvider`], so what remains here is the request
//! composition contract: one fixed prompt, one image, zero temperature,
//! full image detail, exactly one call. There is no retry loop on purpose;
//! a failed call surfaces immediately and retry policy stays with the
//! caller.

use crate::config::ProcessConfig;
use crate::error::Diary2MdError;
use crate::pipeline::ingest::EncodedImage;
use crate::prompts::DIARY_NOTE_PROMPT;
use crate::provider::{Completion, VisionProvider, VisionRequest};
use std::time::Instant;
use tracing::debug;

/// Run the single vision call for one encoded diary photo.
///
/// Returns the raw completion (content plus token usage). Fails with the
/// generation error when the service answered but produced no usable text;
/// whitespace-only content counts as unusable.
pub async fn transcribe(
    provider: &dyn VisionProvider,
    image: &EncodedImage,
    config: &ProcessConfig,
) -> Result<Completion, Diary2MdError> {
    let request = VisionRequest {
        prompt: DIARY_NOTE_PROMPT.to_string(),
        image_url: image.data_uri(),
        detail: config.detail,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let start = Instant::now();
    let completion = provider.complete(&request).await?;

    debug!(
        "Provider '{}': {} input tokens, {} output tokens, {:?}",
        provider.name(),
        completion.prompt_tokens,
        completion.completion_tokens,
        start.elapsed()
    );

    if completion.content.trim().is_empty() {
        return Err(Diary2MdError::EmptyCompletion);
    }

    Ok(completion)
}
