//! Entry points: one uploaded photo in, one finished note out.
//!
//! Each call processes a single request end-to-end on one logical task. The
//! only suspension point is the awaited model call; concurrent requests in
//! the same process simply run as independent tasks with nothing shared
//! between them. No state survives a call and no partial note is ever
//! returned: the pipeline either produces the full sanitized document or an
//! error.

use crate::config::ProcessConfig;
use crate::error::Diary2MdError;
use crate::output::{NoteOutput, ProcessStats};
use crate::pipeline::{ingest, invoke, sanitize};
use crate::provider::{OpenAiVision, VisionProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Process one diary photo into an Obsidian note.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `image_bytes` — raw bytes of the uploaded photo
/// * `declared_media_type` — media type from the upload, if the transport
///   knew one; sniffed from the bytes otherwise
/// * `config` — processing configuration (model, detail, provider)
///
/// # Errors
/// * no bytes supplied — client-input fault
/// * provider resolution, network, auth, or quota failure — server fault
/// * a completion with no usable text — server fault
///
/// Nothing is retried; a failed call surfaces immediately.
pub async fn process(
    image_bytes: &[u8],
    declared_media_type: Option<&str>,
    config: &ProcessConfig,
) -> Result<NoteOutput, Diary2MdError> {
    let total_start = Instant::now();
    info!("Processing diary photo: {} bytes", image_bytes.len());

    // ── Step 1: Encode the upload ────────────────────────────────────────
    let image = ingest::encode_image(image_bytes, declared_media_type)?;

    // ── Step 2: Resolve the provider ─────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 3: Single model call ────────────────────────────────────────
    let llm_start = Instant::now();
    let completion = invoke::transcribe(provider.as_ref(), &image, config)
        .await
        .inspect_err(|e| error!("Model call failed: {e}"))?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Sanitize the completion ──────────────────────────────────
    let note = sanitize::sanitize(&completion.content);

    let stats = ProcessStats {
        input_tokens: completion.prompt_tokens as u64,
        output_tokens: completion.completion_tokens as u64,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Note ready: {} chars, {} tokens in / {} out, {}ms total",
        note.len(),
        stats.input_tokens,
        stats.output_tokens,
        stats.total_duration_ms
    );

    Ok(NoteOutput { note, stats })
}

/// Process a diary photo and write the note directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn process_to_file(
    image_bytes: &[u8],
    declared_media_type: Option<&str>,
    output_path: impl AsRef<Path>,
    config: &ProcessConfig,
) -> Result<ProcessStats, Diary2MdError> {
    let output = process(image_bytes, declared_media_type, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Diary2MdError::WriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &output.note)
        .await
        .map_err(|e| Diary2MdError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Diary2MdError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn process_sync(
    image_bytes: &[u8],
    declared_media_type: Option<&str>,
    config: &ProcessConfig,
) -> Result<NoteOutput, Diary2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Diary2MdError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(process(image_bytes, declared_media_type, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the vision provider, from most-specific to least-specific.
///
/// 1. **Injected provider** (`config.provider`): the caller constructed and
///    configured the capability entirely; used as-is. This is how tests run
///    the pipeline deterministically.
///
/// 2. **API key**: `config.api_key`, else the `OPENAI_API_KEY` environment
///    variable, builds the OpenAI-compatible provider against
///    `config.base_url` (or the public endpoint).
///
/// The provider is immutable once constructed; callers that serve many
/// requests build it once and inject it rather than paying resolution per
/// request.
fn resolve_provider(config: &ProcessConfig) -> Result<Arc<dyn VisionProvider>, Diary2MdError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Diary2MdError::ProviderNotConfigured {
            hint: "Set OPENAI_API_KEY, provide ProcessConfig::api_key, \
                   or inject a VisionProvider."
                .to_string(),
        })?;

    let provider = match config.base_url {
        Some(ref base_url) => OpenAiVision::with_base_url(
            api_key,
            config.model.clone(),
            base_url.clone(),
            config.api_timeout_secs,
        )?,
        None => OpenAiVision::new(api_key, config.model.clone(), config.api_timeout_secs)?,
    };

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_provider_wins_over_api_key() {
        use crate::provider::{Completion, VisionRequest};
        use async_trait::async_trait;

        struct Canary;

        #[async_trait]
        impl VisionProvider for Canary {
            fn name(&self) -> &str {
                "canary"
            }
            async fn complete(
                &self,
                _request: &VisionRequest,
            ) -> Result<Completion, Diary2MdError> {
                Ok(Completion::default())
            }
        }

        let config = ProcessConfig::builder()
            .api_key("sk-unused")
            .provider(Arc::new(Canary))
            .build()
            .unwrap();

        let provider = resolve_provider(&config).unwrap();
        assert_eq!(provider.name(), "canary");
    }

    #[test]
    fn api_key_builds_openai_provider() {
        let config = ProcessConfig::builder().api_key("sk-test").build().unwrap();
        let provider = resolve_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn process_sync_runs_the_pipeline_on_its_own_runtime() {
        use crate::provider::{Completion, VisionRequest};
        use async_trait::async_trait;

        struct Fixed;

        #[async_trait]
        impl VisionProvider for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            async fn complete(
                &self,
                _request: &VisionRequest,
            ) -> Result<Completion, Diary2MdError> {
                Ok(Completion {
                    content: "```\nnote body\n```".into(),
                    prompt_tokens: 10,
                    completion_tokens: 5,
                })
            }
        }

        let config = ProcessConfig::builder()
            .provider(Arc::new(Fixed))
            .build()
            .unwrap();

        let output = process_sync(b"bytes", Some("image/jpeg"), &config).unwrap();
        assert_eq!(output.note, "note body\n");
    }
}
