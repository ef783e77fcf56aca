//! End-to-end pipeline tests for diary2md.
//!
//! The vision capability is a trait, so these tests drive the real pipeline
//! (ingest → invoke → sanitize) against a scripted mock provider: fully
//! deterministic, no network, no API key.

use async_trait::async_trait;
use diary2md::{
    process, Completion, Diary2MdError, FaultClass, ImageDetail, ProcessConfig, VisionProvider,
    VisionRequest, DIARY_NOTE_PROMPT,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Mock provider ────────────────────────────────────────────────────────

/// Scripted vision provider: pops one queued reply per call and records
/// every request it receives.
#[derive(Default)]
struct MockVision {
    replies: Mutex<VecDeque<Result<Completion, Diary2MdError>>>,
    requests: Mutex<Vec<VisionRequest>>,
    calls: AtomicUsize,
}

impl MockVision {
    fn returning(content: &str) -> Arc<Self> {
        let mock = Arc::new(Self::default());
        mock.push_content(content);
        mock
    }

    fn push_content(&self, content: &str) {
        self.replies.lock().unwrap().push_back(Ok(Completion {
            content: content.to_string(),
            prompt_tokens: 1200,
            completion_tokens: 340,
        }));
    }

    fn push_error(&self, error: Diary2MdError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> VisionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was recorded")
    }
}

#[async_trait]
impl VisionProvider for MockVision {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<Completion, Diary2MdError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock has no scripted reply left")
    }
}

fn config_with(mock: Arc<MockVision>) -> ProcessConfig {
    ProcessConfig::builder()
        .provider(mock)
        .build()
        .expect("valid config")
}

const PHOTO: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02, 0x03, 0x04];

// ── Success scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn fenced_completion_becomes_clean_note() {
    let mock = MockVision::returning("```\n---\ncreated: 2024-01-02T09:00:00\n---\nBody text\n```");
    let output = process(PHOTO, Some("image/jpeg"), &config_with(mock.clone()))
        .await
        .expect("processing should succeed");

    assert_eq!(
        output.note,
        "---\ncreated: 2024-01-02T09:00:00\n---\nBody text\n"
    );
    assert_eq!(mock.calls(), 1, "exactly one model call per photo");
    assert_eq!(output.stats.input_tokens, 1200);
    assert_eq!(output.stats.output_tokens, 340);
}

#[tokio::test]
async fn html_wrapped_completion_is_unwrapped_to_body() {
    let mock = MockVision::returning(
        "<!DOCTYPE html><html><body>---\ndate: 2024-01-02\n---\nHello</body></html>",
    );
    let output = process(PHOTO, Some("image/jpeg"), &config_with(mock))
        .await
        .expect("processing should succeed");

    assert_eq!(output.note, "---\ndate: 2024-01-02\n---\nHello");
}

#[tokio::test]
async fn clean_completion_passes_through_unchanged() {
    let note = "---\ncreated: 2024-03-03T23:10:00\ndate: 2024-03-03\ntags:\n  - note\n  - journal\nplace: \"[[Lisbon]]\"\n---\n## Evening\nSaw [[Anna]] again.";
    let mock = MockVision::returning(note);
    let output = process(PHOTO, Some("image/jpeg"), &config_with(mock))
        .await
        .unwrap();

    assert_eq!(output.note, note);
}

// ── Request composition ──────────────────────────────────────────────────

#[tokio::test]
async fn request_is_composed_from_template_and_image() {
    let mock = MockVision::returning("note");
    let config = config_with(mock.clone());
    process(PHOTO, Some("image/jpeg"), &config).await.unwrap();

    let request = mock.last_request();
    assert_eq!(request.prompt, DIARY_NOTE_PROMPT);
    assert_eq!(request.temperature, 0.0, "transcription must be deterministic");
    assert_eq!(request.detail, ImageDetail::High);

    // The data URI must decode back to the uploaded bytes exactly.
    let payload = request
        .image_url
        .strip_prefix("data:image/jpeg;base64,")
        .expect("data URI should carry the declared media type");
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    assert_eq!(STANDARD.decode(payload).unwrap(), PHOTO);
}

#[tokio::test]
async fn undeclared_media_type_is_sniffed_from_magic_bytes() {
    let png = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    let mock = MockVision::returning("note");
    process(png, None, &config_with(mock.clone())).await.unwrap();

    assert!(mock
        .last_request()
        .image_url
        .starts_with("data:image/png;base64,"));
}

// ── Failure scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn missing_image_is_a_client_fault() {
    let mock = Arc::new(MockVision::default());
    let err = process(&[], Some("image/jpeg"), &config_with(mock.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, Diary2MdError::NoImage));
    assert_eq!(err.fault_class(), FaultClass::ClientInput);

    let body = err.to_body();
    assert!(!body.error.message.is_empty());
    assert_eq!(body.error.kind, "input_error");

    assert_eq!(mock.calls(), 0, "no model call without an image");
}

#[tokio::test]
async fn empty_completion_is_a_generation_fault() {
    let mock = MockVision::returning("");
    let err = process(PHOTO, Some("image/jpeg"), &config_with(mock.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, Diary2MdError::EmptyCompletion));
    assert_eq!(err.fault_class(), FaultClass::Server);
    assert_eq!(err.to_body().error.kind, "generation_error");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn service_errors_propagate_without_retry() {
    let mock = Arc::new(MockVision::default());
    mock.push_error(Diary2MdError::RateLimited {
        provider: "mock".into(),
        retry_after_secs: Some(30),
    });

    let err = process(PHOTO, Some("image/jpeg"), &config_with(mock.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, Diary2MdError::RateLimited { .. }));
    assert_eq!(err.fault_class(), FaultClass::Server);
    assert_eq!(mock.calls(), 1, "service failures must not be retried");
}

#[tokio::test]
async fn requests_are_independent_tasks() {
    // Two photos through one shared provider: each gets its own call and
    // its own reply, nothing leaks between them.
    let mock = Arc::new(MockVision::default());
    mock.push_content("first note");
    mock.push_content("second note");
    let config = config_with(mock.clone());

    let first = process(PHOTO, Some("image/jpeg"), &config).await.unwrap();
    let second = process(PHOTO, Some("image/jpeg"), &config).await.unwrap();

    assert_eq!(first.note, "first note");
    assert_eq!(second.note, "second note");
    assert_eq!(mock.calls(), 2);
}

// ── File output ──────────────────────────────────────────────────────────

#[tokio::test]
async fn process_to_file_writes_the_note_atomically() {
    let mock = MockVision::returning("---\ndate: 2024-01-02\n---\nHello");
    let dir = std::env::temp_dir().join("diary2md-e2e");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("note.md");

    let stats = diary2md::process_to_file(PHOTO, Some("image/jpeg"), &path, &config_with(mock))
        .await
        .expect("write should succeed");

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "---\ndate: 2024-01-02\n---\nHello");
    assert!(stats.input_tokens > 0);
    assert!(!dir.join("note.md.tmp").exists(), "temp file must be renamed away");

    std::fs::remove_file(&path).ok();
}
