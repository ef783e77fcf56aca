//! # diary2md
//!
//! Turn a photograph of a handwritten diary page into an Obsidian Markdown
//! note using a Vision Language Model (VLM).
//!
//! ## Why this crate?
//!
//! Classic OCR produces a flat character stream: no metadata, no structure,
//! and poor accuracy on cursive handwriting. Instead this crate hands the
//! photo to a VLM with a fixed transformation prompt and receives a complete
//! note back: YAML front matter (creation time, entry date, tags, place),
//! inserted section headers, and `[[wiki-links]]` for dates, people, and
//! titled works, with the diarist's own words preserved exactly.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo bytes
//!  │
//!  ├─ 1. Ingest    validate bytes, sniff media type, base64 data URI
//!  ├─ 2. Invoke    one VLM call (fixed prompt + image, detail high, temp 0)
//!  ├─ 3. Sanitize  strip code fences, unwrap stray HTML documents
//!  └─ 4. Output    final note + token/timing stats
//! ```
//!
//! There is exactly one external call per processed image. Failed calls are
//! reported, never retried: retry policy belongs to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diary2md::{process, ProcessConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY
//!     let bytes = std::fs::read("diary-page.jpg")?;
//!     let config = ProcessConfig::default();
//!     let output = process(&bytes, Some("image/jpeg"), &config).await?;
//!     println!("{}", output.note);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `diary2md` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! diary2md = { version = "0.2", default-features = false }
//! ```
//!
//! ## Testing without a provider
//!
//! The VLM sits behind the [`VisionProvider`] trait; inject any
//! implementation through [`ProcessConfig`] to run the pipeline
//! deterministically in tests.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod provider;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImageDetail, ProcessConfig, ProcessConfigBuilder};
pub use error::{Diary2MdError, ErrorBody, FaultClass};
pub use output::{NoteOutput, ProcessStats};
pub use pipeline::ingest::EncodedImage;
pub use pipeline::sanitize::sanitize;
pub use process::{process, process_sync, process_to_file};
pub use prompts::DIARY_NOTE_PROMPT;
pub use provider::{Completion, OpenAiVision, VisionProvider, VisionRequest};
