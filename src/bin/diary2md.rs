//! CLI binary for diary2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessConfig`, reads the photo from disk, and prints or writes the
//! resulting note.

use anyhow::{Context, Result};
use clap::Parser;
use diary2md::{process, process_to_file, ImageDetail, ProcessConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe a diary photo to stdout
  diary2md page-2024-01-01.jpg

  # Write the note to a file
  diary2md page-2024-01-01.jpg -o 2024-01-01.md

  # Use a cheaper model
  diary2md --model gpt-4o-mini page.jpg

  # Any OpenAI-compatible endpoint (vLLM, LiteLLM, gateway)
  diary2md --base-url http://localhost:8000/v1 page.jpg

  # Structured JSON output (note + token/timing stats)
  diary2md --json page.jpg > result.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY        API key for the OpenAI-compatible endpoint
  DIARY2MD_MODEL        Override the model ID
  DIARY2MD_BASE_URL     Override the endpoint base URL

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Transcribe:    diary2md page.jpg -o note.md
"#;

/// Turn a photo of a handwritten diary page into an Obsidian Markdown note.
#[derive(Parser, Debug)]
#[command(
    name = "diary2md",
    version,
    about = "Turn photos of handwritten diary pages into Obsidian Markdown notes",
    long_about = "Transcribe a photographed handwritten diary entry with a Vision Language \
Model and reformat it as an Obsidian note: YAML front matter, inserted section headers, \
and [[wiki-links]] for dates, people, and titled works, with the original words preserved \
exactly.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the diary-page photo (JPEG, PNG, ...).
    input: PathBuf,

    /// Write the note to this file instead of stdout.
    #[arg(short, long, env = "DIARY2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Vision model ID (e.g. gpt-4o, gpt-4o-mini).
    #[arg(long, env = "DIARY2MD_MODEL")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint.
    #[arg(long, env = "DIARY2MD_BASE_URL")]
    base_url: Option<String>,

    /// Declared media type; sniffed from the file's magic bytes if omitted.
    #[arg(long, env = "DIARY2MD_MEDIA_TYPE")]
    media_type: Option<String>,

    /// Image detail level: high, low, auto.
    #[arg(long, env = "DIARY2MD_DETAIL", value_enum, default_value = "high")]
    detail: DetailArg,

    /// Sampling temperature (0.0–2.0). Keep at 0 for faithful transcription.
    #[arg(long, env = "DIARY2MD_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max tokens the model may generate for the note.
    #[arg(long, env = "DIARY2MD_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// HTTP timeout for the model call in seconds.
    #[arg(long, env = "DIARY2MD_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Output structured JSON (note + stats) instead of the bare note.
    #[arg(long, env = "DIARY2MD_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DIARY2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the note itself.
    #[arg(short, long, env = "DIARY2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DetailArg {
    High,
    Low,
    Auto,
}

impl From<DetailArg> for ImageDetail {
    fn from(v: DetailArg) -> Self {
        match v {
            DetailArg::High => ImageDetail::High,
            DetailArg::Low => ImageDetail::Low,
            DetailArg::Auto => ImageDetail::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read the photo ───────────────────────────────────────────────────
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("failed to read image '{}'", cli.input.display()))?;

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ProcessConfig::builder()
        .detail(cli.detail.clone().into())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base_url) = cli.base_url {
        builder = builder.base_url(base_url.clone());
    }
    let config = builder.build().context("invalid configuration")?;

    let media_type = cli.media_type.as_deref();

    // ── Run the pipeline ─────────────────────────────────────────────────
    if cli.json {
        let output = process(&bytes, media_type, &config)
            .await
            .context("processing failed")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("failed to serialise output")?
        );
        return Ok(());
    }

    match cli.output {
        Some(ref path) => {
            let stats = process_to_file(&bytes, media_type, path, &config)
                .await
                .context("processing failed")?;
            if !cli.quiet {
                eprintln!(
                    "✔ {} written  ({} tokens in / {} out, {:.1}s)",
                    path.display(),
                    stats.input_tokens,
                    stats.output_tokens,
                    stats.total_duration_ms as f64 / 1000.0
                );
            }
        }
        None => {
            let output = process(&bytes, media_type, &config)
                .await
                .context("processing failed")?;
            println!("{}", output.note);
            if !cli.quiet {
                eprintln!(
                    "tokens: {} in / {} out  ({:.1}s)",
                    output.stats.input_tokens,
                    output.stats.output_tokens,
                    output.stats.total_duration_ms as f64 / 1000.0
                );
            }
        }
    }

    Ok(())
}
