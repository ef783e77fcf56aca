//! Error types for the diary2md library.
//!
//! Every failure of one processed image is a [`Diary2MdError`]. The taxonomy
//! follows the request boundary rather than the call stack: what matters to
//! the caller is whether the fault lies with the submitted input or with the
//! server side of the pipeline, because that decides the response class the
//! transport layer sends back. [`Diary2MdError::fault_class`] makes that
//! decision in one place and [`Diary2MdError::to_body`] renders the payload,
//! redacting internal detail so implementation internals never leak upward.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the diary2md library.
#[derive(Debug, Error)]
pub enum Diary2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request carried no image bytes.
    #[error("no image file was provided")]
    NoImage,

    // ── Service errors ────────────────────────────────────────────────────
    /// No vision provider could be resolved (no injected provider, no API key).
    #[error("no vision provider is configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    /// The HTTP call to the vision service failed at the transport level
    /// (connection refused, DNS, client-side timeout).
    #[error("network error calling the vision service: {detail}")]
    Network { detail: String },

    /// The vision service rejected our credentials (401/403).
    #[error("authentication rejected by provider '{provider}': {detail}")]
    AuthRejected { provider: String, detail: String },

    /// The vision service returned HTTP 429.
    ///
    /// Check `retry_after_secs` for a server-specified delay. This library
    /// never retries; backoff is the caller's decision.
    #[error("rate limit exceeded for provider '{provider}'")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The vision service answered with a non-success status or an
    /// unreadable body.
    #[error("vision service error from provider '{provider}': {message}")]
    ApiError { provider: String, message: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The call itself succeeded but the completion carried no usable text.
    #[error("the model returned no usable content")]
    EmptyCompletion,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output note file.
    #[error("failed to write note file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Which side of the request boundary a failure belongs to.
///
/// The excluded HTTP layer maps `ClientInput` to a 4xx response and `Server`
/// to a 5xx response; nothing else about the error influences the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The caller submitted a bad request (e.g. no image).
    ClientInput,
    /// The pipeline or the external service failed.
    Server,
}

impl Diary2MdError {
    /// Classify this error for the transport layer.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            Diary2MdError::NoImage => FaultClass::ClientInput,
            _ => FaultClass::Server,
        }
    }

    /// Stable machine-readable tag for the error payload.
    pub fn error_type(&self) -> &'static str {
        match self {
            Diary2MdError::NoImage => "input_error",
            Diary2MdError::ProviderNotConfigured { .. }
            | Diary2MdError::Network { .. }
            | Diary2MdError::AuthRejected { .. }
            | Diary2MdError::RateLimited { .. }
            | Diary2MdError::ApiError { .. } => "service_error",
            Diary2MdError::EmptyCompletion => "generation_error",
            Diary2MdError::WriteFailed { .. }
            | Diary2MdError::InvalidConfig(_)
            | Diary2MdError::Internal(_) => "internal_error",
        }
    }

    /// Render the structured error payload surfaced to the caller.
    ///
    /// Internal-class errors are reduced to a generic message; their full
    /// detail is for logs only.
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            Diary2MdError::WriteFailed { .. }
            | Diary2MdError::InvalidConfig(_)
            | Diary2MdError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        ErrorBody {
            error: ErrorDetail {
                message,
                kind: self.error_type().to_string(),
            },
        }
    }
}

/// Structured error payload: `{"error": {"message": ..., "type": ...}}`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// The inner error object of [`ErrorBody`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}
