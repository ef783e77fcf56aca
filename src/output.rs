//! Output types returned by the processing entry points.

use serde::Serialize;

/// The result of processing one diary photo.
#[derive(Debug, Clone, Serialize)]
pub struct NoteOutput {
    /// The final sanitized note, ready to drop into a vault.
    pub note: String,
    /// Token and timing statistics for the run.
    pub stats: ProcessStats,
}

/// Statistics for one processing run.
///
/// Token counts are as reported by the vision service and stay 0 when the
/// service reports no usage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessStats {
    /// Prompt tokens consumed by the model call.
    pub input_tokens: u64,
    /// Completion tokens generated by the model call.
    pub output_tokens: u64,
    /// Wall-clock duration of the model call in milliseconds.
    pub llm_duration_ms: u64,
    /// Wall-clock duration of the whole pipeline in milliseconds.
    pub total_duration_ms: u64,
}
