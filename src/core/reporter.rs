//! Exit-code classification and error-message extraction.

use std::process::ExitStatus;

use crate::core::models::DownloadOutcome;

/// Shown when a failed run never printed a line containing "error".
pub const GENERIC_FAILURE: &str = "Unknown error occurred";

/// Classify a finished process: exit 0 is success, anything else is a
/// failure with a best-effort message scraped from the captured output.
pub fn classify_exit(status: ExitStatus, output: &[String]) -> DownloadOutcome {
    if status.success() {
        DownloadOutcome::Completed
    } else {
        DownloadOutcome::Failed {
            message: extract_error_message(output),
        }
    }
}

/// First output line containing "error" (case-insensitive), or a generic
/// fallback. No stack traces, no internal detail.
pub fn extract_error_message(output: &[String]) -> String {
    output
        .iter()
        .find(|line| line.to_lowercase().contains("error"))
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}
