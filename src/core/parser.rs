//! Line-oriented scanner for the external downloader's output.
//!
//! The tool's stdout format ("[download]  42.1% of 5.00MiB at ...") is a de
//! facto wire contract. Parsing is deliberately tolerant: a line that does
//! not match is simply not a progress event, never an error, so format drift
//! in the external tool degrades gracefully.

/// Prefix of lines that may carry a completion percentage.
pub const PROGRESS_MARKER: &str = "[download]";

/// Lines containing this marker are never surfaced to the run log, no matter
/// which keywords they also contain.
const SUPPRESSED_MARKER: &str = "[generic]";

/// Keywords that make an output line worth keeping in the run log.
const RELEVANT_KEYWORDS: [&str; 12] = [
    "error",
    "extracting",
    "merging",
    "unable",
    "warning",
    "failed",
    "complete",
    "successful",
    "extraction",
    "destination",
    "skipping",
    "unsupported",
];

/// Extract a completion fraction from a single output line.
///
/// Only lines starting with `[download]` are considered. The number directly
/// before the `%` sign is parsed and divided by 100; anything malformed
/// yields `None`.
pub fn parse_progress(line: &str) -> Option<f64> {
    let line = line.trim();
    if !line.starts_with(PROGRESS_MARKER) {
        return None;
    }

    let percent_idx = line.find('%')?;
    let head = &line[..percent_idx];
    let start = head.rfind(' ').map(|i| i + 1).unwrap_or(0);
    let value: f64 = head[start..].trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some((value / 100.0).clamp(0.0, 1.0))
}

/// Whether a line belongs in the persistent run log.
pub fn is_relevant(line: &str) -> bool {
    let lower = line.to_lowercase();
    if lower.contains(SUPPRESSED_MARKER) {
        return false;
    }
    RELEVANT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
