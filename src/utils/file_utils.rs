//! Filename sanitation and partial-output cleanup.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static HASHTAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\S+").expect("hashtag pattern"));
static FORMAT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.f\d+\s*$").expect("format suffix pattern"));
static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("illegal chars pattern"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Turn a raw video title into a filename stem.
///
/// Strips `#hashtag` tokens and a trailing format-suffix token (".f606"),
/// replaces filesystem-illegal characters, and collapses whitespace. May
/// return an empty string; the caller decides on a fallback.
pub fn sanitize_title(raw: &str) -> String {
    let stripped = HASHTAGS.replace_all(raw, " ");
    let stripped = FORMAT_SUFFIX.replace(stripped.trim_end(), "");
    let cleaned = ILLEGAL_CHARS.replace_all(&stripped, " ");
    WHITESPACE_RUNS.replace_all(&cleaned, " ").trim().to_string()
}

/// Remove files in `dir` whose name starts with the given title stem.
///
/// Used after a cancelled run to sweep up `.part`/`.ytdl` fragments and any
/// half-merged output the external tool left behind. Best effort per file;
/// returns how many were removed.
pub async fn remove_partial_outputs(dir: &Path, stem: &str) -> usize {
    if stem.is_empty() {
        return 0;
    }

    let mut removed = 0;
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(stem) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => {
                debug!("Removed partial output: {}", name);
                removed += 1;
            }
            Err(e) => debug!("Could not remove {}: {}", name, e),
        }
    }
    removed
}
