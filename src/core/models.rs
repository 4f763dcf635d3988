//! Core data models for the download orchestrator

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Quality selector offered by the front end.
///
/// Labels coming from the UI are free-form strings; anything unrecognized
/// folds to the 360p tier so a stale or misspelled label still produces a
/// usable download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    P1080,
    P720,
    P480,
    P360,
    AudioOnly,
}

impl Quality {
    /// Parse a UI label ("1080p", "Audio only", ...) case-insensitively.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "1080p" => Self::P1080,
            "720p" => Self::P720,
            "480p" => Self::P480,
            "360p" => Self::P360,
            "audio only" | "audio-only" | "audio" => Self::AudioOnly,
            _ => Self::P360,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
            Self::AudioOnly => "Audio only",
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::P360
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single download request. Immutable once the download starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    pub output_dir: PathBuf,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, quality: Quality, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            quality,
            output_dir: output_dir.into(),
        }
    }

    /// Reject requests the external tool could never act on.
    pub fn validate(&self) -> AppResult<()> {
        let parsed = url::Url::parse(self.url.trim())
            .map_err(|e| AppError::InvalidRequest(format!("invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidRequest(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(AppError::InvalidRequest(
                "output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal outcome of a download run.
///
/// `Cancelled` is a distinct outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum DownloadOutcome {
    Completed,
    Failed { message: String },
    Cancelled,
}

impl std::fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed { message } => write!(f, "failed: {}", message),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Lifecycle of a download session.
///
/// Idle -> Launching -> Running -> {Completed | Failed | Cancelled}; the
/// manager folds any terminal state back to Idle when the slot is reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadState {
    Idle,
    Launching,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Events delivered to the presentation layer.
///
/// The worker never touches UI state directly; everything crosses over this
/// channel and the presentation layer drains it on its own schedule.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum DownloadEvent {
    TaskStarted {
        run_id: String,
        title: String,
    },
    /// Completion fraction in [0.0, 1.0], derived per output line.
    TaskProgress {
        fraction: f64,
    },
    /// Raw output line, forwarded for live display.
    StatusLine {
        line: String,
    },
    TaskCompleted {
        title: String,
    },
    TaskFailed {
        error: String,
    },
    TaskCancelled,
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The external executable could not be started. Fatal to the request.
    #[error("Failed to launch downloader: {0}")]
    Launch(String),

    /// The external tool exited nonzero.
    #[error("{0}")]
    ProcessFailure(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A second download was requested while one is active. Requests are
    /// rejected, never queued.
    #[error("A download is already in progress")]
    Busy,

    #[error("No download is currently running")]
    NoActiveDownload,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Log/history write failure. Swallowed by the reporter; only surfaces
    /// through the diagnostic channel.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
