//! videodl - download orchestration for a desktop video downloader.
//!
//! The crate supervises an external downloader executable: it builds the
//! command line from a [`DownloadRequest`], streams the tool's output line
//! by line, extracts progress percentages, filters status lines, supports
//! cooperative cancellation with partial-file cleanup, and classifies the
//! outcome by exit code. Progress and status reach the presentation layer
//! over an event channel; nothing here touches UI state directly.

pub mod core;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    config::AppConfig,
    history::{HistoryWriter, RunRecord},
    launcher::ProcessLauncher,
    manager::{DownloadManager, EventReceiver, EventSender},
    models::{
        AppError, AppResult, DownloadEvent, DownloadOutcome, DownloadRequest, DownloadState,
        Quality,
    },
    session::CancelHandle,
};
