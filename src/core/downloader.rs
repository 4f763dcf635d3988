//! Download worker - supervises one external downloader process.
//!
//! A single background task per download: resolve the title, spawn the
//! process, consume its merged output line by line (the only suspension
//! point), forward progress and status over the event channel, and classify
//! the terminal outcome. Cancellation is re-checked after every line; a
//! cancelled run kills the process and sweeps its partial output files.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::history::{HistoryWriter, RunRecord};
use crate::core::launcher::{merged_lines, ProcessLauncher};
use crate::core::manager::EventSender;
use crate::core::models::{DownloadEvent, DownloadOutcome, DownloadState};
use crate::core::parser;
use crate::core::reporter;
use crate::core::session::DownloadSession;
use crate::utils::file_utils::remove_partial_outputs;

/// Grace period between killing the process and sweeping partial files,
/// giving the OS time to release file handles.
const HANDLE_RELEASE_DELAY: Duration = Duration::from_millis(250);

/// Entry point of the worker task spawned by the manager.
pub(crate) async fn run_download(
    session: DownloadSession,
    launcher: ProcessLauncher,
    history: Arc<HistoryWriter>,
    events: EventSender,
) {
    session.set_state(DownloadState::Launching).await;

    let title = launcher.resolve_title(&session.request().url).await;
    let _ = events.send(DownloadEvent::TaskStarted {
        run_id: session.run_id().to_string(),
        title: title.clone(),
    });

    let mut run_log = Vec::new();
    let outcome = if session.is_cancelled() {
        DownloadOutcome::Cancelled
    } else {
        supervise(&session, &launcher, &title, &events, &mut run_log).await
    };

    let state = match &outcome {
        DownloadOutcome::Completed => DownloadState::Completed,
        DownloadOutcome::Failed { .. } => DownloadState::Failed,
        DownloadOutcome::Cancelled => DownloadState::Cancelled,
    };
    session.set_state(state).await;

    match &outcome {
        DownloadOutcome::Completed => {
            info!("✅ Download completed: {}", title);
            let _ = events.send(DownloadEvent::TaskCompleted {
                title: title.clone(),
            });
        }
        DownloadOutcome::Failed { message } => {
            warn!("Download failed: {}", message);
            let _ = events.send(DownloadEvent::TaskFailed {
                error: message.clone(),
            });
        }
        DownloadOutcome::Cancelled => {
            info!("🛑 Download cancelled: {}", title);
            let _ = events.send(DownloadEvent::TaskCancelled);
        }
    }

    let record = RunRecord {
        timestamp: Utc::now(),
        run_id: session.run_id().to_string(),
        outcome,
        title,
        url: session.request().url.clone(),
    };
    history.record_run(&record, &run_log).await;
}

/// Run the external process to completion, cancellation, or failure.
async fn supervise(
    session: &DownloadSession,
    launcher: &ProcessLauncher,
    title: &str,
    events: &EventSender,
    run_log: &mut Vec<String>,
) -> DownloadOutcome {
    if let Err(e) = tokio::fs::create_dir_all(&session.request().output_dir).await {
        return DownloadOutcome::Failed {
            message: format!("Could not create output directory: {}", e),
        };
    }

    let mut child = match launcher.spawn(session.request(), title) {
        Ok(child) => child,
        Err(e) => {
            return DownloadOutcome::Failed {
                message: e.to_string(),
            }
        }
    };
    session.set_state(DownloadState::Running).await;

    let mut lines = merged_lines(&mut child);
    let mut captured = Vec::new();
    let mut cancelled = false;

    loop {
        tokio::select! {
            // Check the cancellation flag before consuming another line.
            biased;
            _ = session.cancelled() => {
                cancelled = true;
                break;
            }
            next = lines.recv() => match next {
                Some(raw) => {
                    let line = raw.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = events.send(DownloadEvent::StatusLine { line: line.clone() });
                    if let Some(fraction) = parser::parse_progress(&line) {
                        let _ = events.send(DownloadEvent::TaskProgress { fraction });
                    }
                    if parser::is_relevant(&line) {
                        run_log.push(line.clone());
                    }
                    captured.push(line);
                }
                None => break,
            },
        }
    }

    if cancelled {
        debug!("Cancellation requested, terminating the downloader process");
        if let Err(e) = child.kill().await {
            warn!("Failed to kill downloader process: {}", e);
        }
        tokio::time::sleep(HANDLE_RELEASE_DELAY).await;
        let removed = remove_partial_outputs(&session.request().output_dir, title).await;
        if removed > 0 {
            debug!("Swept {} partial file(s) for \"{}\"", removed, title);
        }
        return DownloadOutcome::Cancelled;
    }

    match child.wait().await {
        Ok(status) => reporter::classify_exit(status, &captured),
        Err(e) => DownloadOutcome::Failed {
            message: format!("Failed to wait for downloader: {}", e),
        },
    }
}
