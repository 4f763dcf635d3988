//! Download Manager - orchestrates the single active download.
//!
//! Owns the at-most-one-active-download invariant: a second request while a
//! run is active is rejected, never queued. All UI-visible updates cross the
//! event channel; the presentation layer drains it on its own schedule.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::downloader::run_download;
use crate::core::history::HistoryWriter;
use crate::core::launcher::ProcessLauncher;
use crate::core::models::{AppError, AppResult, DownloadEvent, DownloadRequest, DownloadState};
use crate::core::session::{CancelHandle, DownloadSession};

/// Channel for communication between the download worker and the UI.
pub type EventSender = mpsc::UnboundedSender<DownloadEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DownloadEvent>;

/// The one active run, reaped once its worker task finishes.
struct ActiveRun {
    session: DownloadSession,
    handle: tokio::task::JoinHandle<()>,
}

/// Main download manager
pub struct DownloadManager {
    launcher: ProcessLauncher,
    history: Arc<HistoryWriter>,
    event_sender: EventSender,
    active: Option<ActiveRun>,
}

impl DownloadManager {
    /// Create a manager from configuration, returning the receiving end of
    /// the event channel for the presentation layer.
    pub fn new(config: AppConfig) -> (Self, EventReceiver) {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        let history = HistoryWriter::new(
            config.resolved_log_dir(),
            config.resolved_history_file(),
            config.history.enabled,
        );

        let manager = Self {
            launcher: ProcessLauncher::new(config.downloader_path, config.ffmpeg_path),
            history: Arc::new(history),
            event_sender,
            active: None,
        };
        (manager, event_receiver)
    }

    /// Start a download. Returns a cancel handle for the presentation layer.
    ///
    /// Fails with [`AppError::Busy`] while another download is active.
    pub fn start_download(&mut self, request: DownloadRequest) -> AppResult<CancelHandle> {
        self.reap_finished();
        if self.active.is_some() {
            return Err(AppError::Busy);
        }
        request.validate()?;

        let session = DownloadSession::new(request);
        let cancel = session.cancel_handle();
        info!(
            "🚀 Starting download {} ({})",
            session.run_id(),
            session.request().url
        );

        let handle = tokio::spawn(run_download(
            session.clone(),
            self.launcher.clone(),
            Arc::clone(&self.history),
            self.event_sender.clone(),
        ));
        self.active = Some(ActiveRun { session, handle });
        Ok(cancel)
    }

    /// Cancel the active download.
    ///
    /// Fails with [`AppError::NoActiveDownload`] when nothing is running.
    pub fn cancel(&mut self) -> AppResult<()> {
        self.reap_finished();
        match &self.active {
            Some(run) => {
                debug!("Cancel requested for run {}", run.session.run_id());
                run.session.cancel_handle().cancel();
                Ok(())
            }
            None => Err(AppError::NoActiveDownload),
        }
    }

    /// Current lifecycle state; Idle once the last run has been reaped.
    pub async fn state(&mut self) -> DownloadState {
        self.reap_finished();
        match &self.active {
            Some(run) => run.session.state().await,
            None => DownloadState::Idle,
        }
    }

    pub fn is_busy(&mut self) -> bool {
        self.reap_finished();
        self.active.is_some()
    }

    /// Wait for the active worker to finish. Mainly useful for shutdown.
    pub async fn wait_for_idle(&mut self) {
        if let Some(run) = self.active.take() {
            let _ = run.handle.await;
        }
    }

    fn reap_finished(&mut self) {
        if self
            .active
            .as_ref()
            .map(|run| run.handle.is_finished())
            .unwrap_or(false)
        {
            self.active = None;
        }
    }
}
