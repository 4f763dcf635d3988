//! Process launcher for the external downloader.
//!
//! Builds the command line for the bundled downloader executable, resolves
//! the video title ahead of the main run, and spawns the process with both
//! output streams captured. All media work (protocol handling, transcoding,
//! merging) is delegated to the external binaries; this module only knows
//! how to start them and read what they print.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::models::{AppError, AppResult, DownloadRequest, Quality};
use crate::utils::file_utils::sanitize_title;

/// Title used when metadata resolution fails or produces nothing usable.
pub const FALLBACK_TITLE: &str = "Unknown";

/// Launches the external downloader with the right argument list.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    downloader: PathBuf,
    ffmpeg: PathBuf,
}

impl ProcessLauncher {
    pub fn new(downloader: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            downloader: downloader.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Map a quality tier to the downloader's format-selector string.
    pub fn format_selector(quality: Quality) -> &'static str {
        match quality {
            Quality::P1080 => "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
            Quality::P720 => "bestvideo[height<=720]+bestaudio/best[height<=720]",
            Quality::P480 => "bestvideo[height<=480]+bestaudio/best[height<=480]",
            Quality::P360 => "bestvideo[height<=360]+bestaudio/best[height<=360]",
            Quality::AudioOnly => "bestaudio",
        }
    }

    /// Fetch and sanitize the video title via a metadata-only run.
    ///
    /// Never fails: any error or empty result falls back to "Unknown" so the
    /// main run can still produce a predictable output filename.
    pub async fn resolve_title(&self, url: &str) -> String {
        match self.query_title(url).await {
            Ok(title) if !title.is_empty() => title,
            Ok(_) => {
                debug!("Title query returned nothing usable, using fallback");
                FALLBACK_TITLE.to_string()
            }
            Err(e) => {
                warn!("Title resolution failed: {}", e);
                FALLBACK_TITLE.to_string()
            }
        }
    }

    async fn query_title(&self, url: &str) -> AppResult<String> {
        let output = Command::new(&self.downloader)
            .args(["--no-playlist", "--skip-download", "--no-warnings", "--print", "title"])
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| AppError::Launch(format!("{}: {}", self.downloader.display(), e)))?;

        if !output.status.success() {
            return Err(AppError::ProcessFailure(
                "title query exited with an error".to_string(),
            ));
        }

        let first_line = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(sanitize_title(&first_line))
    }

    /// Argument list for the main download run.
    ///
    /// `stem` is the sanitized title; the output template hands extension
    /// selection back to the downloader.
    pub fn build_args(&self, request: &DownloadRequest, stem: &str) -> Vec<String> {
        let output_template = request.output_dir.join(format!("{}.%(ext)s", stem));

        let mut args = vec![
            "-f".to_string(),
            Self::format_selector(request.quality).to_string(),
        ];
        if request.quality != Quality::AudioOnly {
            args.push("--merge-output-format".to_string());
            args.push("mp4".to_string());
        }
        args.extend([
            "--ffmpeg-location".to_string(),
            self.ffmpeg.to_string_lossy().into_owned(),
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            request.url.clone(),
        ]);
        args
    }

    /// Start the main download process with both output streams piped.
    pub fn spawn(&self, request: &DownloadRequest, stem: &str) -> AppResult<Child> {
        let args = self.build_args(request, stem);
        debug!("Spawning {} {:?}", self.downloader.display(), args);

        Command::new(&self.downloader)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Launch(format!("{}: {}", self.downloader.display(), e)))
    }
}

/// Merge the child's stdout and stderr into one ordered line stream.
///
/// Each stream is drained by its own task; the receiver sees lines in
/// arrival order and reaches end-of-stream once both pipes close.
pub fn merged_lines(child: &mut Child) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }

    rx
}
