//! Best-effort run log and history persistence.
//!
//! Two optional file outputs: a dated plain-text log (one file per day,
//! appended) holding the relevant lines of each run, and a single
//! append-only history file with one JSON record per finished run. Write
//! failures go to the diagnostic channel only and never reach the caller.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::models::{AppError, AppResult, DownloadOutcome};

/// One line of the append-only history file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub run_id: String,
    pub outcome: DownloadOutcome,
    pub title: String,
    pub url: String,
}

/// Appends run logs and history records.
#[derive(Debug, Clone)]
pub struct HistoryWriter {
    log_dir: PathBuf,
    history_path: PathBuf,
    enabled: bool,
}

impl HistoryWriter {
    pub fn new(log_dir: impl Into<PathBuf>, history_path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            log_dir: log_dir.into(),
            history_path: history_path.into(),
            enabled,
        }
    }

    /// Writer that records nothing.
    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), PathBuf::new(), false)
    }

    /// Persist one finished run. Never fails; persistence problems are
    /// logged and swallowed.
    pub async fn record_run(&self, record: &RunRecord, relevant_lines: &[String]) {
        if !self.enabled {
            return;
        }

        if let Err(e) = self.append_run_log(record, relevant_lines).await {
            warn!("Could not write run log: {}", e);
        }
        if let Err(e) = self.append_history(record).await {
            warn!("Could not write history record: {}", e);
        }
    }

    /// Path of today's run log file.
    pub fn current_log_path(&self) -> PathBuf {
        let day = Local::now().format("%Y-%m-%d");
        self.log_dir.join(format!("videodl-{}.log", day))
    }

    pub fn history_path(&self) -> &PathBuf {
        &self.history_path
    }

    async fn append_run_log(&self, record: &RunRecord, relevant_lines: &[String]) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.log_dir).await?;
        let path = self.current_log_path();

        let mut entry = format!(
            "[{}] {} \"{}\" {}\n",
            record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            record.outcome,
            record.title,
            record.url
        );
        for line in relevant_lines {
            entry.push_str("    ");
            entry.push_str(line);
            entry.push('\n');
        }
        entry.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        debug!("Appended run log entry to {}", path.display());
        Ok(())
    }

    async fn append_history(&self, record: &RunRecord) -> AppResult<()> {
        if let Some(parent) = self.history_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(record)
            .map_err(|e| AppError::Persistence(format!("serialize history record: {}", e)))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        debug!("Appended history record for run {}", record.run_id);
        Ok(())
    }
}
