//! End-to-end tests for the download manager.
//!
//! A shell script stands in for the external downloader so the full path
//! (title resolution, spawn, line parsing, cancellation, cleanup, history)
//! runs against a real child process without touching the network.

#[cfg(unix)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use tokio::time::timeout;

    use crate::core::config::{AppConfig, HistoryConfig};
    use crate::core::history::RunRecord;
    use crate::core::manager::{DownloadManager, EventReceiver};
    use crate::core::models::{
        AppError, DownloadEvent, DownloadOutcome, DownloadRequest, Quality,
    };

    const TEST_URL: &str = "https://example.com/watch?v=abc123";

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-downloader.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn test_config(dir: &Path, script: &Path) -> AppConfig {
        AppConfig {
            downloader_path: script.to_path_buf(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            output_dir: dir.join("out"),
            history: HistoryConfig {
                enabled: true,
                log_dir: Some(dir.join("logs")),
                history_file: Some(dir.join("history.jsonl")),
            },
        }
    }

    fn request_into(config: &AppConfig) -> DownloadRequest {
        DownloadRequest::new(TEST_URL, Quality::P720, config.output_dir.clone())
    }

    async fn next_event(events: &mut EventReceiver) -> DownloadEvent {
        timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed unexpectedly")
    }

    /// Drain events until a terminal one arrives, collecting progress values.
    async fn wait_for_terminal(
        events: &mut EventReceiver,
        progress: &mut Vec<f64>,
    ) -> DownloadEvent {
        loop {
            let event = next_event(events).await;
            match event {
                DownloadEvent::TaskProgress { fraction } => progress.push(fraction),
                DownloadEvent::TaskCompleted { .. }
                | DownloadEvent::TaskFailed { .. }
                | DownloadEvent::TaskCancelled => return event,
                _ => {}
            }
        }
    }

    const COMPLETING_SCRIPT: &str = r#"for arg in "$@"; do
  if [ "$arg" = "--print" ]; then
    echo "My Test Video"
    exit 0
  fi
done
echo "[youtube] Extracting URL"
echo "[download] Destination: My Test Video.mp4"
echo "[download]  42.1% of 5.00MiB at 1.23MiB/s ETA 00:10"
echo "[download] 100% of 5.00MiB in 00:05"
exit 0"#;

    const FAILING_SCRIPT: &str = r#"for arg in "$@"; do
  if [ "$arg" = "--print" ]; then
    echo "Broken Video"
    exit 0
  fi
done
echo "[youtube] Extracting URL"
echo "ERROR: network unreachable"
exit 1"#;

    const SLOW_SCRIPT: &str = r#"for arg in "$@"; do
  if [ "$arg" = "--print" ]; then
    echo "Slow Video"
    exit 0
  fi
done
echo "[download]   1.0% of 100.00MiB at 1.00MiB/s ETA 01:40"
sleep 30
echo "[download] 100% of 100.00MiB in 01:40"
exit 0"#;

    const TITLELESS_SCRIPT: &str = r#"for arg in "$@"; do
  if [ "$arg" = "--print" ]; then
    exit 1
  fi
done
echo "[download] 100% of 1.00MiB in 00:01"
exit 0"#;

    #[tokio::test]
    async fn completed_download_emits_progress_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), COMPLETING_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, mut events) = DownloadManager::new(config.clone());

        manager.start_download(request_into(&config)).unwrap();

        let started = next_event(&mut events).await;
        match started {
            DownloadEvent::TaskStarted { title, run_id } => {
                assert_eq!(title, "My Test Video");
                assert!(!run_id.is_empty());
            }
            other => panic!("expected TaskStarted, got {:?}", other),
        }

        let mut progress = Vec::new();
        let terminal = wait_for_terminal(&mut events, &mut progress).await;
        assert!(
            matches!(terminal, DownloadEvent::TaskCompleted { ref title } if title == "My Test Video")
        );

        assert!(progress.iter().any(|p| (p - 0.421).abs() < 1e-9));
        assert!(progress.iter().any(|p| (p - 1.0).abs() < 1e-9));

        manager.wait_for_idle().await;
        assert!(!manager.is_busy());

        let history = std::fs::read_to_string(dir.path().join("history.jsonl")).unwrap();
        let record: RunRecord = serde_json::from_str(history.lines().next().unwrap()).unwrap();
        assert_eq!(record.outcome, DownloadOutcome::Completed);
        assert_eq!(record.title, "My Test Video");
        assert_eq!(record.url, TEST_URL);

        let log_dir = dir.path().join("logs");
        let log_file = std::fs::read_dir(&log_dir).unwrap().next().unwrap().unwrap();
        let log = std::fs::read_to_string(log_file.path()).unwrap();
        // Destination line is relevant; the progress lines are not.
        assert!(log.contains("[download] Destination: My Test Video.mp4"));
        assert!(!log.contains("42.1%"));
    }

    #[tokio::test]
    async fn failed_download_reports_the_first_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), FAILING_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, mut events) = DownloadManager::new(config.clone());

        manager.start_download(request_into(&config)).unwrap();

        let mut progress = Vec::new();
        let terminal = wait_for_terminal(&mut events, &mut progress).await;
        match terminal {
            DownloadEvent::TaskFailed { error } => {
                assert_eq!(error, "ERROR: network unreachable");
            }
            other => panic!("expected TaskFailed, got {:?}", other),
        }

        manager.wait_for_idle().await;
        let history = std::fs::read_to_string(dir.path().join("history.jsonl")).unwrap();
        let record: RunRecord = serde_json::from_str(history.lines().next().unwrap()).unwrap();
        assert_eq!(
            record.outcome,
            DownloadOutcome::Failed {
                message: "ERROR: network unreachable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn cancelled_download_sweeps_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), SLOW_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, mut events) = DownloadManager::new(config.clone());

        manager.start_download(request_into(&config)).unwrap();

        // Wait until the run is demonstrably consuming output.
        loop {
            if let DownloadEvent::TaskProgress { .. } = next_event(&mut events).await {
                break;
            }
        }

        let partial = config.output_dir.join("Slow Video.mp4.part");
        std::fs::write(&partial, b"partial data").unwrap();

        manager.cancel().unwrap();

        let mut progress = Vec::new();
        let terminal = wait_for_terminal(&mut events, &mut progress).await;
        assert!(matches!(terminal, DownloadEvent::TaskCancelled));
        // The reader stopped at the cancellation check; the script's final
        // 100% line was never consumed.
        assert!(progress.iter().all(|p| *p < 1.0));

        manager.wait_for_idle().await;
        assert!(!partial.exists());
        assert!(!manager.is_busy());

        let history = std::fs::read_to_string(dir.path().join("history.jsonl")).unwrap();
        let record: RunRecord = serde_json::from_str(history.lines().next().unwrap()).unwrap();
        assert_eq!(record.outcome, DownloadOutcome::Cancelled);
    }

    #[tokio::test]
    async fn second_download_while_busy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), SLOW_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, mut events) = DownloadManager::new(config.clone());

        manager.start_download(request_into(&config)).unwrap();
        assert!(manager.is_busy());

        let rejected = manager.start_download(request_into(&config));
        assert!(matches!(rejected, Err(AppError::Busy)));

        manager.cancel().unwrap();
        let mut progress = Vec::new();
        wait_for_terminal(&mut events, &mut progress).await;
        manager.wait_for_idle().await;
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn cancel_while_idle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), COMPLETING_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, _events) = DownloadManager::new(config);

        assert!(matches!(manager.cancel(), Err(AppError::NoActiveDownload)));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), COMPLETING_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, _events) = DownloadManager::new(config.clone());

        let mut bad = request_into(&config);
        bad.url = "definitely not a url".to_string();
        assert!(matches!(
            manager.start_download(bad),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn failed_title_query_falls_back_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), TITLELESS_SCRIPT);
        let config = test_config(dir.path(), &script);
        let (mut manager, mut events) = DownloadManager::new(config.clone());

        manager.start_download(request_into(&config)).unwrap();

        let started = next_event(&mut events).await;
        match started {
            DownloadEvent::TaskStarted { title, .. } => assert_eq!(title, "Unknown"),
            other => panic!("expected TaskStarted, got {:?}", other),
        }

        let mut progress = Vec::new();
        let terminal = wait_for_terminal(&mut events, &mut progress).await;
        assert!(matches!(terminal, DownloadEvent::TaskCompleted { ref title } if title == "Unknown"));
        manager.wait_for_idle().await;
    }

    #[tokio::test]
    async fn missing_downloader_binary_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path(), Path::new("/nonexistent/videodl-tool"));
        config.history.enabled = false;
        let (mut manager, mut events) = DownloadManager::new(config.clone());

        manager.start_download(request_into(&config)).unwrap();

        let mut progress = Vec::new();
        let terminal = wait_for_terminal(&mut events, &mut progress).await;
        match terminal {
            DownloadEvent::TaskFailed { error } => {
                assert!(error.contains("Failed to launch downloader"));
            }
            other => panic!("expected TaskFailed, got {:?}", other),
        }
        manager.wait_for_idle().await;
    }
}
