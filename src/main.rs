//! Command-line front end for the download orchestrator.
//!
//! Drives the same event stream a GUI would consume: progress updates render
//! as a percentage line, status lines print as they arrive, and Ctrl-C maps
//! to cooperative cancellation.

use std::env;
use std::io::Write;
use std::path::PathBuf;

use videodl::{
    AppConfig, DownloadEvent, DownloadManager, DownloadOutcome, DownloadRequest, Quality,
};

#[tokio::main]
async fn main() {
    videodl::utils::logging::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: videodl <url> [quality] [output-dir]");
        eprintln!("  quality: 1080p | 720p | 480p | 360p | \"Audio only\" (default 360p)");
        std::process::exit(2);
    }

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: could not load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    let url = args[1].clone();
    let quality = args
        .get(2)
        .map(|label| Quality::from_label(label))
        .unwrap_or_default();
    let output_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output_dir.clone());

    let (mut manager, mut events) = DownloadManager::new(config);
    let cancel = match manager.start_download(DownloadRequest::new(url, quality, output_dir)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = drain_events(&mut events, cancel).await;
    manager.wait_for_idle().await;

    match outcome {
        Some(DownloadOutcome::Completed) => {
            println!("Download completed!");
        }
        Some(DownloadOutcome::Failed { message }) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Some(DownloadOutcome::Cancelled) => {
            println!("Download cancelled.");
            std::process::exit(130);
        }
        None => {
            eprintln!("Error: download ended without reporting an outcome");
            std::process::exit(1);
        }
    }
}

async fn drain_events(
    events: &mut videodl::EventReceiver,
    cancel: videodl::CancelHandle,
) -> Option<DownloadOutcome> {
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    eprintln!("\nCancelling...");
                    cancel.cancel();
                }
            }
            event = events.recv() => match event? {
                DownloadEvent::TaskStarted { title, .. } => {
                    println!("Downloading: {}", title);
                }
                DownloadEvent::TaskProgress { fraction } => {
                    print!("\rProgress: {:5.1}%", fraction * 100.0);
                    let _ = std::io::stdout().flush();
                }
                DownloadEvent::StatusLine { line } => {
                    tracing::debug!("{}", line);
                }
                DownloadEvent::TaskCompleted { .. } => {
                    println!();
                    return Some(DownloadOutcome::Completed);
                }
                DownloadEvent::TaskFailed { error } => {
                    println!();
                    return Some(DownloadOutcome::Failed { message: error });
                }
                DownloadEvent::TaskCancelled => {
                    println!();
                    return Some(DownloadOutcome::Cancelled);
                }
            },
        }
    }
}
