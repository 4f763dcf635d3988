//! Diagnostic logging setup.
//!
//! Persistence failures and other internal problems land here, never in
//! front of the user. With the `local-logging` feature enabled, diagnostics
//! additionally go to a file next to the application data.

use tracing_subscriber::EnvFilter;

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "videodl=info".into())
}

/// Initialize the tracing subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    #[cfg(feature = "local-logging")]
    {
        use std::sync::OnceLock;
        use tracing_appender::non_blocking::WorkerGuard;

        static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

        let log_dir = crate::core::config::AppConfig::get_data_dir()
            .map(|dir| dir.join("diagnostics"))
            .unwrap_or_else(|_| std::path::PathBuf::from("log"));

        if std::fs::create_dir_all(&log_dir).is_ok() {
            let appender = tracing_appender::rolling::daily(&log_dir, "videodl.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);

            let _ = tracing_subscriber::fmt()
                .with_env_filter(default_filter())
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            return;
        }
        // Directory creation failed; fall through to stderr logging.
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
