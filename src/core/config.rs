//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the external downloader executable.
    pub downloader_path: PathBuf,
    /// Path to the transcoder helper handed to the downloader for merging.
    pub ffmpeg_path: PathBuf,
    /// Default directory for downloaded files.
    pub output_dir: PathBuf,
    pub history: HistoryConfig,
}

/// Run log / history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Directory for the dated run logs; defaults to `<data dir>/logs`.
    pub log_dir: Option<PathBuf>,
    /// Append-only history file; defaults to `<data dir>/history.jsonl`.
    pub history_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            downloader_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            output_dir: PathBuf::from("downloads"),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: None,
            history_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file, creating default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "videodl", "videodl")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Get the application data directory
    pub fn get_data_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "videodl", "videodl")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.data_dir().to_path_buf())
    }

    /// Directory that receives the dated run logs.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.history.log_dir.clone().unwrap_or_else(|| {
            Self::get_data_dir()
                .map(|d| d.join("logs"))
                .unwrap_or_else(|_| PathBuf::from("logs"))
        })
    }

    /// Location of the append-only history file.
    pub fn resolved_history_file(&self) -> PathBuf {
        self.history.history_file.clone().unwrap_or_else(|| {
            Self::get_data_dir()
                .map(|d| d.join("history.jsonl"))
                .unwrap_or_else(|_| PathBuf::from("history.jsonl"))
        })
    }
}
