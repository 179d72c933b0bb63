use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::source::data_api::MAX_PAGE_SIZE;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tools used by the process-backed pipeline
    pub tools: ToolsConfig,

    /// Process-backed pipeline settings
    pub pipeline: PipelineConfig,

    /// API-backed pipeline settings
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// fabric-ai executable
    pub fabric_path: String,

    /// Seconds yt-dlp sleeps between requests, forwarded through fabric-ai
    pub sleep_requests: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Language hint passed to fabric-ai
    pub default_language: String,

    /// Appended to the zero-padded index to name each transcript file
    pub file_suffix: String,

    /// Directory transcript files are written to
    pub output_dir: PathBuf,

    /// Videos processed at the same time
    pub max_workers: usize,

    /// Per-video limit in seconds (no limit if unset)
    pub task_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// YouTube Data API v3 base URL
    pub base_url: String,

    /// Site the caption tracks are read from
    pub watch_url: String,

    /// Upper bound on playlist videos processed per run
    pub max_videos: usize,

    /// Playlist items requested per page
    pub page_size: usize,

    /// Caption languages in order of preference
    pub preferred_languages: Vec<String>,

    /// Directory JSON transcripts and summaries are written to
    pub output_dir: PathBuf,

    /// Video descriptions are cut to this many characters
    pub description_limit: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            fabric_path: "fabric-ai".to_string(),
            sleep_requests: Some(1),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            file_suffix: ".txt".to_string(),
            output_dir: PathBuf::from("."),
            max_workers: 4,
            task_timeout_secs: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            watch_url: "https://www.youtube.com".to_string(),
            max_videos: 36,
            page_size: MAX_PAGE_SIZE,
            preferred_languages: vec![
                "hi".to_string(),
                "en".to_string(),
                "en-US".to_string(),
                "en-GB".to_string(),
            ],
            output_dir: PathBuf::from("src/data/video_transcripts"),
            description_limit: 500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig::default(),
            pipeline: PipelineConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!("Could not write default config to {}: {}", config_path.display(), e);
            }
            Ok(config)
        }
    }

    /// Load and validate a specific configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // Current directory first for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("yt-transcripts").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_workers == 0 {
            anyhow::bail!("pipeline.max_workers must be at least 1");
        }

        if self.api.max_videos == 0 {
            anyhow::bail!("api.max_videos must be at least 1");
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.api.page_size) {
            anyhow::bail!("api.page_size must be between 1 and {}", MAX_PAGE_SIZE);
        }

        if self.api.preferred_languages.is_empty() {
            anyhow::bail!("api.preferred_languages must name at least one language");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  yt-dlp: {}", self.tools.yt_dlp_path);
        println!("  fabric-ai: {}", self.tools.fabric_path);
        if let Some(seconds) = self.tools.sleep_requests {
            println!("  Sleep Between Requests: {}s", seconds);
        }
        println!("  Default Language: {}", self.pipeline.default_language);
        println!("  File Suffix: {}", self.pipeline.file_suffix);
        println!("  Transcript Directory: {}", self.pipeline.output_dir.display());
        println!("  Workers: {}", self.pipeline.max_workers);
        if let Some(timeout) = self.pipeline.task_timeout_secs {
            println!("  Per-Video Timeout: {}s", timeout);
        }
        println!("  Data API: {}", self.api.base_url);
        println!("  Max Videos: {}", self.api.max_videos);
        println!("  Preferred Languages: {}", self.api.preferred_languages.join(", "));
        println!("  JSON Output Directory: {}", self.api.output_dir.display());
    }
}
