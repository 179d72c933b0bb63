use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::PlaylistLister;
use crate::EnumerationError;

/// Playlist lister backed by `yt-dlp --flat-playlist`
pub struct YtDlpLister {
    yt_dlp_path: String,
}

impl YtDlpLister {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }
}

/// Non-empty, trimmed lines of `yt-dlp --print` output
pub(crate) fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl PlaylistLister for YtDlpLister {
    async fn list_videos(&self, playlist_url: &str) -> Result<Vec<String>, EnumerationError> {
        tracing::debug!("Listing playlist with {}: {}", self.yt_dlp_path, playlist_url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--flat-playlist", "--print", "%(webpage_url)s", playlist_url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                EnumerationError::ListingFailed(format!("could not run {}: {}", self.yt_dlp_path, e))
            })?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(EnumerationError::ListingFailed(error.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_listing(&stdout))
    }
}

impl Default for YtDlpLister {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}
