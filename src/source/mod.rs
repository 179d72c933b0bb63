use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub mod data_api;
pub mod ytdlp;

use crate::EnumerationError;

/// One video to transcribe, with its target languages and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// 1-based position in enumeration order
    pub index: usize,

    /// Video URL handed to the fetcher
    pub source_reference: String,

    /// Platform video ID, when known
    pub video_id: Option<String>,

    /// Language codes in order of preference
    pub languages: Vec<String>,

    /// Output file for this item
    pub destination: PathBuf,
}

impl WorkItem {
    /// First language preference, used by fetchers that accept a single hint
    pub fn primary_language(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or("en")
    }
}

/// Video metadata as reported by the YouTube Data API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Identifiers recognized in a YouTube URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub url: String,
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
}

impl SourceRef {
    pub fn is_playlist(&self) -> bool {
        self.playlist_id.is_some()
    }
}

/// Parse a video or playlist URL. `list=` wins over `v=` when both are present.
pub fn parse_reference(url: &str) -> Result<SourceRef, EnumerationError> {
    let parsed = Url::parse(url.trim())
        .map_err(|_| EnumerationError::UnrecognizedUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(EnumerationError::UnrecognizedUrl(url.to_string()));
    }

    let query_value = |key: &str| {
        parsed
            .query_pairs()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    };

    let playlist_id = query_value("list");
    let video_id = match parsed.host_str() {
        Some("youtu.be") | Some("www.youtu.be") => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => query_value("v"),
    };

    if playlist_id.is_none() && video_id.is_none() {
        return Err(EnumerationError::UnrecognizedUrl(url.to_string()));
    }

    Ok(SourceRef {
        url: url.trim().to_string(),
        video_id,
        playlist_id,
    })
}

/// Canonical watch URL for a video ID
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Destination for the `index`-th item: zero-padded index followed by `suffix`
pub fn destination_for(output_dir: &Path, index: usize, suffix: &str) -> PathBuf {
    output_dir.join(format!("{:02}{}", index, suffix))
}

/// Turn listed video URLs into work items with sequential 1-based indices
pub fn build_work_items(
    urls: Vec<String>,
    languages: &[String],
    suffix: &str,
    output_dir: &Path,
) -> Vec<WorkItem> {
    urls.into_iter()
        .enumerate()
        .map(|(i, url)| {
            let index = i + 1;
            let video_id = parse_reference(&url).ok().and_then(|r| r.video_id);
            WorkItem {
                index,
                source_reference: url,
                video_id,
                languages: languages.to_vec(),
                destination: destination_for(output_dir, index, suffix),
            }
        })
        .collect()
}

/// External playlist listing used by the process-backed pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistLister: Send + Sync {
    /// List member video URLs in the platform's native order
    async fn list_videos(&self, playlist_url: &str) -> Result<Vec<String>, EnumerationError>;
}

/// Enumerate a playlist or single video into work items.
///
/// A single video reference becomes one item without calling the lister.
pub async fn enumerate(
    lister: &dyn PlaylistLister,
    url: &str,
    languages: &[String],
    suffix: &str,
    output_dir: &Path,
) -> Result<Vec<WorkItem>, EnumerationError> {
    let reference = parse_reference(url)?;

    let urls = if reference.is_playlist() {
        lister.list_videos(&reference.url).await?
    } else {
        vec![reference.url.clone()]
    };

    tracing::info!("Enumerated {} video(s) from {}", urls.len(), url);
    Ok(build_work_items(urls, languages, suffix, output_dir))
}

/// Catalog of video metadata used by the API-backed pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Up to `max_items` playlist members, in playlist order
    async fn playlist_videos(
        &self,
        playlist_id: &str,
        max_items: usize,
    ) -> Result<Vec<VideoInfo>, EnumerationError>;

    /// Metadata for a single video
    async fn video(&self, video_id: &str) -> Result<VideoInfo, EnumerationError>;
}
