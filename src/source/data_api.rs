use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;

use super::{VideoCatalog, VideoInfo};
use crate::utils::truncate_chars;
use crate::EnumerationError;

/// The Data API never returns more than 50 items per page
pub const MAX_PAGE_SIZE: usize = 50;

/// YouTube Data API v3 client
pub struct DataApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    page_size: usize,
    description_limit: usize,
}

impl DataApiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            page_size: MAX_PAGE_SIZE,
            description_limit: 500,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, EnumerationError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| EnumerationError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnumerationError::Api(format!(
                "HTTP {}: {}",
                status,
                api_error_message(&body)
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EnumerationError::Api(format!("invalid response from {}: {}", endpoint, e)))
    }

    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
        max_results: usize,
    ) -> Result<Page, EnumerationError> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;
        Ok(response.into_page(self.description_limit))
    }
}

#[async_trait]
impl VideoCatalog for DataApiClient {
    async fn playlist_videos(
        &self,
        playlist_id: &str,
        max_items: usize,
    ) -> Result<Vec<VideoInfo>, EnumerationError> {
        let client = self;
        collect_pages(max_items, self.page_size, move |token, batch| {
            client.playlist_page(playlist_id, token, batch)
        })
        .await
    }

    async fn video(&self, video_id: &str) -> Result<VideoInfo, EnumerationError> {
        let query = [
            ("part", "snippet,contentDetails".to_string()),
            ("id", video_id.to_string()),
        ];
        let response: VideosResponse = self.get_json("videos", &query).await?;
        response.into_video(video_id, self.description_limit)
    }
}

/// One page of playlist members
#[derive(Debug, Default)]
pub(crate) struct Page {
    pub videos: Vec<VideoInfo>,
    pub next_page_token: Option<String>,
}

/// Walk pages in batches of `min(page_size, remaining)` until `max_items` are
/// collected or no pages remain. Only a failing first page is fatal; a later
/// failure keeps what was already collected.
pub(crate) async fn collect_pages<F, Fut>(
    max_items: usize,
    page_size: usize,
    mut fetch_page: F,
) -> Result<Vec<VideoInfo>, EnumerationError>
where
    F: FnMut(Option<String>, usize) -> Fut,
    Fut: Future<Output = Result<Page, EnumerationError>>,
{
    let mut videos: Vec<VideoInfo> = Vec::new();
    let mut page_token = None;
    let mut first_page = true;

    while videos.len() < max_items {
        let batch = page_size.max(1).min(max_items - videos.len());

        match fetch_page(page_token.take(), batch).await {
            Ok(page) => {
                videos.extend(page.videos);
                page_token = page.next_page_token;
                if page_token.is_none() {
                    break;
                }
            }
            Err(e) if first_page => return Err(e),
            Err(e) => {
                tracing::warn!("Stopping playlist pagination after {} videos: {}", videos.len(), e);
                break;
            }
        }

        first_page = false;
    }

    videos.truncate(max_items);
    Ok(videos)
}

/// Pull `error.message` out of a Data API error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

impl PlaylistItemsResponse {
    fn into_page(self, description_limit: usize) -> Page {
        let videos = self
            .items
            .into_iter()
            .filter_map(|item| {
                let snippet = item.snippet;
                let id = snippet.resource_id.video_id?;
                Some(VideoInfo {
                    id,
                    title: snippet.title,
                    description: truncate_chars(&snippet.description, description_limit),
                    published_at: snippet.published_at,
                    duration: None,
                })
            })
            .collect();

        Page {
            videos,
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

impl VideosResponse {
    /// An unknown or private video comes back as an empty `items` list
    fn into_video(self, video_id: &str, description_limit: usize) -> Result<VideoInfo, EnumerationError> {
        self.items
            .into_iter()
            .next()
            .map(|item| item.into_video_info(video_id, description_limit))
            .ok_or_else(|| EnumerationError::VideoNotFound(video_id.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: VideoSnippet,
    content_details: Option<ContentDetails>,
}

impl VideoItem {
    fn into_video_info(self, video_id: &str, description_limit: usize) -> VideoInfo {
        VideoInfo {
            id: video_id.to_string(),
            title: self.snippet.title,
            description: truncate_chars(&self.snippet.description, description_limit),
            published_at: self.snippet.published_at,
            duration: self.content_details.and_then(|c| c.duration),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}
