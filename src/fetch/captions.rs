//! Caption-track transcript fetching
//!
//! Lists the caption tracks a video exposes, picks one by language preference
//! and downloads it as timed segments. [`WatchPageCaptions`] reads the track
//! list embedded in the watch page and downloads tracks in the `json3`
//! timed-text format.

use async_trait::async_trait;
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{Segment, Transcript, TranscriptFetcher, TranscriptResult};
use crate::source::WorkItem;
use crate::FetchError;

/// One language's transcript as listed for a video
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub base_url: String,
    /// Auto-generated (speech recognition) rather than manually created
    pub is_generated: bool,
}

/// Source of caption tracks for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, FetchError>;

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<Segment>, FetchError>;
}

/// Pick the track to download.
///
/// The first preferred code with any track wins, a manual track beating a
/// generated one for the same code. Without a match, the manually-created track
/// with the smallest language code is used. Generated tracks are never a
/// fallback.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], preferred: &[String]) -> Option<&'a CaptionTrack> {
    for code in preferred {
        let matched = tracks
            .iter()
            .filter(|track| &track.language_code == code)
            .min_by_key(|track| track.is_generated);
        if matched.is_some() {
            return matched;
        }
    }

    tracks
        .iter()
        .filter(|track| !track.is_generated)
        .min_by(|a, b| a.language_code.cmp(&b.language_code))
}

/// API-backed transcript fetcher
pub struct CaptionFetcher<C> {
    source: C,
}

impl<C: CaptionSource> CaptionFetcher<C> {
    pub fn new(source: C) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<C: CaptionSource> TranscriptFetcher for CaptionFetcher<C> {
    async fn fetch(&self, item: &WorkItem) -> TranscriptResult {
        let video_id = item.video_id.as_deref().ok_or_else(|| {
            FetchError::Client(format!("no video id in {}", item.source_reference))
        })?;

        let tracks = self.source.list_tracks(video_id).await?;
        tracing::debug!(
            "Video {} has caption tracks: {:?}",
            video_id,
            tracks.iter().map(|t| t.language_code.as_str()).collect::<Vec<_>>()
        );

        let track = select_track(&tracks, &item.languages)
            .ok_or_else(|| FetchError::NoTranscript(video_id.to_string()))?;

        if !item.languages.contains(&track.language_code) {
            tracing::info!(
                "No preferred language for {}, falling back to {}",
                video_id,
                track.language_code
            );
        }

        let segments = self.source.fetch_segments(track).await?;
        Ok(Transcript::from_segments(track.language_code.clone(), segments))
    }

    fn backend_name(&self) -> &'static str {
        "captions"
    }
}

const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

/// Caption source that scrapes the track list from the video's watch page
pub struct WatchPageCaptions {
    client: Client,
    watch_base: String,
}

impl WatchPageCaptions {
    pub fn new(watch_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            watch_base: watch_base.into(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()
            .await
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Client(format!("HTTP {} from {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Client(e.to_string()))
    }
}

#[async_trait]
impl CaptionSource for WatchPageCaptions {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, FetchError> {
        let url = format!(
            "{}/watch?v={}&hl=en",
            self.watch_base.trim_end_matches('/'),
            video_id
        );
        let html = self.get_text(&url).await?;
        parse_caption_tracks(&html, video_id)
    }

    async fn fetch_segments(&self, track: &CaptionTrack) -> Result<Vec<Segment>, FetchError> {
        let url = json3_url(&track.base_url)?;
        let body = self.get_text(&url).await?;
        parse_json3(&body, &track_video_id(&track.base_url))
    }
}

/// Extract the `captionTracks` array embedded in a watch page
pub(crate) fn parse_caption_tracks(html: &str, video_id: &str) -> Result<Vec<CaptionTrack>, FetchError> {
    let Some(position) = html.find(CAPTION_TRACKS_MARKER) else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(FetchError::RateLimited);
        }
        return Err(FetchError::NoTranscript(video_id.to_string()));
    };

    let rest = &html[position + CAPTION_TRACKS_MARKER.len()..];
    let raw_tracks = serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<RawCaptionTrack>>()
        .next()
        .ok_or_else(|| FetchError::Client("empty caption track list".to_string()))?
        .map_err(|e| FetchError::Client(format!("malformed caption track list: {}", e)))?;

    Ok(raw_tracks.into_iter().map(RawCaptionTrack::into_track).collect())
}

/// Track URL asking for the `json3` timed-text format
fn json3_url(base_url: &str) -> Result<String, FetchError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| FetchError::Client(format!("invalid caption url {}: {}", base_url, e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url.to_string())
}

/// Video a timed-text URL belongs to, or the URL itself if it names none
fn track_video_id(base_url: &str) -> String {
    Url::parse(base_url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| base_url.to_string())
}

/// Parse a `json3` timed-text document into segments, dropping empty events.
///
/// Tracks gated behind a proof-of-origin token come back as an empty body.
pub(crate) fn parse_json3(body: &str, video_id: &str) -> Result<Vec<Segment>, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::NoTranscript(video_id.to_string()));
    }

    let document: Json3Document = serde_json::from_str(body)
        .map_err(|e| FetchError::Client(format!("malformed timed text: {}", e)))?;

    let segments = document
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs?
                .into_iter()
                .map(|seg| seg.utf8)
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Segment {
                text: text.to_string(),
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect();

    Ok(segments)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
    name: Option<RawTrackName>,
}

impl RawCaptionTrack {
    fn into_track(self) -> CaptionTrack {
        let name = self
            .name
            .and_then(|name| {
                name.simple_text.or_else(|| {
                    name.runs
                        .map(|runs| runs.into_iter().map(|run| run.text).collect::<String>())
                })
            })
            .unwrap_or_else(|| self.language_code.clone());

        CaptionTrack {
            is_generated: self.kind.as_deref() == Some("asr"),
            language_code: self.language_code,
            name,
            base_url: self.base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrackName {
    simple_text: Option<String>,
    runs: Option<Vec<RawRun>>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}
