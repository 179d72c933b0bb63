use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod captions;
pub mod fabric;

pub use captions::{select_track, CaptionFetcher, CaptionSource, CaptionTrack, WatchPageCaptions};
pub use fabric::FabricFetcher;

use crate::source::WorkItem;
use crate::FetchError;

/// Timestamped fragment of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// A fetched transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Language code of the track that was used
    pub language: String,

    /// Full text
    pub text: String,

    /// Timed segments, empty when the backend only yields plain text
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Build a transcript whose text is the segments joined by single spaces
    pub fn from_segments(language: impl Into<String>, segments: Vec<Segment>) -> Self {
        let text = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            language: language.into(),
            text,
            segments,
        }
    }
}

/// Outcome of fetching one work item
pub type TranscriptResult = std::result::Result<Transcript, FetchError>;

/// Strategy for obtaining the transcript of a single work item
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, item: &WorkItem) -> TranscriptResult;

    /// Name of this backend
    fn backend_name(&self) -> &'static str;
}
