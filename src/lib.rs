//! yt-transcripts - A Rust CLI tool for fetching YouTube transcripts
//!
//! This library enumerates YouTube playlists or single videos and fetches their
//! transcripts either by shelling out to `yt-dlp`/`fabric-ai` across a bounded
//! worker pool, or by talking to the YouTube Data API and the platform's caption
//! tracks directly.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use fetch::{Segment, Transcript, TranscriptFetcher, TranscriptResult};
pub use output::{RecordWriter, RunSummary, SourceType, VideoRecord};
pub use pipeline::{ItemOutcome, ParallelPipeline, PoolOptions, ScrapePipeline};
pub use source::{SourceRef, VideoInfo, WorkItem};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Listing the source failed or the reference is not a video/playlist.
/// Fatal: aborts the run before any fetching begins.
#[derive(thiserror::Error, Debug)]
pub enum EnumerationError {
    #[error("Unrecognized YouTube URL: {0}")]
    UnrecognizedUrl(String),

    #[error("Playlist listing failed: {0}")]
    ListingFailed(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("YouTube Data API request failed: {0}")]
    Api(String),
}

/// Per-item failure to obtain a transcript. Recorded, never escalated.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} exited with {status}: {stderr}")]
    Process {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("no transcript available for video {0}")]
    NoTranscript(String),

    #[error("too many requests, YouTube is asking for a captcha")]
    RateLimited,

    #[error("transcript client error: {0}")]
    Client(String),

    #[error("timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

/// Persisting a result failed.
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Either half of a work item's processing can fail.
#[derive(thiserror::Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("worker failed: {0}")]
    Worker(String),
}
