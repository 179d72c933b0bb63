use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fetch::Transcript;
use crate::source::VideoInfo;

/// Whether a run was started from a playlist or a single video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Playlist,
    Video,
}

/// Outcome of one video within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// 1-based position in the run
    pub index: usize,
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub transcript_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoRecord {
    /// Record for a video whose metadata is known but nothing has happened yet
    pub fn pending(index: usize, video: &VideoInfo) -> Self {
        Self {
            index,
            video_id: video.id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            published_at: video.published_at.clone(),
            transcript_available: false,
            transcript: None,
            output_file: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.transcript_available && self.error.is_none()
    }
}

/// Aggregate of every video outcome in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed_at: DateTime<Local>,
    pub source_url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    pub videos: Vec<VideoRecord>,
    pub success_count: usize,
    pub error_count: usize,
    /// Where the summary itself was written
    #[serde(skip)]
    pub summary_file: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(source_url: impl Into<String>, source_type: SourceType, playlist_id: Option<String>) -> Self {
        Self {
            processed_at: Local::now(),
            source_url: source_url.into(),
            source_type,
            playlist_id,
            videos: Vec::new(),
            success_count: 0,
            error_count: 0,
            summary_file: None,
        }
    }

    /// Append a finished record and update the counters
    pub fn record(&mut self, record: VideoRecord) {
        if record.succeeded() {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        self.videos.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoInfo {
        VideoInfo {
            id: id.to_string(),
            title: format!("Title {}", id),
            description: "about".to_string(),
            published_at: "2024-05-01T12:00:00Z".to_string(),
            duration: None,
        }
    }

    #[test]
    fn test_counts_follow_records() {
        let mut summary = RunSummary::new("https://youtu.be/a", SourceType::Video, None);

        let mut ok = VideoRecord::pending(1, &video("a"));
        ok.transcript_available = true;
        ok.transcript = Some(Transcript::from_segments("en", Vec::new()));
        summary.record(ok);

        let mut missing = VideoRecord::pending(2, &video("b"));
        missing.error = Some("no transcript available for video b".to_string());
        summary.record(missing);

        let mut unwritten = VideoRecord::pending(3, &video("c"));
        unwritten.transcript_available = true;
        unwritten.error = Some("failed to write".to_string());
        summary.record(unwritten);

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.videos.len(), 3);
    }

    #[test]
    fn test_failed_record_has_no_transcript_key() {
        let mut record = VideoRecord::pending(1, &video("b"));
        record.error = Some("no transcript".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["transcript_available"], false);
        assert!(value.get("transcript").is_none());
        assert!(value.get("output_file").is_none());
        assert_eq!(value["error"], "no transcript");
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = RunSummary::new(
            "https://www.youtube.com/playlist?list=PL1",
            SourceType::Playlist,
            Some("PL1".to_string()),
        );
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["type"], "playlist");
        assert_eq!(value["playlist_id"], "PL1");
        assert_eq!(value["success_count"], 0);
        assert!(value["videos"].as_array().unwrap().is_empty());
        assert!(value.get("summary_file").is_none());
        assert!(value["processed_at"].is_string());
    }
}
