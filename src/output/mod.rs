use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub mod summary;

pub use summary::{RunSummary, SourceType, VideoRecord};

use crate::fetch::Transcript;
use crate::source::VideoInfo;
use crate::utils::{absolute_path, sanitize_filename};
use crate::WriteError;

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write transcript text verbatim, creating parent directories and
/// overwriting any previous file. Returns the absolute path written.
pub async fn write_text(path: &Path, text: &str) -> Result<PathBuf, WriteError> {
    let path = absolute_path(path).map_err(|e| io_error(path, e))?;

    if let Some(parent) = path.parent() {
        fs_err::tokio::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    fs_err::tokio::write(&path, text)
        .await
        .map_err(|e| io_error(&path, e))?;

    Ok(path)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf, WriteError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| WriteError::Serialize {
        path: path.display().to_string(),
        source,
    })?;
    write_text(path, &content).await
}

/// Per-video JSON document
#[derive(Debug, Serialize)]
struct TranscriptRecord<'a> {
    video_info: &'a VideoInfo,
    transcript: &'a Transcript,
    processed_at: DateTime<Local>,
}

/// Writes per-video JSON records and the run summary into one directory
#[derive(Debug, Clone)]
pub struct RecordWriter {
    output_dir: PathBuf,
}

impl RecordWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `transcript_<index:03>_<video_id>.json`
    pub fn record_filename(index: usize, video_id: &str) -> String {
        format!("transcript_{:03}_{}.json", index, sanitize_filename(video_id))
    }

    pub async fn write_record(
        &self,
        index: usize,
        video: &VideoInfo,
        transcript: &Transcript,
    ) -> Result<PathBuf, WriteError> {
        let path = self
            .output_dir
            .join(Self::record_filename(index, &video.id));
        let record = TranscriptRecord {
            video_info: video,
            transcript,
            processed_at: Local::now(),
        };
        write_json(&path, &record).await
    }

    /// `processing_summary_<%Y%m%d_%H%M%S>.json`
    pub async fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf, WriteError> {
        let filename = format!(
            "processing_summary_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        write_json(&self.output_dir.join(filename), summary).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Segment;

    fn video() -> VideoInfo {
        VideoInfo {
            id: "k3KqQvywToE".to_string(),
            title: "चाय पे चर्चा".to_string(),
            description: "episode".to_string(),
            published_at: "2024-05-01T12:00:00Z".to_string(),
            duration: Some("PT10M".to_string()),
        }
    }

    #[tokio::test]
    async fn test_write_text_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/01.txt");

        let written = write_text(&path, "first run").await.unwrap();
        assert!(written.is_absolute());
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "first run");

        write_text(&path, "second").await.unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_write_text_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs_err::write(&blocker, "not a directory").unwrap();

        let err = write_text(&blocker.join("01.txt"), "x").await.unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }

    #[tokio::test]
    async fn test_write_record_document() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RecordWriter::new(dir.path());
        let transcript = Transcript::from_segments(
            "hi",
            vec![Segment { text: "नमस्ते".into(), start: 0.0, duration: 1.0 }],
        );

        let path = writer.write_record(1, &video(), &transcript).await.unwrap();
        assert!(path.ends_with("transcript_001_k3KqQvywToE.json"));

        let content = fs_err::read_to_string(&path).unwrap();
        assert!(content.contains("चाय पे चर्चा"));

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["video_info"]["id"], "k3KqQvywToE");
        assert_eq!(value["transcript"]["language"], "hi");
        assert_eq!(value["transcript"]["segments"][0]["text"], "नमस्ते");
        assert!(value["processed_at"].is_string());
    }

    #[tokio::test]
    async fn test_write_summary_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RecordWriter::new(dir.path());
        let summary = RunSummary::new("https://youtu.be/k3KqQvywToE", SourceType::Video, None);

        let path = writer.write_summary(&summary).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("processing_summary_"));
        assert!(name.ends_with(".json"));

        let loaded: RunSummary =
            serde_json::from_str(&fs_err::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.source_type, SourceType::Video);
        assert_eq!(loaded.source_url, summary.source_url);
    }
}
