use crate::fetch::TranscriptFetcher;
use crate::output::{RecordWriter, RunSummary, SourceType, VideoRecord};
use crate::source::{parse_reference, watch_url, VideoCatalog, VideoInfo, WorkItem};
use crate::EnumerationError;

/// API-backed pipeline: enumerate through the Data API, then fetch and write
/// each video strictly in order, accumulating a [`RunSummary`]
pub struct ScrapePipeline {
    catalog: Box<dyn VideoCatalog>,
    fetcher: Box<dyn TranscriptFetcher>,
    writer: RecordWriter,
    max_videos: usize,
    languages: Vec<String>,
}

impl ScrapePipeline {
    pub fn new(
        catalog: Box<dyn VideoCatalog>,
        fetcher: Box<dyn TranscriptFetcher>,
        writer: RecordWriter,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            writer,
            max_videos: 36,
            languages: vec![
                "hi".to_string(),
                "en".to_string(),
                "en-US".to_string(),
                "en-GB".to_string(),
            ],
        }
    }

    pub fn with_max_videos(mut self, max_videos: usize) -> Self {
        self.max_videos = max_videos.max(1);
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        if !languages.is_empty() {
            self.languages = languages;
        }
        self
    }

    /// Run over a playlist or single-video URL. The summary is written once at
    /// the end; failing to write it is logged, not returned.
    pub async fn run(&self, url: &str) -> Result<RunSummary, EnumerationError> {
        let reference = parse_reference(url)?;

        let (source_type, videos) = match (&reference.playlist_id, &reference.video_id) {
            (Some(playlist_id), _) => {
                tracing::info!("Processing playlist: {}", playlist_id);
                let videos = self
                    .catalog
                    .playlist_videos(playlist_id, self.max_videos)
                    .await?;
                (SourceType::Playlist, videos)
            }
            (None, Some(video_id)) => {
                tracing::info!("Processing video: {}", video_id);
                (SourceType::Video, vec![self.catalog.video(video_id).await?])
            }
            (None, None) => return Err(EnumerationError::UnrecognizedUrl(url.to_string())),
        };

        let mut summary = RunSummary::new(url, source_type, reference.playlist_id.clone());
        let total = videos.len();
        println!("Found {} videos to process", total);

        for (i, video) in videos.iter().enumerate() {
            let index = i + 1;
            println!("Processing video {}/{}: {}", index, total, video.title);

            let item = WorkItem {
                index,
                source_reference: watch_url(&video.id),
                video_id: Some(video.id.clone()),
                languages: self.languages.clone(),
                destination: self
                    .writer
                    .output_dir()
                    .join(RecordWriter::record_filename(index, &video.id)),
            };

            let record = self.process_video(&item, video).await;
            match (&record.output_file, &record.error) {
                (Some(path), None) => println!(
                    "  ✓ Transcript saved: {}",
                    path.file_name().unwrap_or_default().to_string_lossy()
                ),
                (_, Some(error)) => println!("  ✗ {}", error),
                _ => {}
            }
            summary.record(record);
        }

        match self.writer.write_summary(&summary).await {
            Ok(path) => summary.summary_file = Some(path),
            Err(e) => tracing::error!("Failed to save processing summary: {}", e),
        }

        Ok(summary)
    }

    async fn process_video(&self, item: &WorkItem, video: &VideoInfo) -> VideoRecord {
        let mut record = VideoRecord::pending(item.index, video);

        match self.fetcher.fetch(item).await {
            Ok(transcript) => {
                record.transcript_available = true;
                match self.writer.write_record(item.index, video, &transcript).await {
                    Ok(path) => record.output_file = Some(path),
                    Err(e) => {
                        tracing::warn!("Could not save transcript for {}: {}", video.id, e);
                        record.error = Some(e.to_string());
                    }
                }
                record.transcript = Some(transcript);
            }
            Err(e) => {
                tracing::warn!("No transcript for {}: {}", video.id, e);
                record.error = Some(e.to_string());
            }
        }

        record
    }
}
