use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{Transcript, TranscriptFetcher, TranscriptResult};
use crate::source::WorkItem;
use crate::FetchError;

/// Transcript fetcher that shells out to `fabric-ai --transcript`
pub struct FabricFetcher {
    fabric_path: String,
    sleep_requests: Option<u32>,
}

impl FabricFetcher {
    pub fn new(fabric_path: impl Into<String>) -> Self {
        Self {
            fabric_path: fabric_path.into(),
            sleep_requests: Some(1),
        }
    }

    /// Seconds yt-dlp should sleep between requests (passed through fabric-ai)
    pub fn with_sleep_requests(mut self, seconds: Option<u32>) -> Self {
        self.sleep_requests = seconds;
        self
    }

    fn build_args(&self, video_url: &str, language: &str) -> Vec<String> {
        let mut args = vec![
            format!("--youtube={}", video_url),
            "--transcript".to_string(),
            format!("--language={}", language),
        ];
        if let Some(seconds) = self.sleep_requests {
            args.push(format!("--yt-dlp-args=--sleep-requests {}", seconds));
        }
        args
    }
}

#[async_trait]
impl TranscriptFetcher for FabricFetcher {
    async fn fetch(&self, item: &WorkItem) -> TranscriptResult {
        let language = item.primary_language();
        tracing::debug!(
            "Running {} for {} ({})",
            self.fabric_path,
            item.source_reference,
            language
        );

        let output = Command::new(&self.fabric_path)
            .args(self.build_args(&item.source_reference, language))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Spawn {
                program: self.fabric_path.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(FetchError::Process {
                program: self.fabric_path.clone(),
                status: output.status.to_string(),
                stderr: diagnostic.to_string(),
            });
        }

        let text = stdout.trim();
        if text.is_empty() {
            return Err(FetchError::NoTranscript(item.source_reference.clone()));
        }

        Ok(Transcript {
            language: language.to_string(),
            text: text.to_string(),
            segments: Vec::new(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "fabric-ai"
    }
}

impl Default for FabricFetcher {
    fn default() -> Self {
        Self::new("fabric-ai")
    }
}
