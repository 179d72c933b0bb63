use futures_util::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::TranscriptFetcher;
use crate::output::write_text;
use crate::source::{self, PlaylistLister, WorkItem};
use crate::{EnumerationError, FetchError, ItemError};

/// Worker pool sizing
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    /// Items processed at the same time
    pub max_workers: usize,

    /// Per-item limit on fetching; `None` waits indefinitely
    pub task_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_workers: 4,
            task_timeout: None,
        }
    }
}

/// Result of fetching and writing one work item
#[derive(Debug)]
pub struct ItemOutcome {
    pub item: WorkItem,
    /// Absolute path written on success
    pub result: Result<PathBuf, ItemError>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// One-line status for the terminal
    pub fn status_line(&self) -> String {
        match &self.result {
            Ok(_) => {
                let name = self
                    .item
                    .destination
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.item.destination.display().to_string());
                format!("✅ Done: {}", name)
            }
            Err(e) => format!("❌ Error: {} - {}", self.item.source_reference, e),
        }
    }
}

/// Process-backed pipeline: list once, then fetch and write every item on a
/// bounded pool of workers
pub struct ParallelPipeline {
    lister: Arc<dyn PlaylistLister>,
    fetcher: Arc<dyn TranscriptFetcher>,
    options: PoolOptions,
    output_dir: PathBuf,
    show_progress: bool,
}

impl ParallelPipeline {
    pub fn new(
        lister: Arc<dyn PlaylistLister>,
        fetcher: Arc<dyn TranscriptFetcher>,
        options: PoolOptions,
    ) -> Self {
        Self {
            lister,
            fetcher,
            options,
            output_dir: PathBuf::from("."),
            show_progress: false,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Enumerate `url` and process every item. Outcomes are returned in the
    /// order they completed. Only enumeration can fail the run.
    pub async fn run(
        &self,
        url: &str,
        languages: &[String],
        suffix: &str,
    ) -> Result<Vec<ItemOutcome>, EnumerationError> {
        let items =
            source::enumerate(self.lister.as_ref(), url, languages, suffix, &self.output_dir).await?;
        Ok(self.process(items).await)
    }

    /// Submit every item up front and wait for all of them
    pub async fn process(&self, items: Vec<WorkItem>) -> Vec<ItemOutcome> {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.options.max_workers.max(1)));
        let progress = self.progress_bar(total);
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Processing {} item(s) with {} worker(s) using {}",
            total,
            self.options.max_workers.max(1),
            self.fetcher.backend_name()
        );

        for item in items {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let timeout = self.options.task_timeout;

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(process_item(fetcher.as_ref(), &item, timeout))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| Err(ItemError::Worker("worker panicked".to_string()))),
                    Err(e) => Err(ItemError::Worker(e.to_string())),
                };
                ItemOutcome { item, result }
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            progress.inc(1);
            match joined {
                Ok(outcome) => {
                    report(&progress, &outcome.status_line());
                    outcomes.push(outcome);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        progress.finish_and_clear();
        outcomes
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} transcripts")
        {
            progress.set_style(style);
        }
        progress.enable_steady_tick(Duration::from_millis(120));
        progress
    }
}

/// Print above the progress bar when it is drawn, plainly otherwise
fn report(progress: &ProgressBar, line: &str) {
    if progress.is_hidden() {
        println!("{}", line);
    } else {
        progress.println(line);
    }
}

async fn process_item(
    fetcher: &dyn TranscriptFetcher,
    item: &WorkItem,
    timeout: Option<Duration>,
) -> Result<PathBuf, ItemError> {
    tracing::info!("📥 Processing: {}", item.source_reference);

    let fetch = fetcher.fetch(item);
    let transcript = match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| FetchError::TimedOut(limit))??,
        None => fetch.await?,
    };

    Ok(write_text(&item.destination, &transcript.text).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{MockTranscriptFetcher, Transcript};
    use crate::source::MockPlaylistLister;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn langs() -> Vec<String> {
        vec!["hi-orig".to_string()]
    }

    fn text(body: &str) -> Transcript {
        Transcript {
            language: "hi-orig".to_string(),
            text: body.to_string(),
            segments: Vec::new(),
        }
    }

    fn lister_of(urls: &'static [&'static str]) -> MockPlaylistLister {
        let mut lister = MockPlaylistLister::new();
        lister
            .expect_list_videos()
            .returning(move |_| Ok(urls.iter().map(|u| u.to_string()).collect()));
        lister
    }

    #[tokio::test]
    async fn test_every_item_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher.expect_backend_name().return_const("mock");
        fetcher
            .expect_fetch()
            .times(3)
            .returning(|item| Ok(text(&format!("transcript of {}", item.source_reference))));

        let pipeline = ParallelPipeline::new(
            Arc::new(lister_of(&[
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=b",
                "https://www.youtube.com/watch?v=c",
            ])),
            Arc::new(fetcher),
            PoolOptions { max_workers: 2, task_timeout: None },
        )
        .with_output_dir(dir.path());

        let outcomes = pipeline
            .run("https://www.youtube.com/playlist?list=PL1", &langs(), "chai.txt")
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(ItemOutcome::is_success));
        assert_eq!(
            fs_err::read_to_string(dir.path().join("02chai.txt")).unwrap(),
            "transcript of https://www.youtube.com/watch?v=b"
        );
        assert_eq!(fs_err::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher.expect_backend_name().return_const("mock");
        fetcher.expect_fetch().returning(|item| {
            if item.index == 2 {
                Err(FetchError::Process {
                    program: "fabric-ai".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "transcript disabled".to_string(),
                })
            } else {
                Ok(text("ok"))
            }
        });

        let pipeline = ParallelPipeline::new(
            Arc::new(lister_of(&[
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=b",
                "https://www.youtube.com/watch?v=c",
            ])),
            Arc::new(fetcher),
            PoolOptions::default(),
        )
        .with_output_dir(dir.path());

        let outcomes = pipeline
            .run("https://www.youtube.com/playlist?list=PL1", &langs(), ".txt")
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].item.index, 2);
        assert!(failed[0].status_line().starts_with("❌ Error: https://www.youtube.com/watch?v=b"));
        assert!(failed[0].status_line().contains("transcript disabled"));
        assert!(!dir.path().join("02.txt").exists());
    }

    #[tokio::test]
    async fn test_enumeration_failure_aborts_before_fetching() {
        let mut lister = MockPlaylistLister::new();
        lister
            .expect_list_videos()
            .returning(|_| Err(EnumerationError::ListingFailed("network unreachable".into())));
        let mut fetcher = MockTranscriptFetcher::new();
        fetcher.expect_fetch().never();

        let pipeline = ParallelPipeline::new(Arc::new(lister), Arc::new(fetcher), PoolOptions::default());
        let result = pipeline
            .run("https://www.youtube.com/playlist?list=PL1", &langs(), ".txt")
            .await;

        assert!(matches!(result, Err(EnumerationError::ListingFailed(_))));
    }

    struct SlowFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TranscriptFetcher for SlowFetcher {
        async fn fetch(&self, item: &WorkItem) -> crate::TranscriptResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(if item.index == 1 { 500 } else { 20 })).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(text("slow"))
        }

        fn backend_name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_pool_is_bounded_and_reports_in_completion_order() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(SlowFetcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let urls: Vec<String> = (0..6).map(|i| format!("https://www.youtube.com/watch?v=v{}", i)).collect();
        let items = source::build_work_items(urls, &langs(), ".txt", dir.path());

        let pipeline = ParallelPipeline::new(
            Arc::new(MockPlaylistLister::new()),
            fetcher.clone(),
            PoolOptions { max_workers: 2, task_timeout: None },
        );
        let outcomes = pipeline.process(items).await;

        assert_eq!(outcomes.len(), 6);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(outcomes.last().unwrap().item.index, 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_item_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(SlowFetcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let urls = vec![
            "https://www.youtube.com/watch?v=slow".to_string(),
            "https://www.youtube.com/watch?v=fast".to_string(),
        ];
        let items = source::build_work_items(urls, &langs(), ".txt", dir.path());

        let pipeline = ParallelPipeline::new(
            Arc::new(MockPlaylistLister::new()),
            fetcher,
            PoolOptions { max_workers: 2, task_timeout: Some(Duration::from_millis(200)) },
        );
        let outcomes = pipeline.process(items).await;

        let slow = outcomes.iter().find(|o| o.item.index == 1).unwrap();
        assert!(matches!(slow.result, Err(ItemError::Fetch(FetchError::TimedOut(_)))));
        assert!(slow.status_line().ends_with("timed out after 200ms"));
        let fast = outcomes.iter().find(|o| o.item.index == 2).unwrap();
        assert!(fast.is_success());
    }

    /// Panics on the second item. Hand-written because a panic inside a mock
    /// expectation poisons the mock for every later call.
    struct PanickingFetcher;

    #[async_trait::async_trait]
    impl TranscriptFetcher for PanickingFetcher {
        async fn fetch(&self, item: &WorkItem) -> crate::TranscriptResult {
            if item.index == 2 {
                panic!("extractor crashed on {}", item.source_reference);
            }
            Ok(text("ok"))
        }

        fn backend_name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_panicking_worker_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let urls: Vec<String> = (1..=3).map(|i| format!("https://www.youtube.com/watch?v=p{}", i)).collect();
        let items = source::build_work_items(urls, &langs(), ".txt", dir.path());

        let pipeline = ParallelPipeline::new(
            Arc::new(MockPlaylistLister::new()),
            Arc::new(PanickingFetcher),
            PoolOptions { max_workers: 2, task_timeout: None },
        );
        let outcomes = pipeline.process(items).await;

        assert_eq!(outcomes.len(), 3);
        let crashed = outcomes.iter().find(|o| o.item.index == 2).unwrap();
        assert!(matches!(crashed.result, Err(ItemError::Worker(_))));
        assert!(crashed.status_line().contains("worker panicked"));

        assert!(dir.path().join("01.txt").exists());
        assert!(!dir.path().join("02.txt").exists());
        assert!(dir.path().join("03.txt").exists());
    }
}
