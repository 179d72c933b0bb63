use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcripts::cli::{Cli, Commands};
use yt_transcripts::config::Config;
use yt_transcripts::fetch::{CaptionFetcher, FabricFetcher, WatchPageCaptions};
use yt_transcripts::output::RecordWriter;
use yt_transcripts::pipeline::{ParallelPipeline, PoolOptions, ScrapePipeline};
use yt_transcripts::source::data_api::DataApiClient;
use yt_transcripts::source::ytdlp::YtDlpLister;
use yt_transcripts::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "yt_transcripts=debug"
    } else if cli.quiet {
        "yt_transcripts=warn"
    } else {
        "yt_transcripts=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Playlist {
            url,
            language,
            suffix,
            output_dir,
            workers,
            timeout,
        } => {
            // Missing tools are reported per item, so this only warns
            let missing_deps =
                utils::check_dependencies(&config.tools.yt_dlp_path, &config.tools.fabric_path).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let language = language.unwrap_or_else(|| config.pipeline.default_language.clone());
            let suffix = suffix.unwrap_or_else(|| config.pipeline.file_suffix.clone());
            let options = PoolOptions {
                max_workers: workers.map(usize::from).unwrap_or(config.pipeline.max_workers),
                task_timeout: timeout
                    .or(config.pipeline.task_timeout_secs)
                    .map(Duration::from_secs),
            };

            let lister = YtDlpLister::new(config.tools.yt_dlp_path.clone());
            let fetcher = FabricFetcher::new(config.tools.fabric_path.clone())
                .with_sleep_requests(config.tools.sleep_requests);

            let pipeline = ParallelPipeline::new(Arc::new(lister), Arc::new(fetcher), options)
                .with_output_dir(output_dir.unwrap_or_else(|| config.pipeline.output_dir.clone()))
                .with_progress(!cli.quiet);

            tracing::info!("Starting transcript fetch for: {}", url);
            let started = Instant::now();

            let outcomes = pipeline
                .run(&url, &[language], &suffix)
                .await
                .context("Failed to enumerate videos")?;

            let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
            println!(
                "\n{} {} succeeded, {} failed in {}",
                style("Finished:").bold(),
                style(succeeded).green(),
                style(outcomes.len() - succeeded).red(),
                utils::format_duration(started.elapsed().as_secs_f64())
            );
        }
        Commands::Scrape {
            url,
            api_key,
            output_dir,
            max_videos,
            languages,
        } => {
            let catalog = DataApiClient::new(api_key, config.api.base_url.clone())
                .with_page_size(config.api.page_size)
                .with_description_limit(config.api.description_limit);
            let fetcher = CaptionFetcher::new(WatchPageCaptions::new(config.api.watch_url.clone()));
            let writer = RecordWriter::new(output_dir.unwrap_or_else(|| config.api.output_dir.clone()));

            let pipeline = ScrapePipeline::new(Box::new(catalog), Box::new(fetcher), writer)
                .with_max_videos(max_videos.map(usize::from).unwrap_or(config.api.max_videos))
                .with_languages(languages.unwrap_or_else(|| config.api.preferred_languages.clone()));

            let summary = pipeline
                .run(&url)
                .await
                .context("Failed to enumerate videos")?;

            println!("\n{}", style("Processing complete!").bold());
            println!(
                "Success: {}, Errors: {}",
                style(summary.success_count).green(),
                style(summary.error_count).red()
            );
            if let Some(path) = &summary.summary_file {
                println!("Summary saved: {}", path.display());
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
        Commands::Doctor => {
            let missing =
                utils::check_dependencies(&config.tools.yt_dlp_path, &config.tools.fabric_path).await;
            if missing.is_empty() {
                println!("{} yt-dlp and fabric-ai are available", style("✓").green());
            } else {
                for dep in &missing {
                    println!("{} {}", style("✗").red(), dep);
                }
                anyhow::bail!("{} required tool(s) missing", missing.len());
            }
        }
    }

    Ok(())
}
