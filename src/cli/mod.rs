use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "yt-transcripts",
    about = "Fetch YouTube video and playlist transcripts",
    version,
    long_about = "A CLI tool for fetching transcripts of YouTube videos and playlists. The `playlist` command fans videos out to fabric-ai across a pool of workers; the `scrape` command uses the YouTube Data API and writes JSON transcripts plus a run summary."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every video of a playlist with fabric-ai, in parallel, into text files
    Playlist {
        /// Playlist or video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Transcript language passed to fabric-ai (e.g. en, hi-orig)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Appended to the zero-padded index to form each file name
        #[arg(short, long, value_name = "SUFFIX")]
        suffix: Option<String>,

        /// Directory to write transcripts to
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Number of videos processed at the same time
        #[arg(short = 'j', long, value_name = "COUNT", value_parser = clap::value_parser!(u16).range(1..))]
        workers: Option<u16>,

        /// Give up on a single video after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Fetch transcripts through the YouTube Data API into JSON files plus a run summary
    Scrape {
        /// YouTube video or playlist URL
        #[arg(value_name = "URL")]
        url: String,

        /// YouTube Data API v3 key
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Output directory
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Maximum number of playlist videos to process
        #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u16).range(1..))]
        max_videos: Option<u16>,

        /// Caption languages in order of preference
        #[arg(long, value_name = "LANGS", value_delimiter = ',')]
        languages: Option<Vec<String>>,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Check that yt-dlp and fabric-ai are available
    Doctor,
}
