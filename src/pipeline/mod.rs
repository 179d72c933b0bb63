pub mod parallel;
pub mod scrape;

pub use parallel::{ItemOutcome, ParallelPipeline, PoolOptions};
pub use scrape::ScrapePipeline;
