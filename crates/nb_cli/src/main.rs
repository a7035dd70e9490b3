use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use nb_core::{NewsStore, Result};
use nb_pipeline::{create_model, Pipeline, PipelineConfig};
use nb_scraper::{HttpFetcher, IngestConfig, IngestCoordinator};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    'd' => total_seconds += num * 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                }
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            if let Ok(num) = current_number.parse::<u64>() {
                total_seconds += num;
                has_unit = true;
            } else {
                return Err("Invalid number in duration".to_string());
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "sqlite", help = "Storage backend: sqlite or memory")]
    storage: String,
    #[arg(long, help = "SQLite database path (defaults to rotter_news.db)")]
    db_path: Option<String>,
    #[arg(long, default_value = "anthropic", help = "Model backend for the analysis pipeline")]
    model: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Scan the forum listing once and store fresh items.
    Scrape,
    /// Run the analysis pipeline over stored unprocessed items.
    Process {
        #[arg(long, help = "Process at most this many items")]
        limit: Option<usize>,
    },
    /// Scrape and process continuously.
    Run {
        /// Pause between scrape cycles (e.g. 60s, 5m, 1h)
        #[arg(long, default_value = "60s")]
        scrape_interval: HumanDuration,
        /// Pause between processing cycles
        #[arg(long, default_value = "60s")]
        process_interval: HumanDuration,
    },
    /// Print store counters.
    Stats,
}

async fn log_stats(store: &dyn NewsStore) -> Result<()> {
    let stats = store.stats().await?;
    info!(
        total = stats.total,
        unprocessed = stats.unprocessed,
        relevant = stats.relevant,
        not_relevant = stats.not_relevant,
        "store stats"
    );
    Ok(())
}

async fn scrape_once(coordinator: &IngestCoordinator) -> bool {
    match coordinator.run_cycle(Utc::now().naive_utc()).await {
        Ok(report) => {
            info!(
                stored = report.items.len(),
                discovered = report.discovered,
                stale = report.skipped_stale,
                existing = report.skipped_existing,
                empty = report.skipped_empty,
                failed = report.failed,
                "scrape cycle finished"
            );
            true
        }
        Err(e) => {
            error!(error = %e, "scrape cycle failed");
            false
        }
    }
}

async fn process_once(pipeline: &Pipeline, store: &dyn NewsStore, limit: Option<usize>) -> bool {
    match pipeline.process_batch(store, limit).await {
        Ok(report) => {
            info!(
                processed = report.processed,
                relevant = report.relevant,
                not_relevant = report.not_relevant,
                "processing cycle finished"
            );
            true
        }
        Err(e) => {
            error!(error = %e, "processing cycle failed");
            false
        }
    }
}

fn build_pipeline(model_name: &str) -> Result<Pipeline> {
    let api_key = std::env::var(API_KEY_ENV).ok();
    let model = create_model(model_name, api_key)?;
    info!(model = model.name(), "model backend initialized");
    Ok(Pipeline::new(model, PipelineConfig::default()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let store = nb_storage::create_store(cli.storage.as_str(), cli.db_path.as_deref()).await?;
    info!(backend = %cli.storage, "storage initialized");

    match cli.command {
        Commands::Scrape => {
            let fetcher = Arc::new(HttpFetcher::new()?);
            let coordinator =
                IngestCoordinator::new(fetcher, store.clone(), IngestConfig::default());
            scrape_once(&coordinator).await;
            log_stats(store.as_ref()).await?;
        }
        Commands::Process { limit } => {
            let pipeline = build_pipeline(&cli.model)?;
            process_once(&pipeline, store.as_ref(), limit).await;
            log_stats(store.as_ref()).await?;
        }
        Commands::Run {
            scrape_interval,
            process_interval,
        } => {
            let fetcher = Arc::new(HttpFetcher::new()?);
            let coordinator =
                IngestCoordinator::new(fetcher, store.clone(), IngestConfig::default());
            let pipeline = build_pipeline(&cli.model)?;

            info!(
                scrape_secs = scrape_interval.0.as_secs(),
                process_secs = process_interval.0.as_secs(),
                "entering continuous mode, ctrl-c to stop"
            );

            // A failed cycle still waits out its interval before retrying,
            // so a broken upstream is never hammered.
            let mut last_scrape: Option<tokio::time::Instant> = None;
            let mut last_process: Option<tokio::time::Instant> = None;
            let mut tick = tokio::time::interval(Duration::from_secs(1));

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let now = tokio::time::Instant::now();
                        if last_scrape.map_or(true, |t| now.duration_since(t) >= scrape_interval.0) {
                            scrape_once(&coordinator).await;
                            last_scrape = Some(tokio::time::Instant::now());
                        }
                        if last_process.map_or(true, |t| now.duration_since(t) >= process_interval.0) {
                            let processed = process_once(&pipeline, store.as_ref(), None).await;
                            last_process = Some(tokio::time::Instant::now());
                            if processed {
                                if let Err(e) = log_stats(store.as_ref()).await {
                                    error!(error = %e, "stats query failed");
                                }
                            }
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutting down");
                        break;
                    }
                }
            }
        }
        Commands::Stats => {
            log_stats(store.as_ref()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration_units() {
        assert_eq!(
            "1h30m".parse::<HumanDuration>().unwrap().0,
            Duration::from_secs(5400)
        );
        assert_eq!(
            "45".parse::<HumanDuration>().unwrap().0,
            Duration::from_secs(45)
        );
        assert!("abc".parse::<HumanDuration>().is_err());
        assert!("".parse::<HumanDuration>().is_err());
    }
}
