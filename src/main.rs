mod config;
mod db;
mod error;
mod feed;
mod parser;
mod scraper;
mod utils;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::CrawlConfig;
use crate::scraper::HttpFetcher;

#[derive(Parser)]
#[command(name = "trial_crawler", about = "ClinicalTrials.gov record crawler")]
struct Cli {
    /// SQLite database path (default: $TRIALS_DB_PATH or data/trials.sqlite)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Read the study feed and store every record not yet in the database
    Crawl {
        /// Max feed entries to visit (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Feed URL (default: $TRIALS_FEED_URL)
        #[arg(long)]
        feed: Option<String>,
        /// Pause before each fetch, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Show database statistics
    Stats,
    /// Print a stored record as JSON
    Show {
        /// Trial id, e.g. NCT04372602
        ctid: String,
    },
    /// Extract a record from a saved HTML page (no network, no database)
    Parse {
        file: PathBuf,
        /// Record URL the page was saved from
        #[arg(long, default_value = "")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut config = CrawlConfig::load()?;
    if let Some(path) = cli.db {
        config = config.with_db_path(path);
    }

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            println!("Schema ready in {:?}", config.db_path);
            Ok(())
        }
        Commands::Crawl {
            limit,
            feed,
            delay_ms,
        } => {
            if let Some(url) = feed {
                config = config.with_feed_url(url);
            }
            if let Some(ms) = delay_ms {
                config = config.with_delay_ms(ms);
            }
            run_crawl(&config, limit).await
        }
        Commands::Stats => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Records:        {}", s.total);
            println!("No brief title: {}", s.untitled);
            println!("Capture days:   {}", s.capture_days);
            println!(
                "Last captured:  {}",
                s.last_captured.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        Commands::Show { ctid } => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            match db::fetch_by_ctid(&conn, &ctid)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("No record for {}", ctid),
            }
            Ok(())
        }
        Commands::Parse { file, url } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let record = parser::build_record(&html, &url);
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_crawl(config: &CrawlConfig, limit: Option<usize>) -> anyhow::Result<()> {
    let conn = db::connect(&config.db_path)?;
    db::init_schema(&conn)?;

    let fetcher = HttpFetcher::from_config(config)?;
    let mut urls = feed::fetch_record_urls(fetcher.client(), &config.feed_url).await?;
    if let Some(n) = limit {
        urls.truncate(n);
    }
    if urls.is_empty() {
        println!("Feed has no study URLs.");
        return Ok(());
    }

    println!(
        "Crawling {} records ({} ms between fetches)...",
        urls.len(),
        config.delay_ms
    );
    let stats = scraper::crawl_records(&conn, &fetcher, &urls, config).await;
    println!(
        "All done: {} new, {} already stored, {} failed.",
        stats.persisted, stats.skipped, stats.failed
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
