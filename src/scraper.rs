use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use tracing::{error, info, warn};

use crate::config::CrawlConfig;
use crate::db::RecordStore;
use crate::error::CrawlError;
use crate::parser::build_record;

/// Fetches a record page body. A usable page is status 200 with a non-empty
/// body; anything else is a [`CrawlError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let transport = |source| CrawlError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        if body.is_empty() {
            return Err(CrawlError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

/// Where a single URL ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Persisted,
    Failed,
}

/// Crawl stats returned after completion.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub total: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CrawlStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Persisted => self.persisted += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Visit every URL in order, one at a time. A failure on one URL is logged
/// and never stops the run.
pub async fn crawl_records<S, F>(
    store: &S,
    fetcher: &F,
    urls: &[String],
    config: &CrawlConfig,
) -> CrawlStats
where
    S: RecordStore + ?Sized,
    F: Fetcher + ?Sized,
{
    let delay = config.delay();
    let started = Instant::now();
    let mut stats = CrawlStats {
        total: urls.len(),
        ..Default::default()
    };

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    for url in urls {
        let outcome = match crawl_one(store, fetcher, url, delay).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed on {}: {:#}", url, e);
                Outcome::Failed
            }
        };
        stats.record(outcome);
        pb.set_message(format!("{} new, {} skipped", stats.persisted, stats.skipped));
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Crawled {} urls ({} new, {} skipped, {} failed) in {:.1}s",
        stats.total,
        stats.persisted,
        stats.skipped,
        stats.failed,
        started.elapsed().as_secs_f64()
    );
    stats
}

async fn crawl_one<S, F>(store: &S, fetcher: &F, url: &str, delay: Duration) -> Result<Outcome>
where
    S: RecordStore + ?Sized,
    F: Fetcher + ?Sized,
{
    if store.exists(url)? {
        info!("Already stored, skipping {}", url);
        return Ok(Outcome::Skipped);
    }

    tokio::time::sleep(delay).await;

    info!("Fetching {}", url);
    let body = match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(e) if e.is_bad_response() => {
            warn!("Skipping {}: {}", url, e);
            return Ok(Outcome::Failed);
        }
        Err(e) => return Err(e.into()),
    };

    let record = build_record(&body, url);
    if record.fields.values().iter().all(|v| v.is_empty()) {
        warn!("No labelled fields found on {}", url);
    }
    store.insert(&record)?;
    info!("Saved {} ({})", record.external_id, url);
    Ok(Outcome::Persisted)
}
