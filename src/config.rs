use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ::config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_FEED_URL: &str =
    "https://clinicaltrials.gov/ct2/results/xml?cond=COVID-19&displayxml=true";
const DEFAULT_DB_PATH: &str = "data/trials.sqlite";
const DEFAULT_DELAY_MS: i64 = 5000;
const ENV_PREFIX: &str = "TRIALS";

/// Per-run settings. Built once in `main` and handed down explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    pub feed_url: String,
    pub db_path: PathBuf,
    /// Politeness interval before every non-skipped fetch.
    pub delay_ms: u64,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            delay_ms: DEFAULT_DELAY_MS as u64,
            user_agent: default_user_agent(),
        }
    }
}

impl CrawlConfig {
    /// Defaults overlaid with `TRIALS_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_source(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("feed_url", DEFAULT_FEED_URL)?
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("delay_ms", DEFAULT_DELAY_MS)?
            .set_default("user_agent", default_user_agent())?
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;
        settings
            .try_deserialize()
            .context("Invalid TRIALS_* configuration")
    }

    pub fn with_feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = url.into();
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_user_agent() -> String {
    format!("trial_crawler/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let map: ::config::Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn defaults_without_env() {
        let cfg = CrawlConfig::from_source(env_from(&[])).unwrap();
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cfg.db_path, PathBuf::from("data/trials.sqlite"));
        assert_eq!(cfg.delay(), Duration::from_secs(5));
        assert!(cfg.user_agent.starts_with("trial_crawler/"));
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = CrawlConfig::from_source(env_from(&[
            ("TRIALS_DELAY_MS", "250"),
            ("TRIALS_DB_PATH", "/tmp/t.sqlite"),
        ]))
        .unwrap();
        assert_eq!(cfg.delay_ms, 250);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/t.sqlite"));
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn builder_overrides() {
        let cfg = CrawlConfig::default()
            .with_feed_url("https://example.gov/feed.xml")
            .with_delay_ms(0);
        assert_eq!(cfg.feed_url, "https://example.gov/feed.xml");
        assert_eq!(cfg.delay(), Duration::ZERO);
    }
}
