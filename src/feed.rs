use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::utils::transform_url;

static SHOW_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://[^/]+\.gov/show/[A-Za-z0-9_-]+").unwrap());

/// Fetch the study feed and return record-page URLs in feed order.
pub async fn fetch_record_urls(client: &reqwest::Client, feed_url: &str) -> Result<Vec<String>> {
    info!("Fetching study feed: {}", feed_url);
    let response = client
        .get(feed_url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch feed {}", feed_url))?;
    if !response.status().is_success() {
        bail!("Feed {} returned status {}", feed_url, response.status());
    }
    let xml = response.text().await.context("Failed to read feed body")?;

    let raw = parse_study_urls(&xml)?;
    info!("Studies in feed: {}", raw.len());
    Ok(record_urls(raw))
}

/// Keep feed URLs that carry the `show` path and rewrite them to record pages.
pub fn record_urls(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|url| {
            if SHOW_URL_RE.is_match(&url) {
                Some(transform_url(&url))
            } else {
                warn!("Ignoring unexpected feed url: {}", url);
                None
            }
        })
        .collect()
}

/// Parse the feed XML and return the `<url>` of every `<study>`.
pub fn parse_study_urls(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_study = false;
    let mut in_url = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                b"study" => in_study = true,
                b"url" if in_study => in_url = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(e)) if in_url => {
                let text = e.unescape()?;
                let text = text.trim();
                if !text.is_empty() {
                    urls.push(text.to_string());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                b"url" => in_url = false,
                b"study" => in_study = false,
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e).context("Malformed feed XML"),
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}
