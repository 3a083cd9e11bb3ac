//! Source fetching and playlist parsing.
//!
//! Each configured source URL is downloaded with a bounded timeout and a
//! jittered exponential-backoff retry policy, auto-detected as m3u or plain
//! txt, and parsed into [`FetchedChannels`]. A failing source costs the run
//! only its own contribution; the pipeline continues with whatever sources
//! succeeded (optionally falling back to a cached body).

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::cache::SourceCache;
use crate::config::SourceConfig;
use crate::errors::SourceError;
use crate::models::FetchedChannels;

pub mod m3u_parser;
pub mod txt_parser;

pub use m3u_parser::M3uParser;
pub use txt_parser::parse_txt;

/// How many leading lines are scanned for the `#EXTINF` tag when deciding
/// between the two container formats.
const FORMAT_SNIFF_LINES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    M3u,
    Txt,
}

/// Classify playlist content by the presence of an `#EXTINF` tag near the
/// top of the file.
pub fn detect_format(content: &str) -> SourceFormat {
    let is_m3u = content
        .lines()
        .take(FORMAT_SNIFF_LINES)
        .any(|line| line.contains("#EXTINF"));
    if is_m3u {
        SourceFormat::M3u
    } else {
        SourceFormat::Txt
    }
}

pub struct SourceFetcher {
    client: reqwest::Client,
    m3u_parser: M3uParser,
    config: SourceConfig,
}

impl SourceFetcher {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            m3u_parser: M3uParser::new()?,
            config,
        })
    }

    /// Fetch every configured source and merge the results. Sources are
    /// fetched in configured order; merge accumulates categories in
    /// first-seen order, so the result does not depend on which source
    /// answered fastest.
    pub async fn fetch_all(&self, cache: Option<&SourceCache>) -> FetchedChannels {
        let mut all = FetchedChannels::default();

        for url in &self.config.urls {
            match self.fetch_source(url).await {
                Ok(body) => {
                    if let Some(cache) = cache {
                        if let Err(e) = cache.store(url, &body) {
                            warn!("Failed to cache source {}: {}", url, e);
                        }
                    }
                    let fetched = self.parse_body(url, &body);
                    if !fetched.is_empty() {
                        info!(
                            "Source {} contributed {} entries across categories: {}",
                            url,
                            fetched.entry_count(),
                            fetched.category_names().join(", ")
                        );
                    }
                    all.merge(fetched);
                }
                Err(err) => {
                    error!("Source fetch failed for {}: {}", url, err);
                    if let Some(cache) = cache {
                        if let Some(body) = cache.lookup(url) {
                            info!("Serving {} from cache after fetch failure", url);
                            all.merge(self.parse_body(url, &body));
                        }
                    }
                }
            }
        }

        all
    }

    /// Fetch one source with retries. Only transient failures (timeouts,
    /// transport errors, 429/5xx) are retried; the delay doubles per
    /// attempt with up to 500ms of jitter.
    pub async fn fetch_source(&self, url: &str) -> Result<String, SourceError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut delay = Duration::from_secs(self.config.retry.backoff_base_secs);
        let mut attempt = 1;

        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let jitter = Duration::from_millis(fastrand::u64(0..500));
                    warn!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        url,
                        err,
                        delay + jitter
                    );
                    tokio::time::sleep(delay + jitter).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(url, &e))?;

        if body.trim().is_empty() {
            return Err(SourceError::Empty {
                url: url.to_string(),
            });
        }

        Ok(body)
    }

    /// Detect the container format and dispatch to the matching parser.
    pub fn parse_body(&self, url: &str, body: &str) -> FetchedChannels {
        match detect_format(body) {
            SourceFormat::M3u => {
                info!("url: {} detected as m3u format", url);
                self.m3u_parser.parse(body, &self.config.default_category)
            }
            SourceFormat::Txt => {
                info!("url: {} detected as txt format", url);
                parse_txt(body)
            }
        }
    }
}
