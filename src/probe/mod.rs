//! Link quality probing.
//!
//! Candidate URLs are probed concurrently, bounded by a configurable
//! in-flight cap, using one of two strategies: a lightweight HTTP HEAD
//! probe that measures elapsed time, or a heavyweight ffmpeg decode probe
//! that derives a composite score. Every probe has its own timeout, so one
//! unreachable host never starves the rest of the batch, and each failure
//! is converted to a typed outcome instead of an error.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::{ProbeConfig, ProbeStrategyKind};
use crate::models::ProbeOutcome;

pub mod ffmpeg;
pub mod http;

pub use ffmpeg::FfmpegProbe;
pub use http::HttpProbe;

/// One probing strategy. Implementations must isolate their own failures:
/// `probe` never errors, it reports a failed outcome.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

pub struct QualityChecker {
    probe: Box<dyn LinkProbe>,
    skip_patterns: Vec<String>,
    max_concurrent: usize,
}

impl QualityChecker {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let probe: Box<dyn LinkProbe> = match config.strategy {
            ProbeStrategyKind::Http => Box::new(HttpProbe::new(Duration::from_secs(
                config.link_check_timeout_secs,
            ))?),
            ProbeStrategyKind::Ffmpeg => Box::new(FfmpegProbe::new(
                config.media_probe_duration_secs,
                Duration::from_secs(config.media_probe_timeout_secs),
            )),
        };

        Ok(Self {
            probe,
            skip_patterns: config.skip_check_patterns.clone(),
            max_concurrent: config.max_concurrent.max(1),
        })
    }

    /// Build a checker around an explicit probe implementation. Used by
    /// tests and by callers that want a custom strategy.
    pub fn with_probe(probe: Box<dyn LinkProbe>, skip_patterns: Vec<String>, max_concurrent: usize) -> Self {
        Self {
            probe,
            skip_patterns,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Probe every URL, at most `max_concurrent` in flight. The result is
    /// keyed by URL, so probe completion order cannot leak into ranking.
    pub async fn check_all(&self, urls: Vec<String>) -> HashMap<String, ProbeOutcome> {
        let total = urls.len();
        info!(
            "Probing {} urls with up to {} in flight",
            total, self.max_concurrent
        );

        let results: Vec<(String, ProbeOutcome)> =
            futures::stream::iter(urls.into_iter().map(|url| self.probe_entry(url)))
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        let failures = results.iter().filter(|(_, o)| o.is_failure()).count();
        info!("Probing completed: {} ok, {} failed", total - failures, failures);

        results.into_iter().collect()
    }

    async fn probe_entry(&self, url: String) -> (String, ProbeOutcome) {
        let outcome = if self.is_skip_checked(&url) {
            debug!("Skipping probe for known-stable url {}", url);
            ProbeOutcome::Skipped
        } else {
            self.probe.probe(&url).await
        };
        (url, outcome)
    }

    fn is_skip_checked(&self, url: &str) -> bool {
        self.skip_patterns.iter().any(|p| url.contains(p))
    }
}
