//! End-to-end orchestration: fetch → parse → match → probe → rank → write.
//!
//! Per-source and per-URL failures are absorbed by the stages that produce
//! them; the only errors that abort a run are an unreadable template,
//! invalid configuration, and output-file failures.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cache::SourceCache;
use crate::config::Config;
use crate::ingestor::SourceFetcher;
use crate::matcher::ChannelMatcher;
use crate::probe::QualityChecker;
use crate::ranker::UrlSelector;
use crate::template;
use crate::writer::{OutputWriter, SelectedCategory, SelectedChannel, SelectedPlaylist};

/// Counters reported after a completed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub template_channels: usize,
    pub resolved_channels: usize,
    pub unresolved_channels: usize,
    pub urls_probed: usize,
    pub urls_written: usize,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, template_path: &Path) -> Result<RunSummary> {
        let template = template::load_template(template_path)?;
        if template.is_empty() {
            warn!("Template {} declares no categories", template_path.display());
        }

        let cache = if self.config.cache.enabled {
            Some(SourceCache::open(&self.config.cache)?)
        } else {
            None
        };

        let fetcher = SourceFetcher::new(self.config.sources.clone())?;
        let fetched = fetcher.fetch_all(cache.as_ref()).await;
        info!(
            "Fetched {} entries across {} categories from {} sources",
            fetched.entry_count(),
            fetched.category_names().len(),
            self.config.sources.urls.len()
        );

        let matcher = ChannelMatcher::new()?;
        let matched = matcher.match_channels(&template, &fetched);
        for category in &matched.categories {
            info!(
                "Category {} resolved {}/{} channels",
                category.name,
                category.channels.iter().filter(|c| !c.urls.is_empty()).count(),
                category.channels.len()
            );
            for channel in &category.channels {
                if channel.urls.is_empty() {
                    warn!("Channel {} requested but unresolved", channel.name);
                }
            }
        }

        // Probe each distinct URL once, in candidate discovery order.
        let mut seen = HashSet::new();
        let mut unique_urls = Vec::new();
        for url in matched.candidate_urls() {
            if !url.is_empty() && seen.insert(url.to_string()) {
                unique_urls.push(url.to_string());
            }
        }
        let urls_probed = unique_urls.len();

        let checker = QualityChecker::new(&self.config.probe)?;
        let outcomes = checker.check_all(unique_urls).await;

        let mut selector = UrlSelector::new(self.config.selection.clone());
        let mut playlist = SelectedPlaylist::default();
        for category in &matched.categories {
            let channels = category
                .channels
                .iter()
                .map(|channel| SelectedChannel {
                    name: channel.name.clone(),
                    urls: selector.select(&channel.urls, &outcomes),
                })
                .collect();
            playlist.categories.push(SelectedCategory {
                name: category.name.clone(),
                channels,
            });
        }

        let urls_written: usize = playlist
            .categories
            .iter()
            .flat_map(|c| c.channels.iter())
            .map(|ch| ch.urls.v4.len() + ch.urls.v6.len())
            .sum();

        let writer = OutputWriter::new(self.config.output.clone());
        writer.write_all(&playlist)?;
        writer.rotate_backups()?;

        let summary = RunSummary {
            template_channels: template.channel_count(),
            resolved_channels: matched.resolved_count(),
            unresolved_channels: matched.unresolved_count(),
            urls_probed,
            urls_written,
        };
        info!(
            "Run completed: {}/{} channels resolved, {} urls probed, {} urls written",
            summary.resolved_channels,
            summary.template_channels,
            summary.urls_probed,
            summary.urls_written
        );
        Ok(summary)
    }
}
