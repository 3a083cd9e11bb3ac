//! Core data types shared across the aggregation pipeline.
//!
//! Every entity here is built fresh per run: the template from disk, the
//! fetched channel lists from the network, and the matched/probed results
//! from the two of them combined. Nothing persists between runs except the
//! optional source cache and output backups.

use std::time::Duration;

use crate::errors::ProbeFailure;

/// Marker token that ends a category line in templates and txt playlists.
pub const GENRE_MARKER: &str = "#genre#";

/// Desired channel structure: ordered categories, each with an ordered list
/// of channel names. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct Template {
    categories: Vec<TemplateCategory>,
}

#[derive(Debug, Clone)]
pub struct TemplateCategory {
    pub name: String,
    pub channels: Vec<String>,
}

impl Template {
    pub fn push_category(&mut self, name: String) {
        self.categories.push(TemplateCategory {
            name,
            channels: Vec::new(),
        });
    }

    /// Append a channel name to the most recently opened category.
    /// Returns false if no category is open yet.
    pub fn push_channel(&mut self, name: String) -> bool {
        match self.categories.last_mut() {
            Some(category) => {
                category.channels.push(name);
                true
            }
            None => false,
        }
    }

    pub fn categories(&self) -> &[TemplateCategory] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.categories.iter().map(|c| c.channels.len()).sum()
    }
}

/// One playlist entry as fetched from a source: a display name and the URL
/// bound to it. The URL may be empty for name-only txt lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub name: String,
    pub url: String,
}

/// Channels accumulated from one or more sources, grouped by the category
/// the source declared. Category order is first-seen order so that merging
/// is independent of source completion order.
#[derive(Debug, Clone, Default)]
pub struct FetchedChannels {
    categories: Vec<(String, Vec<ChannelEntry>)>,
}

impl FetchedChannels {
    pub fn push(&mut self, category: &str, entry: ChannelEntry) {
        match self.categories.iter_mut().find(|(name, _)| name == category) {
            Some((_, entries)) => entries.push(entry),
            None => self.categories.push((category.to_string(), vec![entry])),
        }
    }

    /// Open a category without adding entries, keeping first-seen order.
    pub fn ensure_category(&mut self, category: &str) {
        if !self.categories.iter().any(|(name, _)| name == category) {
            self.categories.push((category.to_string(), Vec::new()));
        }
    }

    /// Fold another fetch result into this one, extending categories that
    /// already exist and appending new ones.
    pub fn merge(&mut self, other: FetchedChannels) {
        for (category, entries) in other.categories {
            match self.categories.iter_mut().find(|(name, _)| *name == category) {
                Some((_, existing)) => existing.extend(entries),
                None => self.categories.push((category, entries)),
            }
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[ChannelEntry])> {
        self.categories
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.categories.iter().flat_map(|(_, entries)| entries.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|(_, e)| e.len()).sum()
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Result of matching fetched channels against the template. Preserves
/// template order for categories and channels; every template channel is
/// present even when no URL matched, so diagnostics can tell "requested but
/// unresolved" apart from "never requested".
#[derive(Debug, Clone, Default)]
pub struct MatchedChannels {
    pub categories: Vec<MatchedCategory>,
}

#[derive(Debug, Clone)]
pub struct MatchedCategory {
    pub name: String,
    pub channels: Vec<MatchedChannel>,
}

#[derive(Debug, Clone)]
pub struct MatchedChannel {
    pub name: String,
    /// Candidate URLs in discovery order across sources.
    pub urls: Vec<String>,
}

impl MatchedChannels {
    pub fn candidate_urls(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.channels.iter())
            .flat_map(|ch| ch.urls.iter())
            .map(|u| u.as_str())
    }

    pub fn resolved_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.channels.iter())
            .filter(|ch| !ch.urls.is_empty())
            .count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.channels.iter())
            .filter(|ch| ch.urls.is_empty())
            .count()
    }
}

/// Address family a candidate URL is routed to. URLs whose host is a
/// bracketed IPv6 literal go to `V6`; everything else counts as `V4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn label(&self) -> &'static str {
        match self {
            IpFamily::V4 => "IPV4",
            IpFamily::V6 => "IPV6",
        }
    }
}

/// Highest score the media probe can produce; also bounds the score half of
/// the sort-key range.
pub const MAX_MEDIA_SCORE: u32 = 100;

/// Outcome of probing one candidate URL. The two probe strategies produce
/// different measurements (elapsed time vs composite score), so the outcome
/// normalizes both into a single sortable key.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// URL matched a skip-check pattern; ranks best without probing.
    Skipped,
    /// HTTP probe succeeded; elapsed time until the 200 response.
    Latency(Duration),
    /// Media probe completed; composite score, higher is better.
    Score(u32),
    /// Probe failed; always ranks last, reason kept for diagnostics.
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    /// Total-order sort key, lower is better. `Skipped` beats everything,
    /// `Failed` loses to everything; stable sorting on this key keeps
    /// discovery order for ties.
    pub fn sort_key(&self) -> u64 {
        match self {
            ProbeOutcome::Skipped => 0,
            ProbeOutcome::Latency(elapsed) => {
                1 + elapsed.as_millis().min((u64::MAX - 2) as u128) as u64
            }
            ProbeOutcome::Score(score) => 1 + u64::from(MAX_MEDIA_SCORE.saturating_sub(*score)),
            ProbeOutcome::Failed(_) => u64::MAX,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Failed(_))
    }
}
