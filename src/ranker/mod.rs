//! URL selection and ranking.
//!
//! Per channel: blacklisted URLs are dropped, URLs already selected this
//! run are dropped (global de-dup), the rest are split by address family,
//! stable-sorted by probe outcome (failures last, ties keep discovery
//! order), truncated to the per-channel cap, and annotated with the address
//! family / line-index suffix.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use url::{Host, Url};

use crate::config::SelectionConfig;
use crate::models::{IpFamily, ProbeOutcome};

/// Literal marker placed between the base URL and its quality label.
const SUFFIX_MARKER: &str = "$LR•";

/// Final annotated URLs for one channel, one list per address family, in
/// ranked order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedUrls {
    pub v4: Vec<String>,
    pub v6: Vec<String>,
}

impl SelectedUrls {
    pub fn for_family(&self, family: IpFamily) -> &[String] {
        match family {
            IpFamily::V4 => &self.v4,
            IpFamily::V6 => &self.v6,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

/// Route a URL to its address family: a bracketed IPv6 literal host goes to
/// `V6`, anything else (hostnames, IPv4 literals, unparsable strings)
/// counts as `V4`.
pub fn ip_family(url: &str) -> IpFamily {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host() {
            Some(Host::Ipv6(_)) => IpFamily::V6,
            _ => IpFamily::V4,
        },
        Err(_) => IpFamily::V4,
    }
}

/// Append the suffix label to a base URL, stripping any pre-existing
/// `$`-suffix first. The 1-based line index is added only when more than
/// one URL survived for the channel in that family.
pub fn annotate_url(url: &str, family: IpFamily, index: usize, total: usize) -> String {
    let base = url.split('$').next().unwrap_or(url);
    if total > 1 {
        format!("{}{}{}『线路{}』", base, SUFFIX_MARKER, family.label(), index)
    } else {
        format!("{}{}{}", base, SUFFIX_MARKER, family.label())
    }
}

pub struct UrlSelector {
    config: SelectionConfig,
    /// URLs selected for output earlier in this run; a literal URL string
    /// is written at most once per run. Mutated single-threaded, after all
    /// probing has completed.
    written: HashSet<String>,
}

impl UrlSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            written: HashSet::new(),
        }
    }

    /// Select and rank one channel's candidates. Candidates must be in
    /// discovery order; outcomes are looked up by URL, so this never
    /// depends on probe completion order. URLs missing from `outcomes`
    /// rank as failures.
    pub fn select(
        &mut self,
        candidates: &[String],
        outcomes: &HashMap<String, ProbeOutcome>,
    ) -> SelectedUrls {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut v4 = Vec::new();
        let mut v6 = Vec::new();

        for url in candidates {
            if url.is_empty() {
                continue;
            }
            if self.is_blacklisted(url) {
                debug!("Dropping blacklisted url {}", url);
                continue;
            }
            if self.written.contains(url.as_str()) || !seen.insert(url.as_str()) {
                continue;
            }
            match ip_family(url) {
                IpFamily::V6 => v6.push(url.clone()),
                IpFamily::V4 => v4.push(url.clone()),
            }
        }

        SelectedUrls {
            v4: self.finalize(v4, outcomes, IpFamily::V4),
            v6: self.finalize(v6, outcomes, IpFamily::V6),
        }
    }

    fn finalize(
        &mut self,
        mut urls: Vec<String>,
        outcomes: &HashMap<String, ProbeOutcome>,
        family: IpFamily,
    ) -> Vec<String> {
        urls.sort_by_key(|url| {
            outcomes
                .get(url)
                .map(ProbeOutcome::sort_key)
                .unwrap_or(u64::MAX)
        });
        urls.truncate(self.config.max_urls_per_channel);

        for url in &urls {
            self.written.insert(url.clone());
        }

        let total = urls.len();
        urls.into_iter()
            .enumerate()
            .map(|(i, url)| annotate_url(&url, family, i + 1, total))
            .collect()
    }

    fn is_blacklisted(&self, url: &str) -> bool {
        self.config
            .url_blacklist
            .iter()
            .any(|pattern| url.contains(pattern))
    }
}
