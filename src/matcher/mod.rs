//! Channel matching: merges fetched per-source entries against the
//! template's channel names, producing per-channel candidate URL lists.

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info};

use crate::models::{
    FetchedChannels, MatchedCategory, MatchedChannel, MatchedChannels, Template,
};

pub struct ChannelMatcher {
    star_re: Regex,
    bracket_re: Regex,
    paren_re: Regex,
}

impl ChannelMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            star_re: Regex::new(r"[★☆✦•＊*]+")?,
            bracket_re: Regex::new(r"[\[【][^\]】]*[\]】]")?,
            paren_re: Regex::new(r"[（(][^)）]*[)）]")?,
        })
    }

    /// Match every template channel against all fetched entries.
    ///
    /// First pass is exact string equality; when a channel finds no exact
    /// match, a second pass compares normalized names. Channels with no
    /// match at all still appear in the result with an empty URL list.
    /// Matching only ever pulls URLs toward template names; fetched names
    /// never create new channels.
    pub fn match_channels(
        &self,
        template: &Template,
        fetched: &FetchedChannels,
    ) -> MatchedChannels {
        let mut matched = MatchedChannels::default();

        for category in template.categories() {
            let mut channels = Vec::with_capacity(category.channels.len());

            for channel_name in &category.channels {
                let mut urls: Vec<String> = fetched
                    .entries()
                    .filter(|entry| entry.name == *channel_name)
                    .map(|entry| entry.url.clone())
                    .collect();

                if urls.is_empty() {
                    let normalized = self.normalize_name(channel_name);
                    urls = fetched
                        .entries()
                        .filter(|entry| self.normalize_name(&entry.name) == normalized)
                        .map(|entry| entry.url.clone())
                        .collect();
                }

                debug!("Channel {} matched {} candidate urls", channel_name, urls.len());
                channels.push(MatchedChannel {
                    name: channel_name.clone(),
                    urls,
                });
            }

            matched.categories.push(MatchedCategory {
                name: category.name.clone(),
                channels,
            });
        }

        info!(
            "Matching completed: {} resolved, {} unresolved channels",
            matched.resolved_count(),
            matched.unresolved_count()
        );
        matched
    }

    /// Strip ornamental marks from a channel name: stars, bracketed
    /// qualifiers like `[1080p]`, and parenthetical annotations, in both
    /// half- and full-width forms. Case is preserved; matching stays
    /// case-sensitive on the normalized form.
    pub fn normalize_name(&self, name: &str) -> String {
        let name = self.star_re.replace_all(name, "");
        let name = self.bracket_re.replace_all(&name, "");
        let name = self.paren_re.replace_all(&name, "");
        name.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChannelEntry;
    use crate::template::parse_template;

    fn matcher() -> ChannelMatcher {
        ChannelMatcher::new().unwrap()
    }

    fn fetched(entries: &[(&str, &str, &str)]) -> FetchedChannels {
        let mut channels = FetchedChannels::default();
        for (category, name, url) in entries {
            channels.push(
                category,
                ChannelEntry {
                    name: name.to_string(),
                    url: url.to_string(),
                },
            );
        }
        channels
    }

    #[test]
    fn exact_match_collects_urls_across_sources_and_categories() {
        let template = parse_template("央视,#genre#\nCCTV1\n");
        let fetched = fetched(&[
            ("央视频道", "CCTV1", "http://a/1"),
            ("综合", "CCTV1", "http://b/2"),
            ("综合", "CCTV2", "http://b/3"),
        ]);

        let matched = matcher().match_channels(&template, &fetched);
        let channel = &matched.categories[0].channels[0];

        assert_eq!(channel.name, "CCTV1");
        assert_eq!(channel.urls, vec!["http://a/1", "http://b/2"]);
    }

    #[test]
    fn normalized_match_is_fallback_only() {
        let template = parse_template("央视,#genre#\nCCTV1\n");
        // Only ornamented variants exist, so the normalized pass applies.
        let fetched = fetched(&[
            ("综合", "★CCTV1★", "http://a/1"),
            ("综合", "CCTV1[1080p]", "http://a/2"),
            ("综合", "CCTV1(备用)", "http://a/3"),
        ]);

        let matched = matcher().match_channels(&template, &fetched);
        let channel = &matched.categories[0].channels[0];

        assert_eq!(channel.urls.len(), 3);
    }

    #[test]
    fn exact_matches_suppress_the_normalized_pass() {
        let template = parse_template("央视,#genre#\nCCTV1\n");
        let fetched = fetched(&[
            ("综合", "CCTV1", "http://exact/1"),
            ("综合", "★CCTV1★", "http://ornamented/1"),
        ]);

        let matched = matcher().match_channels(&template, &fetched);
        let channel = &matched.categories[0].channels[0];

        assert_eq!(channel.urls, vec!["http://exact/1"]);
    }

    #[test]
    fn unresolved_channels_stay_present_with_empty_urls() {
        let template = parse_template("央视,#genre#\nCCTV1\nCCTV99\n");
        let fetched = fetched(&[("综合", "CCTV1", "http://a/1")]);

        let matched = matcher().match_channels(&template, &fetched);
        let channels = &matched.categories[0].channels;

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].name, "CCTV99");
        assert!(channels[1].urls.is_empty());
        assert_eq!(matched.unresolved_count(), 1);
    }

    #[test]
    fn matching_is_case_sensitive_on_normalized_form() {
        let template = parse_template("央视,#genre#\nCCTV1\n");
        let fetched = fetched(&[("综合", "cctv1", "http://a/1")]);

        let matched = matcher().match_channels(&template, &fetched);
        assert!(matched.categories[0].channels[0].urls.is_empty());
    }

    #[test]
    fn normalize_strips_ornaments_and_fullwidth_variants() {
        let m = matcher();
        assert_eq!(m.normalize_name("★CCTV1★"), "CCTV1");
        assert_eq!(m.normalize_name("CCTV1[1080p]"), "CCTV1");
        assert_eq!(m.normalize_name("CCTV1【高清】"), "CCTV1");
        assert_eq!(m.normalize_name("CCTV1（备用）"), "CCTV1");
        assert_eq!(m.normalize_name(" CCTV1 (HD) "), "CCTV1");
    }
}
