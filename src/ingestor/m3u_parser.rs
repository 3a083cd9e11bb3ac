//! Parser for the `#EXTINF`-tagged container format.

use anyhow::Result;
use regex::Regex;

use crate::models::{ChannelEntry, FetchedChannels};

pub struct M3uParser {
    group_title_re: Regex,
}

impl M3uParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            group_title_re: Regex::new(r#"group-title="(.*?)",(.*)"#)?,
        })
    }

    /// Parse m3u content into per-category channel entries.
    ///
    /// Each `#EXTINF` line names a (category, channel) pair via its
    /// `group-title` attribute and the display name after the attribute
    /// block; the next non-comment line is the URL bound to that pair.
    /// Lines without a `group-title` fall back to `default_category` with
    /// the display name taken from the text after the last comma.
    pub fn parse(&self, content: &str, default_category: &str) -> FetchedChannels {
        let mut channels = FetchedChannels::default();
        let mut pending: Option<(String, String)> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("#EXTINF") {
                pending = self.parse_extinf(line, default_category);
                if let Some((category, _)) = &pending {
                    channels.ensure_category(category);
                }
            } else if !line.starts_with('#') {
                if let Some((category, name)) = pending.take() {
                    channels.push(
                        &category,
                        ChannelEntry {
                            name,
                            url: line.to_string(),
                        },
                    );
                }
            }
        }

        channels
    }

    fn parse_extinf(&self, line: &str, default_category: &str) -> Option<(String, String)> {
        if let Some(caps) = self.group_title_re.captures(line) {
            let category = caps.get(1).map(|m| m.as_str().trim())?;
            let name = caps.get(2).map(|m| m.as_str().trim())?;
            if name.is_empty() {
                return None;
            }
            return Some((category.to_string(), name.to_string()));
        }

        // No group-title attribute: display name is the trailing text after
        // the last comma.
        let name = line.rsplit(',').next().unwrap_or("").trim();
        if name.is_empty() || name.starts_with("#EXTINF") {
            return None;
        }
        Some((default_category.to_string(), name.to_string()))
    }
}
