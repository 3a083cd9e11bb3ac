//! Parser for the plain `name,url` container format.

use crate::models::{ChannelEntry, FetchedChannels, GENRE_MARKER};

/// Parse txt playlist content. A line containing the genre marker opens a
/// category; `name,url` lines inside a category become entries; a line
/// without a comma is a name-only entry with an empty URL. Lines before the
/// first category are ignored.
pub fn parse_txt(content: &str) -> FetchedChannels {
    let mut channels = FetchedChannels::default();
    let mut current_category: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(GENRE_MARKER) {
            let category = line.split(',').next().unwrap_or("").trim().to_string();
            channels.ensure_category(&category);
            current_category = Some(category);
        } else if let Some(category) = &current_category {
            match line.split_once(',') {
                Some((name, url)) => channels.push(
                    category,
                    ChannelEntry {
                        name: name.trim().to_string(),
                        url: url.trim().to_string(),
                    },
                ),
                None => channels.push(
                    category,
                    ChannelEntry {
                        name: line.to_string(),
                        url: String::new(),
                    },
                ),
            }
        }
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_category_and_entries() {
        let content = "央视,#genre#\nCCTV1,http://a/1\nCCTV2,http://a/2\n";
        let channels = parse_txt(content);
        let (category, entries) = channels.categories().next().unwrap();

        assert_eq!(category, "央视");
        assert_eq!(
            entries,
            &[
                ChannelEntry {
                    name: "CCTV1".to_string(),
                    url: "http://a/1".to_string()
                },
                ChannelEntry {
                    name: "CCTV2".to_string(),
                    url: "http://a/2".to_string()
                },
            ]
        );
    }

    #[test]
    fn line_without_comma_is_name_only_entry() {
        let content = "央视,#genre#\nCCTV1\n";
        let channels = parse_txt(content);
        let (_, entries) = channels.categories().next().unwrap();

        assert_eq!(entries[0].name, "CCTV1");
        assert_eq!(entries[0].url, "");
    }

    #[test]
    fn entries_before_any_category_are_dropped() {
        let content = "CCTV1,http://a/1\n央视,#genre#\nCCTV2,http://a/2\n";
        let channels = parse_txt(content);

        assert_eq!(channels.entry_count(), 1);
        assert_eq!(channels.entries().next().unwrap().name, "CCTV2");
    }

    #[test]
    fn url_with_embedded_commas_stays_intact() {
        let content = "央视,#genre#\nCCTV1,http://a/1?p=x,y\n";
        let channels = parse_txt(content);

        assert_eq!(channels.entries().next().unwrap().url, "http://a/1?p=x,y");
    }
}
