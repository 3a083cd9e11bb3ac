//! End-to-end tests of the match → rank path, fully offline: sources are
//! parsed from fixture strings and probe outcomes are fabricated.

use std::collections::HashMap;
use std::time::Duration;

use iptv_aggregator::config::SelectionConfig;
use iptv_aggregator::ingestor::{parse_txt, M3uParser};
use iptv_aggregator::matcher::ChannelMatcher;
use iptv_aggregator::models::{FetchedChannels, ProbeOutcome};
use iptv_aggregator::ranker::UrlSelector;
use iptv_aggregator::template::parse_template;

fn latency(ms: u64) -> ProbeOutcome {
    ProbeOutcome::Latency(Duration::from_millis(ms))
}

fn selector(blacklist: &[&str], cap: usize) -> UrlSelector {
    UrlSelector::new(SelectionConfig {
        max_urls_per_channel: cap,
        url_blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
    })
}

#[test]
fn cctv1_two_sources_ranked_by_probe_speed() {
    // Template has category 央视 with channel CCTV1; one source returns two
    // urls for it; b probes faster than a, so b must come first with the
    // 线路1 suffix and a second with 线路2.
    let template = parse_template("央视,#genre#\nCCTV1\n");
    let fetched = parse_txt("央视,#genre#\nCCTV1,http://a/1\nCCTV1,http://b/2\n");

    let matcher = ChannelMatcher::new().unwrap();
    let matched = matcher.match_channels(&template, &fetched);
    let candidates = &matched.categories[0].channels[0].urls;
    assert_eq!(candidates, &["http://a/1", "http://b/2"]);

    let outcomes: HashMap<String, ProbeOutcome> = [
        ("http://a/1".to_string(), latency(400)),
        ("http://b/2".to_string(), latency(90)),
    ]
    .into();

    let selected = selector(&[], 10).select(candidates, &outcomes);
    assert_eq!(
        selected.v4,
        vec![
            "http://b/2$LR•IPV4『线路1』".to_string(),
            "http://a/1$LR•IPV4『线路2』".to_string(),
        ]
    );
}

#[test]
fn every_template_channel_survives_matching_even_unresolved() {
    let template = parse_template("央视,#genre#\nCCTV1\nCCTV5\nCCTV17\n");
    let fetched = parse_txt("体育,#genre#\nCCTV5,http://s/5\n");

    let matched = ChannelMatcher::new()
        .unwrap()
        .match_channels(&template, &fetched);

    let names: Vec<&str> = matched.categories[0]
        .channels
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["CCTV1", "CCTV5", "CCTV17"]);
    assert_eq!(matched.resolved_count(), 1);
    assert_eq!(matched.unresolved_count(), 2);
}

#[test]
fn blacklist_beats_being_the_only_candidate() {
    let template = parse_template("央视,#genre#\nCCTV1\n");
    let fetched = parse_txt("央视,#genre#\nCCTV1,http://x/y\n");

    let matched = ChannelMatcher::new()
        .unwrap()
        .match_channels(&template, &fetched);
    let outcomes: HashMap<String, ProbeOutcome> =
        [("http://x/y".to_string(), latency(10))].into();

    let selected = selector(&["x/y"], 10).select(&matched.categories[0].channels[0].urls, &outcomes);
    assert!(selected.is_empty());
}

#[test]
fn m3u_and_txt_sources_merge_into_one_candidate_pool() {
    let template = parse_template("央视,#genre#\nCCTV1\n");

    let m3u_source = M3uParser::new().unwrap().parse(
        "#EXTM3U\n#EXTINF:-1 group-title=\"央视频道\",CCTV1\nhttp://m3u/1\n",
        "其他频道",
    );
    let txt_source = parse_txt("综合,#genre#\nCCTV1,http://txt/1\n");

    let mut fetched = FetchedChannels::default();
    fetched.merge(m3u_source);
    fetched.merge(txt_source);

    let matched = ChannelMatcher::new()
        .unwrap()
        .match_channels(&template, &fetched);
    assert_eq!(
        matched.categories[0].channels[0].urls,
        vec!["http://m3u/1", "http://txt/1"]
    );
}

#[test]
fn twelve_live_candidates_with_cap_ten_keep_the_ten_best() {
    let candidates: Vec<String> = (0..12).map(|i| format!("http://host{}/live", i)).collect();
    let outcomes: HashMap<String, ProbeOutcome> = candidates
        .iter()
        .enumerate()
        .map(|(i, url)| (url.clone(), latency(100 + i as u64 * 50)))
        .collect();

    let selected = selector(&[], 10).select(&candidates, &outcomes);

    assert_eq!(selected.v4.len(), 10);
    // The two slowest (host10, host11) are the ones dropped.
    assert!(!selected.v4.iter().any(|u| u.starts_with("http://host10/")));
    assert!(!selected.v4.iter().any(|u| u.starts_with("http://host11/")));
    assert!(selected.v4[0].starts_with("http://host0/"));
}

#[test]
fn ipv6_literals_never_reach_the_v4_set() {
    let candidates = vec![
        "http://[2409:8087::1]/x".to_string(),
        "http://[2408:1234::2]/y".to_string(),
        "http://plain.example/z".to_string(),
    ];
    let outcomes: HashMap<String, ProbeOutcome> = candidates
        .iter()
        .map(|u| (u.clone(), latency(50)))
        .collect();

    let selected = selector(&[], 10).select(&candidates, &outcomes);

    assert_eq!(selected.v6.len(), 2);
    assert_eq!(selected.v4.len(), 1);
    assert!(selected.v4[0].starts_with("http://plain.example/z$"));
    for url in &selected.v6 {
        assert!(url.contains("IPV6"));
    }
}

#[test]
fn a_url_shared_by_two_channels_is_emitted_once() {
    let outcomes: HashMap<String, ProbeOutcome> =
        [("http://shared/stream".to_string(), latency(30))].into();

    let mut sel = selector(&[], 10);
    let first = sel.select(&["http://shared/stream".to_string()], &outcomes);
    let second = sel.select(&["http://shared/stream".to_string()], &outcomes);

    assert_eq!(first.v4.len(), 1);
    assert!(second.is_empty());
}
