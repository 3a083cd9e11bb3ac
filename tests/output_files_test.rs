//! Output rendering tests against real files in a temp directory.

use chrono::Local;
use iptv_aggregator::config::{AnnouncementEntry, AnnouncementGroup, Config, OutputConfig};
use iptv_aggregator::ranker::SelectedUrls;
use iptv_aggregator::writer::{OutputWriter, SelectedCategory, SelectedChannel, SelectedPlaylist};

fn output_config(dir: &std::path::Path) -> OutputConfig {
    let mut config = Config::default().output;
    config.dir = dir.to_path_buf();
    config.announcements = vec![AnnouncementGroup {
        channel: "LINTCL更新日期".to_string(),
        entries: vec![AnnouncementEntry {
            name: None,
            url: "http://announce.example/v.mp4".to_string(),
            logo: "http://announce.example/l.jpg".to_string(),
        }],
    }];
    config
}

fn sample_playlist() -> SelectedPlaylist {
    SelectedPlaylist {
        categories: vec![
            SelectedCategory {
                name: "央视".to_string(),
                channels: vec![
                    SelectedChannel {
                        name: "CCTV1".to_string(),
                        urls: SelectedUrls {
                            v4: vec![
                                "http://b/2$LR•IPV4『线路1』".to_string(),
                                "http://a/1$LR•IPV4『线路2』".to_string(),
                            ],
                            v6: vec!["http://[2409::1]/x$LR•IPV6".to_string()],
                        },
                    },
                    SelectedChannel {
                        name: "CCTV99".to_string(),
                        urls: SelectedUrls::default(),
                    },
                ],
            },
            SelectedCategory {
                name: "卫视".to_string(),
                channels: vec![SelectedChannel {
                    name: "湖南卫视".to_string(),
                    urls: SelectedUrls {
                        v4: vec!["http://h/1$LR•IPV4".to_string()],
                        v6: Vec::new(),
                    },
                }],
            },
        ],
    }
}

#[test]
fn txt_output_orders_announcements_then_template_categories() {
    let dir = tempfile::tempdir().unwrap();
    let writer = OutputWriter::new(output_config(dir.path()));

    writer.write_all(&sample_playlist()).unwrap();

    let txt = std::fs::read_to_string(dir.path().join("live.txt")).unwrap();
    let lines: Vec<&str> = txt.lines().collect();
    let today = Local::now().format("%Y-%m-%d").to_string();

    assert_eq!(lines[0], "LINTCL更新日期,#genre#");
    assert_eq!(lines[1], format!("{},http://announce.example/v.mp4", today));
    assert_eq!(lines[2], "央视,#genre#");
    assert_eq!(lines[3], "CCTV1,http://b/2$LR•IPV4『线路1』");
    assert_eq!(lines[4], "CCTV1,http://a/1$LR•IPV4『线路2』");
    // CCTV99 has no surviving urls and is omitted from physical output.
    assert_eq!(lines[5], "卫视,#genre#");
    assert_eq!(lines[6], "湖南卫视,http://h/1$LR•IPV4");
}

#[test]
fn m3u_output_carries_epg_header_and_extinf_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let config = output_config(dir.path());
    let logo_base = config.logo_base_url.clone();
    let writer = OutputWriter::new(config);

    writer.write_all(&sample_playlist()).unwrap();

    let m3u = std::fs::read_to_string(dir.path().join("live.m3u")).unwrap();
    let mut lines = m3u.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("#EXTM3U x-tvg-url=\""));

    assert!(m3u.contains(&format!(
        "tvg-logo=\"{}CCTV1.png\" group-title=\"央视\",CCTV1",
        logo_base
    )));
    assert!(m3u.contains("http://b/2$LR•IPV4『线路1』"));
    // The v6 url belongs to the other family's file pair.
    assert!(!m3u.contains("[2409::1]"));

    let v6_m3u = std::fs::read_to_string(dir.path().join("live_ipv6.m3u")).unwrap();
    assert!(v6_m3u.contains("http://[2409::1]/x$LR•IPV6"));
    assert!(!v6_m3u.contains("http://b/2"));
}

#[test]
fn extinf_tvg_id_counts_lines_within_a_channel() {
    let dir = tempfile::tempdir().unwrap();
    let writer = OutputWriter::new(output_config(dir.path()));

    writer.write_all(&sample_playlist()).unwrap();

    let m3u = std::fs::read_to_string(dir.path().join("live.m3u")).unwrap();
    assert!(m3u.contains("tvg-id=\"1\" tvg-name=\"CCTV1\""));
    assert!(m3u.contains("tvg-id=\"2\" tvg-name=\"CCTV1\""));
}

#[test]
fn rewriting_replaces_files_without_leaving_temps() {
    let dir = tempfile::tempdir().unwrap();
    let writer = OutputWriter::new(output_config(dir.path()));

    writer.write_all(&sample_playlist()).unwrap();
    writer.write_all(&sample_playlist()).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn backups_accumulate_up_to_the_configured_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = output_config(dir.path());
    config.backups_to_keep = 3;
    let writer = OutputWriter::new(config);

    writer.write_all(&sample_playlist()).unwrap();
    writer.rotate_backups().unwrap();

    let backup_dir = dir.path().join("backups");
    let count = std::fs::read_dir(&backup_dir).unwrap().count();
    // One backup per output file on the first rotation.
    assert_eq!(count, 4);
}
