use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sources: SourceConfig,
    pub probe: ProbeConfig,
    pub selection: SelectionConfig,
    pub output: OutputConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Playlist source URLs, fetched in order
    pub urls: Vec<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Category used for m3u entries that carry no group-title attribute
    pub default_category: String,
    pub user_agent: String,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per source, including the first one
    pub max_attempts: u32,
    /// Base delay in seconds; doubled on each further attempt
    pub backoff_base_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategyKind {
    /// HEAD request, elapsed time on HTTP 200
    Http,
    /// ffmpeg decode for a bounded duration, composite score
    Ffmpeg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub strategy: ProbeStrategyKind,
    /// Per-URL probe timeout in seconds
    pub link_check_timeout_secs: u64,
    /// Maximum in-flight probes
    pub max_concurrent: usize,
    /// URLs containing any of these substrings bypass probing and rank best
    pub skip_check_patterns: Vec<String>,
    /// Seconds of stream the media probe decodes before stopping
    pub media_probe_duration_secs: u64,
    /// Upper bound on the media probe process lifetime in seconds
    pub media_probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Per channel, per address family
    pub max_urls_per_channel: usize,
    /// URLs containing any of these substrings never reach the output
    pub url_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub ipv4: OutputFiles,
    pub ipv6: OutputFiles,
    /// Most recent backups kept per output file
    pub backups_to_keep: u32,
    pub logo_base_url: String,
    pub epg_urls: Vec<String>,
    pub announcements: Vec<AnnouncementGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFiles {
    pub m3u: String,
    pub txt: String,
}

/// A pseudo-category written before the template categories; its entries
/// are fixed rather than fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementGroup {
    pub channel: String,
    pub entries: Vec<AnnouncementEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementEntry {
    /// Defaults to the current date when unset
    pub name: Option<String>,
    pub url: String,
    pub logo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Cached source bodies older than this are ignored
    pub max_age_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourceConfig {
                urls: vec![
                    "https://gitee.com/xiaranxiaran/tv/raw/master/1.txt".to_string(),
                    "https://raw.githubusercontent.com/xmlim/ziyong/main/FJTELE.m3u".to_string(),
                    "https://raw.githubusercontent.com/xmlim/ziyong/main/FJCMCC.m3u".to_string(),
                ],
                request_timeout_secs: 10,
                default_category: "其他频道".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                    .to_string(),
                retry: RetryConfig {
                    max_attempts: 3,
                    backoff_base_secs: 1,
                },
            },
            probe: ProbeConfig {
                strategy: ProbeStrategyKind::Http,
                link_check_timeout_secs: 5,
                max_concurrent: 50,
                skip_check_patterns: Vec::new(),
                media_probe_duration_secs: 10,
                media_probe_timeout_secs: 20,
            },
            selection: SelectionConfig {
                max_urls_per_channel: 10,
                url_blacklist: vec![
                    "epg.pw/stream/".to_string(),
                    "103.40.13.71:12390".to_string(),
                    "[2409:8087:1a01:df::4077]/PLTV/".to_string(),
                    "8.210.140.75:68".to_string(),
                    "154.12.50.54".to_string(),
                    "yinhe.live_hls.zte.com".to_string(),
                    "8.137.59.151".to_string(),
                    "[2409:8087:7000:20:1000::22]:6060".to_string(),
                    "histar.zapi.us.kg".to_string(),
                    "www.tfiplaytv.vip".to_string(),
                    "dp.sxtv.top".to_string(),
                    "111.230.30.193".to_string(),
                    "148.135.93.213:81".to_string(),
                    "live.goodiptv.club".to_string(),
                    "iptv.luas.edu.cn".to_string(),
                    "[2409:8087:2001:20:2800:0:df6e:eb22]:80".to_string(),
                    "[2409:8087:2001:20:2800:0:df6e:eb23]:80".to_string(),
                    "[2409:8087:2001:20:2800:0:df6e:eb1d]/ott.mobaibox.com/".to_string(),
                    "[2409:8087:2001:20:2800:0:df6e:eb1d]:80".to_string(),
                    "[2409:8087:2001:20:2800:0:df6e:eb24]".to_string(),
                    "2409:8087:2001:20:2800:0:df6e:eb25]:80".to_string(),
                    "[2409:8087:2001:20:2800:0:df6e:eb27]".to_string(),
                    "example.com".to_string(),
                    "localhost".to_string(),
                    "127.0.0.1".to_string(),
                    "0.0.0.0".to_string(),
                ],
            },
            output: OutputConfig {
                dir: PathBuf::from("output"),
                ipv4: OutputFiles {
                    m3u: "live.m3u".to_string(),
                    txt: "live.txt".to_string(),
                },
                ipv6: OutputFiles {
                    m3u: "live_ipv6.m3u".to_string(),
                    txt: "live_ipv6.txt".to_string(),
                },
                backups_to_keep: 5,
                logo_base_url: "https://gcore.jsdelivr.net/gh/yuanzl77/TVlogo@master/png/"
                    .to_string(),
                epg_urls: vec![
                    "https://live.fanmingming.com/e.xml".to_string(),
                    "http://epg.51zmt.top:8000/e.xml".to_string(),
                    "http://epg.aptvapp.com/xml".to_string(),
                    "https://epg.pw/xmltv/epg_CN.xml".to_string(),
                    "https://epg.pw/xmltv/epg_HK.xml".to_string(),
                    "https://epg.pw/xmltv/epg_TW.xml".to_string(),
                ],
                announcements: vec![AnnouncementGroup {
                    channel: "LINTCL更新日期".to_string(),
                    entries: vec![AnnouncementEntry {
                        name: None,
                        url: "https://gitlab.com/lr77/IPTV/-/raw/main/%E8%B5%B7%E9%A3%8E%E4%BA%86.mp4"
                            .to_string(),
                        logo: "http://175.178.251.183:6689/LR.jpg".to_string(),
                    }],
                }],
            },
            cache: CacheConfig {
                enabled: false,
                dir: PathBuf::from("iptv_cache"),
                max_age_hours: 24,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_file, contents)?;
            Ok(default_config)
        }
    }
}
