//! Output rendering: the merged playlist in m3u and txt container formats,
//! one pair of files per address family, plus backup rotation.

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use crate::config::{AnnouncementGroup, OutputConfig, OutputFiles};
use crate::errors::AppError;
use crate::models::{IpFamily, GENRE_MARKER};
use crate::ranker::SelectedUrls;

/// The fully selected and ranked playlist, ready for rendering. Categories
/// and channels are in template order; URLs are in ranked order.
#[derive(Debug, Clone, Default)]
pub struct SelectedPlaylist {
    pub categories: Vec<SelectedCategory>,
}

#[derive(Debug, Clone)]
pub struct SelectedCategory {
    pub name: String,
    pub channels: Vec<SelectedChannel>,
}

#[derive(Debug, Clone)]
pub struct SelectedChannel {
    pub name: String,
    pub urls: SelectedUrls,
}

pub struct OutputWriter {
    config: OutputConfig,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render and write all four output files (m3u + txt per address
    /// family). Each file is written to a temp path and renamed into
    /// place so a crash mid-write never leaves a half-written playlist.
    pub fn write_all(&self, playlist: &SelectedPlaylist) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.config.dir)
            .map_err(|e| AppError::output(self.config.dir.display().to_string(), e))?;

        let announcements = self.resolve_announcements();

        for (family, files) in [
            (IpFamily::V4, self.config.ipv4.clone()),
            (IpFamily::V6, self.config.ipv6.clone()),
        ] {
            let m3u = self.render_m3u(playlist, &announcements, family);
            let txt = self.render_txt(playlist, &announcements, family);
            self.write_atomic(&files.m3u, &m3u)?;
            self.write_atomic(&files.txt, &txt)?;
        }

        Ok(())
    }

    /// Clone the configured announcement groups, filling unset entry names
    /// with the current date.
    fn resolve_announcements(&self) -> Vec<AnnouncementGroup> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let mut groups = self.config.announcements.clone();
        for group in &mut groups {
            for entry in &mut group.entries {
                if entry.name.is_none() {
                    entry.name = Some(today.clone());
                }
            }
        }
        groups
    }

    fn render_m3u(
        &self,
        playlist: &SelectedPlaylist,
        announcements: &[AnnouncementGroup],
        family: IpFamily,
    ) -> String {
        let epg_attr = self
            .config
            .epg_urls
            .iter()
            .map(|u| format!("\"{}\"", u))
            .collect::<Vec<_>>()
            .join(",");
        let mut out = format!("#EXTM3U x-tvg-url={}\n", epg_attr);

        for group in announcements {
            for entry in &group.entries {
                let name = entry.name.as_deref().unwrap_or("");
                out.push_str(&format!(
                    "#EXTINF:-1 tvg-id=\"1\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n",
                    name, entry.logo, group.channel, name
                ));
                out.push_str(&entry.url);
                out.push('\n');
            }
        }

        for category in &playlist.categories {
            for channel in &category.channels {
                for (index, url) in channel.urls.for_family(family).iter().enumerate() {
                    out.push_str(&format!(
                        "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}{}.png\" group-title=\"{}\",{}\n",
                        index + 1,
                        channel.name,
                        self.config.logo_base_url,
                        channel.name,
                        category.name,
                        channel.name
                    ));
                    out.push_str(url);
                    out.push('\n');
                }
            }
        }

        out
    }

    fn render_txt(
        &self,
        playlist: &SelectedPlaylist,
        announcements: &[AnnouncementGroup],
        family: IpFamily,
    ) -> String {
        let mut out = String::new();

        for group in announcements {
            out.push_str(&format!("{},{}\n", group.channel, GENRE_MARKER));
            for entry in &group.entries {
                out.push_str(&format!(
                    "{},{}\n",
                    entry.name.as_deref().unwrap_or(""),
                    entry.url
                ));
            }
        }

        for category in &playlist.categories {
            out.push_str(&format!("{},{}\n", category.name, GENRE_MARKER));
            for channel in &category.channels {
                for url in channel.urls.for_family(family) {
                    out.push_str(&format!("{},{}\n", channel.name, url));
                }
            }
        }

        out
    }

    fn write_atomic(&self, filename: &str, content: &str) -> Result<(), AppError> {
        let path = self.config.dir.join(filename);
        let tmp = self.config.dir.join(format!("{}.tmp", filename));

        std::fs::write(&tmp, content)
            .map_err(|e| AppError::output(tmp.display().to_string(), e))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| AppError::output(path.display().to_string(), e))?;

        info!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    /// Copy the freshly written outputs into a backups directory with a
    /// timestamp infix, then delete all but the most recent N backups of
    /// each file.
    pub fn rotate_backups(&self) -> Result<(), AppError> {
        if self.config.backups_to_keep == 0 {
            return Ok(());
        }

        let backup_dir = self.config.dir.join("backups");
        std::fs::create_dir_all(&backup_dir)
            .map_err(|e| AppError::output(backup_dir.display().to_string(), e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        for filename in self.output_filenames() {
            let source = self.config.dir.join(&filename);
            if !source.exists() {
                continue;
            }
            let (stem, ext) = split_filename(&filename);
            let backup_name = format!("{}_{}.{}", stem, timestamp, ext);
            if let Err(e) = std::fs::copy(&source, backup_dir.join(&backup_name)) {
                warn!("Failed to back up {}: {}", source.display(), e);
                continue;
            }
            self.cleanup_old_backups(&backup_dir, &stem, &ext)?;
        }

        Ok(())
    }

    fn cleanup_old_backups(
        &self,
        backup_dir: &std::path::Path,
        stem: &str,
        ext: &str,
    ) -> Result<(), AppError> {
        let prefix = format!("{}_", stem);
        let suffix = format!(".{}", ext);
        let mut versions: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();

        for entry in std::fs::read_dir(backup_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            // The infix must be timestamp-shaped, otherwise the "live_"
            // prefix would also claim "live_ipv6_*" backups.
            let is_timestamped = file_name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .is_some_and(|infix| {
                    !infix.is_empty() && infix.chars().all(|c| c.is_ascii_digit() || c == '_')
                });
            if is_timestamped {
                if let Ok(metadata) = entry.metadata() {
                    if let Ok(modified) = metadata.modified() {
                        versions.push((modified, entry.path()));
                    }
                }
            }
        }

        // Newest first
        versions.sort_by(|a, b| b.0.cmp(&a.0));

        let keep_count = self.config.backups_to_keep as usize;
        for (_, path) in versions.into_iter().skip(keep_count) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove old backup {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    fn output_filenames(&self) -> Vec<String> {
        let OutputFiles { m3u: m4, txt: t4 } = self.config.ipv4.clone();
        let OutputFiles { m3u: m6, txt: t6 } = self.config.ipv6.clone();
        vec![m4, t4, m6, t6]
    }
}

fn split_filename(filename: &str) -> (String, String) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), ext.to_string()),
        None => (filename.to_string(), String::new()),
    }
}
