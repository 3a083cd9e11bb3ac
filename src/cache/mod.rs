//! Optional on-disk cache of fetched source bodies.
//!
//! Each source body is stored under a key derived from its URL, with a
//! JSON index recording fetch timestamps. The pipeline consults the cache
//! only when a live fetch fails, and ignores entries older than the
//! configured maximum age.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::CacheConfig;

const INDEX_FILE: &str = "cache_index.json";
const SOURCES_SUBDIR: &str = "sources";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CacheIndex {
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    file: PathBuf,
    fetched_at: DateTime<Utc>,
}

pub struct SourceCache {
    dir: PathBuf,
    sources_dir: PathBuf,
    index_path: PathBuf,
    max_age: Duration,
}

impl SourceCache {
    /// Open (creating if needed) the cache directory layout.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        let dir = config.dir.clone();
        let sources_dir = dir.join(SOURCES_SUBDIR);
        std::fs::create_dir_all(&sources_dir)?;

        Ok(Self {
            index_path: dir.join(INDEX_FILE),
            dir,
            sources_dir,
            max_age: Duration::hours(config.max_age_hours as i64),
        })
    }

    /// Store a freshly fetched body, replacing any previous entry for the
    /// same source URL.
    pub fn store(&self, url: &str, body: &str) -> Result<()> {
        let key = cache_key(url);
        let file = self.sources_dir.join(format!("{}.playlist", key));
        std::fs::write(&file, body)?;

        let mut index = self.load_index();
        index.entries.insert(
            key,
            CacheEntry {
                url: url.to_string(),
                file,
                fetched_at: Utc::now(),
            },
        );
        self.save_index(&index)
    }

    /// Return the cached body for a source URL if present and fresh.
    /// Any read problem is treated as a miss.
    pub fn lookup(&self, url: &str) -> Option<String> {
        let index = self.load_index();
        let entry = index.entries.get(&cache_key(url))?;

        if Utc::now() - entry.fetched_at > self.max_age {
            return None;
        }

        match std::fs::read_to_string(&entry.file) {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Cache file {} unreadable: {}", entry.file.display(), e);
                None
            }
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn load_index(&self) -> CacheIndex {
        match std::fs::read_to_string(&self.index_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("Cache index corrupt, starting fresh: {}", e);
                CacheIndex::default()
            }),
            Err(_) => CacheIndex::default(),
        }
    }

    fn save_index(&self, index: &CacheIndex) -> Result<()> {
        let contents = serde_json::to_string_pretty(index)?;
        std::fs::write(&self.index_path, contents)?;
        Ok(())
    }
}

/// Derived cache identifier for a source URL.
fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    // 16 bytes of the digest is plenty for collision-free filenames.
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}
