//! IPTV playlist aggregator.
//!
//! Fetches publicly listed playlists from configured sources, matches them
//! against a channel template, probes candidate URLs for liveness and
//! quality, and writes merged m3u/txt playlists split by address family.

pub mod cache;
pub mod config;
pub mod errors;
pub mod ingestor;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod probe;
pub mod ranker;
pub mod template;
pub mod writer;

pub use config::Config;
pub use pipeline::{Pipeline, RunSummary};
