//! Heavyweight media probe: decode the stream with ffmpeg for a bounded
//! duration and derive a score from the exit status, elapsed time and the
//! error/warning markers in its diagnostic output.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::LinkProbe;
use crate::errors::ProbeFailure;
use crate::models::{ProbeOutcome, MAX_MEDIA_SCORE};

pub struct FfmpegProbe {
    decode_duration_secs: u64,
    wait_timeout: Duration,
}

impl FfmpegProbe {
    pub fn new(decode_duration_secs: u64, wait_timeout: Duration) -> Self {
        Self {
            decode_duration_secs,
            wait_timeout,
        }
    }
}

#[async_trait]
impl LinkProbe for FfmpegProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let mut command = Command::new("ffmpeg");
        command
            .arg("-i")
            .arg(url)
            .arg("-t")
            .arg(self.decode_duration_secs.to_string())
            .arg("-f")
            .arg("null")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => return ProbeOutcome::Failed(ProbeFailure::Process(err.to_string())),
        };

        match tokio::time::timeout(self.wait_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let elapsed = started.elapsed();
                if output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let score = media_score(elapsed, &stderr);
                    debug!("ffmpeg probe for {} scored {} in {:?}", url, score, elapsed);
                    ProbeOutcome::Score(score)
                } else {
                    ProbeOutcome::Score(0)
                }
            }
            Ok(Err(err)) => ProbeOutcome::Failed(ProbeFailure::Process(err.to_string())),
            Err(_) => ProbeOutcome::Failed(ProbeFailure::Timeout),
        }
    }
}

/// Composite score for a successful decode: start from the maximum, deduct
/// one point per elapsed second (capped at 20), five per `Error` and two
/// per `Warning` in the diagnostic output, clamped to zero.
pub(crate) fn media_score(elapsed: Duration, stderr: &str) -> u32 {
    let mut score = i64::from(MAX_MEDIA_SCORE);
    score -= elapsed.as_secs().min(20) as i64;
    score -= 5 * stderr.matches("Error").count() as i64;
    score -= 2 * stderr.matches("Warning").count() as i64;
    score.max(0) as u32
}
