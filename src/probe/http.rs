//! Lightweight network probe: a HEAD request with a short timeout, scored
//! by elapsed time on HTTP 200.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use super::LinkProbe;
use crate::errors::ProbeFailure;
use crate::models::ProbeOutcome;

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let started = Instant::now();
        match self.client.head(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                ProbeOutcome::Latency(started.elapsed())
            }
            Ok(response) => {
                ProbeOutcome::Failed(ProbeFailure::Status(response.status().as_u16()))
            }
            Err(err) if err.is_timeout() => ProbeOutcome::Failed(ProbeFailure::Timeout),
            Err(err) => ProbeOutcome::Failed(ProbeFailure::Connect(err.to_string())),
        }
    }
}
