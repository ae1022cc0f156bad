//! Dynamic-IP signal
//!
//! In dynamic mode the single proxy rotates its exit IP on its own. A small
//! HTTP endpoint reports how long the rotation takes (`{"rt": seconds}`) and
//! the scheduler waits that long between cycles.

use crate::http::ProxiedClients;
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::Proxy;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Pause after a dynamic cycle for a reported rotation time.
pub fn inter_cycle_pause(rt_secs: u64) -> Duration {
    Duration::from_millis(rt_secs.saturating_mul(1001))
}

#[async_trait]
pub trait DynamicIpSignal: Send + Sync {
    /// Rotation time in seconds. Falls back to a default on any failure.
    async fn suggested_wait(&self) -> u64;

    /// Public IP seen through the proxy
    async fn current_ip(&self, proxy: &Proxy) -> Result<String>;
}

pub struct HttpIpSignal {
    signal_url: String,
    ip_echo_url: String,
    default_wait_secs: u64,
    direct: reqwest::Client,
    proxied: ProxiedClients,
}

impl HttpIpSignal {
    pub fn new(
        signal_url: impl Into<String>,
        ip_echo_url: impl Into<String>,
        default_wait_secs: u64,
    ) -> Result<Self> {
        let direct = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create signal client")?;

        Ok(Self {
            signal_url: signal_url.into(),
            ip_echo_url: ip_echo_url.into(),
            default_wait_secs,
            direct,
            proxied: ProxiedClients::new(Duration::from_secs(30)),
        })
    }

    async fn fetch_rt(&self) -> Result<u64> {
        let body: Value = self
            .direct
            .get(&self.signal_url)
            .send()
            .await
            .context("signal request failed")?
            .error_for_status()?
            .json()
            .await
            .context("signal reply is not JSON")?;

        parse_rt(&body).context("signal reply has no usable rt field")
    }
}

/// Reads `rt` as a non-negative number or numeric string.
fn parse_rt(body: &Value) -> Option<u64> {
    match body.get("rt")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl DynamicIpSignal for HttpIpSignal {
    async fn suggested_wait(&self) -> u64 {
        match self.fetch_rt().await {
            Ok(rt) => rt,
            Err(e) => {
                debug!(
                    "Signal unavailable ({:#}), using {}s",
                    e, self.default_wait_secs
                );
                self.default_wait_secs
            }
        }
    }

    async fn current_ip(&self, proxy: &Proxy) -> Result<String> {
        let client = self.proxied.client_for(proxy).await?;
        let body: Value = client
            .get(&self.ip_echo_url)
            .send()
            .await
            .context("IP lookup failed")?
            .json()
            .await
            .context("IP lookup reply is not JSON")?;

        body.get("ip")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("IP lookup reply has no ip field")
    }
}
