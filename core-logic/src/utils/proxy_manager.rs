//! # Core Logic - Proxy Pool
//!
//! Loads `IP:PORT@USER:PASS` proxy lists and tracks per-proxy throttling.
//! A throttled proxy is limited until a deadline, after which it reads as
//! available again without any explicit reset.

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PROXY_LINE: &str = r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})@(\w+):(\w+)";

/// Upper bound on a single limit, whatever the server asked for.
const MAX_LIMIT_HOLD: Duration = Duration::from_secs(365 * 24 * 3600);

fn proxy_line() -> Result<Regex, ProxyError> {
    Regex::new(PROXY_LINE).map_err(|e| ProxyError::Pattern {
        reason: e.to_string(),
    })
}

/// Live status of a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    Available,
    LimitedUntil(Instant),
}

/// One configured proxy with its throttling state.
///
/// The deadline is kept in an atomic (milliseconds since `epoch`, 0 = never
/// limited) so the faucet path can write it while the scheduler reads it.
#[derive(Debug)]
pub struct Proxy {
    config: ProxyConfig,
    epoch: Instant,
    cooldown: Duration,
    limited_until_ms: AtomicU64,
}

impl Proxy {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            cooldown: Duration::ZERO,
            limited_until_ms: AtomicU64::new(0),
        }
    }

    /// Proxy URI with credentials. Never log this.
    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    /// `ip:port` for log lines
    pub fn display_host(&self) -> &str {
        self.config.host()
    }

    pub fn status(&self) -> ProxyStatus {
        let until_ms = self.limited_until_ms.load(Ordering::SeqCst);
        if until_ms == 0 {
            return ProxyStatus::Available;
        }

        let until = self.epoch + Duration::from_millis(until_ms);
        if Instant::now() >= until {
            ProxyStatus::Available
        } else {
            ProxyStatus::LimitedUntil(until)
        }
    }

    pub fn is_limited(&self) -> bool {
        matches!(self.status(), ProxyStatus::LimitedUntil(_))
    }

    /// Marks the proxy limited for `max(retry_after, cooldown)`, capped at
    /// one year.
    ///
    /// An existing later deadline is kept. Returns the effective deadline.
    pub fn mark_limited(&self, retry_after: Duration) -> Instant {
        let hold = retry_after.max(self.cooldown).min(MAX_LIMIT_HOLD);
        let until = Instant::now() + hold;
        let until_ms = (until.duration_since(self.epoch).as_millis() as u64).max(1);

        let previous = self.limited_until_ms.fetch_max(until_ms, Ordering::SeqCst);
        debug!(
            "Proxy {} limited for {:?} (retry-after {:?})",
            self.display_host(),
            hold,
            retry_after
        );

        self.epoch + Duration::from_millis(previous.max(until_ms))
    }

    pub fn reset(&self) {
        self.limited_until_ms.store(0, Ordering::SeqCst);
    }
}

/// Ordered proxy list, file order preserved. Duplicates are kept as
/// independent entries.
#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<Proxy>,
}

impl ProxyPool {
    pub const DEFAULT_FILE: &'static str = "proxy.txt";

    /// Parses a single `IP:PORT@USER:PASS` line.
    pub fn parse_line(line: &str) -> Result<ProxyConfig, ProxyError> {
        Self::parse_with(&proxy_line()?, line)
    }

    fn parse_with(pattern: &Regex, line: &str) -> Result<ProxyConfig, ProxyError> {
        let line = line.trim();
        let caps = pattern
            .captures(line)
            .ok_or_else(|| ProxyError::InvalidFormat {
                line: line.to_string(),
            })?;

        Ok(ProxyConfig {
            url: format!("http://{}:{}", &caps[1], &caps[2]),
            username: Some(caps[3].to_string()),
            password: Some(caps[4].to_string()),
        })
    }

    /// Builds a pool from proxy list text. Lines that do not parse are skipped.
    pub fn load(content: &str, source_name: &str) -> Result<Self, ProxyError> {
        let pattern = proxy_line()?;
        let mut proxies = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match Self::parse_with(&pattern, line) {
                Ok(config) => proxies.push(Proxy::new(config)),
                Err(e) => debug!("Skipping proxy line: {}", e),
            }
        }

        if proxies.is_empty() {
            warn!("No usable proxy in {}", source_name);
            return Err(ProxyError::PoolExhausted {
                source_name: source_name.to_string(),
            });
        }

        info!("Found {} proxy in {}", proxies.len(), source_name);
        Ok(Self { proxies })
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ProxyError::Io {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;

        Self::load(&content, &path.display().to_string())
    }

    /// Minimum time a proxy stays limited after a 429, whatever the server said.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        for proxy in &mut self.proxies {
            proxy.cooldown = cooldown;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies.iter()
    }

    /// Proxy at a rotation position. Does not look at status.
    pub fn acquire(&self, index: usize) -> &Proxy {
        &self.proxies[index % self.proxies.len()]
    }

    pub fn get(&self, index: usize) -> Result<&Proxy, ProxyError> {
        self.proxies.get(index).ok_or(ProxyError::NotFound {
            index,
            total: self.proxies.len(),
        })
    }

    pub fn mark_limited(&self, index: usize, retry_after: Duration) -> Result<Instant, ProxyError> {
        Ok(self.get(index)?.mark_limited(retry_after))
    }

    pub fn reset(&self, index: usize) -> Result<(), ProxyError> {
        self.get(index)?.reset();
        Ok(())
    }

    pub fn all_limited(&self) -> bool {
        self.proxies.iter().all(Proxy::is_limited)
    }

    pub fn available_count(&self) -> usize {
        self.proxies.iter().filter(|p| !p.is_limited()).count()
    }
}
