use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_secs: u64,
    pub cycles: CycleMetrics,
    pub mints: MintMetrics,
    pub faucet: FaucetMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleMetrics {
    pub total: u64,
    pub funded: u64,
    pub skipped: u64,
    pub errored: u64,
    pub funded_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MintMetrics {
    pub success: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaucetMetrics {
    pub requests: u64,
    pub rate_limit_hits: u64,
    pub rate_limit_wait_secs: u64,
}

/// How a single cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Funded,
    Skipped,
    Errored,
}

#[derive(Debug)]
pub struct MetricsCollector {
    cycles_funded: AtomicU64,
    cycles_skipped: AtomicU64,
    cycles_errored: AtomicU64,
    mints_success: AtomicU64,
    mints_failed: AtomicU64,
    faucet_requests: AtomicU64,
    rate_limit_hits: AtomicU64,
    rate_limit_wait_ms: AtomicU64,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            cycles_funded: AtomicU64::new(0),
            cycles_skipped: AtomicU64::new(0),
            cycles_errored: AtomicU64::new(0),
            mints_success: AtomicU64::new(0),
            mints_failed: AtomicU64::new(0),
            faucet_requests: AtomicU64::new(0),
            rate_limit_hits: AtomicU64::new(0),
            rate_limit_wait_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl MetricsCollector {
    pub fn record_cycle(&self, kind: CycleKind) {
        let counter = match kind {
            CycleKind::Funded => &self.cycles_funded,
            CycleKind::Skipped => &self.cycles_skipped,
            CycleKind::Errored => &self.cycles_errored,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_mint(&self, success: bool) {
        if success {
            self.mints_success.fetch_add(1, Ordering::SeqCst);
        } else {
            self.mints_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_faucet_request(&self) {
        self.faucet_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rate_limit(&self, wait: Duration) {
        self.rate_limit_hits.fetch_add(1, Ordering::SeqCst);
        self.rate_limit_wait_ms
            .fetch_add(wait.as_millis() as u64, Ordering::SeqCst);
    }

    fn cycles_total(&self) -> u64 {
        self.cycles_funded.load(Ordering::SeqCst)
            + self.cycles_skipped.load(Ordering::SeqCst)
            + self.cycles_errored.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.cycles_total();
        let funded = self.cycles_funded.load(Ordering::SeqCst);

        MetricsSnapshot {
            timestamp: Utc::now().to_rfc3339(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            cycles: CycleMetrics {
                total,
                funded,
                skipped: self.cycles_skipped.load(Ordering::SeqCst),
                errored: self.cycles_errored.load(Ordering::SeqCst),
                funded_rate: if total > 0 {
                    funded as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            },
            mints: MintMetrics {
                success: self.mints_success.load(Ordering::SeqCst),
                failed: self.mints_failed.load(Ordering::SeqCst),
            },
            faucet: FaucetMetrics {
                requests: self.faucet_requests.load(Ordering::SeqCst),
                rate_limit_hits: self.rate_limit_hits.load(Ordering::SeqCst),
                rate_limit_wait_secs: self.rate_limit_wait_ms.load(Ordering::SeqCst) / 1000,
            },
        }
    }

    pub fn to_compact_json(&self) -> String {
        let snapshot = self.snapshot();
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_counters() {
        let metrics = MetricsCollector::default();

        metrics.record_cycle(CycleKind::Funded);
        metrics.record_cycle(CycleKind::Funded);
        metrics.record_cycle(CycleKind::Skipped);
        metrics.record_cycle(CycleKind::Errored);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles.total, 4);
        assert_eq!(snapshot.cycles.funded, 2);
        assert!((snapshot.cycles.funded_rate - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_rate_limit_wait_accumulates() {
        let metrics = MetricsCollector::default();
        metrics.record_rate_limit(Duration::from_secs(5));
        metrics.record_rate_limit(Duration::from_millis(2500));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.faucet.rate_limit_hits, 2);
        assert_eq!(snapshot.faucet.rate_limit_wait_secs, 7);

        let json = metrics.to_compact_json();
        assert!(json.contains("rate_limit_hits"));
    }
}
