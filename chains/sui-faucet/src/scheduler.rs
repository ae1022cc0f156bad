//! Cycle Scheduler
//!
//! Top-level control loop. One cycle = fresh identity, faucet top-up through a
//! proxy, and for funded accounts: record the phrase, run the mints, log the
//! explorer link. Cycles run strictly one after another.
//!
//! - Static mode walks the whole pool pass after pass and stops once every
//!   proxy is limited at a pass boundary.
//! - Dynamic mode always uses the first proxy and waits for the IP rotation
//!   time reported by the signal endpoint between cycles.

use crate::account::AccountFactory;
use crate::config::RunMode;
use crate::faucet::{FaucetClient, FaucetOutcome};
use crate::mint::{MintReport, MintSequencer};
use crate::signal::{inter_cycle_pause, DynamicIpSignal};
use anyhow::{bail, Context, Result};
use core_logic::{
    ChainConfig, CycleKind, MetricsCollector, Proxy, ProxyPool, SecretRecorder,
    CYCLE_RESULT_TARGET,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Pause after a cycle that ended in an error
    pub error_pause: Duration,
    /// Stop after this many cycles
    pub max_cycles: Option<u64>,
    pub chain: ChainConfig,
}

/// How a completed cycle ended
#[derive(Debug)]
pub enum CycleOutcome {
    Funded {
        address: String,
        amount: u64,
        mints: MintReport,
    },
    Skipped {
        address: String,
        outcome: FaucetOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    AllProxiesLimited,
    MaxCycles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub funded: u64,
    pub skipped: u64,
    pub errored: u64,
    /// Completed static passes; always 0 in dynamic mode
    pub passes: u64,
    pub halt: HaltReason,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            cycles: 0,
            funded: 0,
            skipped: 0,
            errored: 0,
            passes: 0,
            halt: HaltReason::MaxCycles,
        }
    }

    fn record(&mut self, kind: CycleKind) {
        self.cycles += 1;
        match kind {
            CycleKind::Funded => self.funded += 1,
            CycleKind::Skipped => self.skipped += 1,
            CycleKind::Errored => self.errored += 1,
        }
    }
}

pub struct CycleScheduler {
    pool: Arc<ProxyPool>,
    accounts: AccountFactory,
    faucet: FaucetClient,
    minter: MintSequencer,
    recorder: Arc<dyn SecretRecorder>,
    signal: Option<Arc<dyn DynamicIpSignal>>,
    metrics: Arc<MetricsCollector>,
    settings: SchedulerSettings,
}

impl CycleScheduler {
    pub fn new(
        pool: Arc<ProxyPool>,
        faucet: FaucetClient,
        minter: MintSequencer,
        recorder: Arc<dyn SecretRecorder>,
        metrics: Arc<MetricsCollector>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            pool,
            accounts: AccountFactory::default(),
            faucet,
            minter,
            recorder,
            signal: None,
            metrics,
            settings,
        }
    }

    /// Required for dynamic mode
    pub fn with_signal(mut self, signal: Arc<dyn DynamicIpSignal>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub async fn run(&self, mode: &RunMode) -> Result<RunSummary> {
        let summary = match mode {
            RunMode::Static => self.run_static().await,
            RunMode::Dynamic { signal_url } => {
                let Some(signal) = self.signal.as_ref() else {
                    bail!("Dynamic mode ({}) needs an IP signal", signal_url);
                };
                self.run_dynamic(signal.as_ref()).await
            }
        };

        info!(
            "Run finished after {} cycles ({} funded, {} skipped, {} errored): {:?}",
            summary.cycles, summary.funded, summary.skipped, summary.errored, summary.halt
        );
        info!("Metrics: {}", self.metrics.to_compact_json());
        Ok(summary)
    }

    fn cycles_exhausted(&self, summary: &RunSummary) -> bool {
        self.settings
            .max_cycles
            .is_some_and(|max| summary.cycles >= max)
    }

    pub async fn run_static(&self) -> RunSummary {
        let mut summary = RunSummary::new();

        loop {
            if self.pool.all_limited() {
                warn!(
                    "All {} proxies are rate limited, stopping after {} passes",
                    self.pool.len(),
                    summary.passes
                );
                summary.halt = HaltReason::AllProxiesLimited;
                return summary;
            }

            for index in 0..self.pool.len() {
                if self.cycles_exhausted(&summary) {
                    summary.halt = HaltReason::MaxCycles;
                    return summary;
                }

                let proxy = self.pool.acquire(index);
                if proxy.is_limited() {
                    debug!("Skipping limited proxy {}", proxy.display_host());
                    continue;
                }

                let kind = self.guarded_cycle(proxy).await;
                summary.record(kind);
            }

            summary.passes += 1;
            info!(
                "Pass {} done, {}/{} proxies available. Metrics: {}",
                summary.passes,
                self.pool.available_count(),
                self.pool.len(),
                self.metrics.to_compact_json()
            );
        }
    }

    pub async fn run_dynamic(&self, signal: &dyn DynamicIpSignal) -> RunSummary {
        let mut summary = RunSummary::new();
        let proxy = self.pool.acquire(0);

        while !self.cycles_exhausted(&summary) {
            let rt = signal.suggested_wait().await;

            match signal.current_ip(proxy).await {
                Ok(ip) => info!("Current IP: {}", ip),
                Err(e) => warn!("Could not read current IP: {:#}", e),
            }

            let kind = self.guarded_cycle(proxy).await;
            summary.record(kind);

            tokio::time::sleep(inter_cycle_pause(rt)).await;
        }

        summary.halt = HaltReason::MaxCycles;
        summary
    }

    /// Runs one cycle; an error is logged and turned into the error pause.
    async fn guarded_cycle(&self, proxy: &Proxy) -> CycleKind {
        let kind = match self.run_cycle(proxy).await {
            Ok(CycleOutcome::Funded { .. }) => CycleKind::Funded,
            Ok(CycleOutcome::Skipped { .. }) => CycleKind::Skipped,
            Err(e) => {
                error!("Cycle via {} failed: {:#}", proxy.display_host(), e);
                tokio::time::sleep(self.settings.error_pause).await;
                CycleKind::Errored
            }
        };

        self.metrics.record_cycle(kind);
        kind
    }

    pub async fn run_cycle(&self, proxy: &Proxy) -> Result<CycleOutcome> {
        let identity = self.accounts.create().context("Failed to create account")?;
        let tag = identity.short_tag().to_string();
        let address = identity.address().to_string();

        let outcome = self.faucet.top_up(proxy, &address).await;

        let result = match outcome {
            FaucetOutcome::Funded(amount) => {
                info!("{}: Sui Address: {}", tag, address);
                self.recorder
                    .append(identity.mnemonic())
                    .await
                    .context("Failed to record mnemonic")?;

                let mints = self.minter.run(&identity).await;

                info!(
                    target: CYCLE_RESULT_TARGET,
                    "{}: Result: {} ({} minted, {} failed)",
                    tag,
                    self.settings.chain.explorer_link(&address),
                    mints.succeeded(),
                    mints.failed()
                );

                CycleOutcome::Funded {
                    address,
                    amount,
                    mints,
                }
            }
            outcome => {
                if let Some(reason) = outcome.failure() {
                    info!("{}: not funded ({}), skipping mints", tag, reason);
                }
                CycleOutcome::Skipped { address, outcome }
            }
        };

        info!("{}", "-".repeat(100));
        Ok(result)
    }
}
