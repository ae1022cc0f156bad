//! # Core Logic - Shared Utilities for the Faucet Farm
//!
//! This crate provides the chain-agnostic pieces used by the chain crates:
//! proxy pool with throttling state, error taxonomy, retry helper, logger,
//! metrics and the append-only secret log.
//!
//! ## Modules
//!
//! - [`config`] - Proxy and chain configuration types
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Cycle, mint and faucet counters
//! - [`traits`] - Collaborator traits and task results
//! - [`utils`] - Proxy pool, retry, logger, secret log

pub mod config;
pub mod error;
pub mod metrics;
pub mod traits;
pub(crate) mod utils;

pub use config::{ChainConfig, ProxyConfig};
pub use error::{ConfigError, CoreError, NetworkError, ProxyError, WalletError};
pub use metrics::{CycleKind, MetricsCollector, MetricsSnapshot};
pub use traits::{SecretRecorder, TaskResult};

pub use utils::{
    setup_logger, Proxy, ProxyPool, ProxyStatus, SecretLog, CYCLE_RESULT_TARGET,
};

pub use utils::retry::{is_transient_error, with_retry, RetryConfig};
