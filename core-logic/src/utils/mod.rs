//! # Utilities Module
//!
//! Proxy pool, retry helper, logger and the append-only secret log.

pub(crate) mod logger;
pub(crate) mod proxy_manager;
pub(crate) mod retry;
pub(crate) mod secret_log;

pub use logger::{setup_logger, CYCLE_RESULT_TARGET};
pub use proxy_manager::{Proxy, ProxyPool, ProxyStatus};
pub use secret_log::SecretLog;
