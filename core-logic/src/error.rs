//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Proxy(ProxyError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Network(NetworkError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<ProxyError> for CoreError {
    fn from(e: ProxyError) -> Self {
        CoreError::Proxy(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid URL format for '{field}': '{url}'")]
    InvalidUrl { field: String, url: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Proxy list and proxy pool errors
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    /// A line that does not look like `IP:PORT@USER:PASS`. Skipped by the loader.
    #[error("Invalid proxy line: '{line}'")]
    InvalidFormat { line: String },

    #[error("No usable proxy found in {source_name}, expected lines like IP:PORT@USER:PASS")]
    PoolExhausted { source_name: String },

    #[error("Proxy not found at index {index} (total proxies: {total})")]
    NotFound { index: usize, total: usize },

    #[error("I/O error reading {path}: {msg}")]
    Io { path: String, msg: String },

    #[error("Proxy line pattern failed to compile: {reason}")]
    Pattern { reason: String },
}

/// Wallet generation and secret persistence errors
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("Invalid mnemonic phrase: {reason}")]
    InvalidMnemonic { reason: String },

    #[error("Key derivation failed at '{path}': {reason}")]
    DerivationFailed { path: String, reason: String },

    #[error("Failed to append secret record to {path}: {msg}")]
    RecordWrite { path: String, msg: String },
}

/// Network, faucet and RPC-related errors
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Request timeout after {timeout_ms}ms to {endpoint}")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("Rate limited by {endpoint}: retry after {retry_after}s")]
    RateLimited { endpoint: String, retry_after: u64 },

    #[error("Connection refused to {endpoint}: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_names_wait() {
        let limited = NetworkError::RateLimited {
            endpoint: "faucet".to_string(),
            retry_after: 5,
        };
        assert_eq!(limited.to_string(), "Rate limited by faucet: retry after 5s");
    }

    #[test]
    fn test_core_error_wraps_proxy_error() {
        let err: CoreError = ProxyError::PoolExhausted {
            source_name: "proxy.txt".to_string(),
        }
        .into();

        assert!(matches!(err, CoreError::Proxy(ProxyError::PoolExhausted { .. })));
        assert!(err.to_string().contains("proxy.txt"));
    }
}
