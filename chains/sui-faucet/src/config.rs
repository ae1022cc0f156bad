//! Configuration loader for the faucet farm
//!
//! Everything comes from the process environment (a `.env` file is loaded
//! first by the binary). Keys are the upper-case field names, e.g.
//! `FAUCET_THREADS=5`.

use anyhow::{Context, Result};
use config::{Config, Environment};
use core_logic::{ChainConfig, ConfigError};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// How the scheduler picks proxies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Rotate through the whole proxy list
    Static,
    /// Always the first proxy; its public IP changes on its own and the
    /// signal endpoint says how long to wait between cycles
    Dynamic { signal_url: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarmConfig {
    /// Dynamic-IP signal endpoint. Absent or empty means static mode.
    #[serde(default)]
    pub change_ip: Option<String>,
    /// Top-up calls per address
    #[serde(default = "default_faucet_threads")]
    pub faucet_threads: u32,
    #[serde(default = "default_faucet_url")]
    pub faucet_url: String,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    #[serde(default = "default_proxy_file")]
    pub proxy_file: String,
    #[serde(default = "default_mnemonic_file")]
    pub mnemonic_file: String,
    #[serde(default = "default_faucet_timeout_secs")]
    pub faucet_timeout_secs: u64,
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    #[serde(default = "default_max_rate_limit_wait_secs")]
    pub max_rate_limit_wait_secs: u64,
    /// Used when a 429 carries no usable retry-after header
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
    /// Minimum time a throttled proxy stays out of rotation
    #[serde(default = "default_proxy_cooldown_secs")]
    pub proxy_cooldown_secs: u64,
    #[serde(default = "default_cycle_error_pause_secs")]
    pub cycle_error_pause_secs: u64,
    #[serde(default = "default_dynamic_wait_secs")]
    pub dynamic_default_wait_secs: u64,
    #[serde(default = "default_mint_gas_budget")]
    pub mint_gas_budget: u64,
    /// Stop after this many cycles. Unbounded when absent.
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_faucet_threads() -> u32 {
    3
}

fn default_faucet_url() -> String {
    "https://faucet.testnet.sui.io/gas".to_string()
}

fn default_rpc_url() -> String {
    "https://fullnode.testnet.sui.io".to_string()
}

fn default_ip_echo_url() -> String {
    "https://api64.ipify.org?format=json".to_string()
}

fn default_explorer_url() -> String {
    "https://explorer.sui.io/addresses/{address}?network=testnet".to_string()
}

fn default_proxy_file() -> String {
    core_logic::ProxyPool::DEFAULT_FILE.to_string()
}

fn default_mnemonic_file() -> String {
    core_logic::SecretLog::DEFAULT_FILE.to_string()
}

fn default_faucet_timeout_secs() -> u64 {
    1200
}

fn default_max_rate_limit_retries() -> u32 {
    10
}

fn default_max_rate_limit_wait_secs() -> u64 {
    7200
}

fn default_retry_after_secs() -> u64 {
    60
}

fn default_proxy_cooldown_secs() -> u64 {
    3600
}

fn default_cycle_error_pause_secs() -> u64 {
    10
}

fn default_dynamic_wait_secs() -> u64 {
    10
}

fn default_mint_gas_budget() -> u64 {
    10000
}

impl FarmConfig {
    /// Loads from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    /// Loads from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_source(Environment::default().try_parsing(true).source(Some(vars)))
    }

    fn from_source(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read environment")?;

        let config: Self = settings
            .try_deserialize()
            .context("Failed to parse farm configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.faucet_threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "faucet_threads".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        for (field, value) in [
            ("faucet_url", &self.faucet_url),
            ("rpc_url", &self.rpc_url),
            ("ip_echo_url", &self.ip_echo_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::InvalidUrl {
                    field: field.to_string(),
                    url: value.clone(),
                });
            }
        }

        if let RunMode::Dynamic { signal_url } = self.run_mode() {
            if url::Url::parse(&signal_url).is_err() {
                return Err(ConfigError::InvalidUrl {
                    field: "change_ip".to_string(),
                    url: signal_url,
                });
            }
        }

        if !self.explorer_url.contains("{address}") {
            return Err(ConfigError::InvalidValue {
                field: "explorer_url".to_string(),
                reason: "must contain an {address} placeholder".to_string(),
            });
        }

        Ok(())
    }

    pub fn run_mode(&self) -> RunMode {
        match self.change_ip.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => RunMode::Dynamic {
                signal_url: url.to_string(),
            },
            _ => RunMode::Static,
        }
    }

    pub fn chain(&self) -> ChainConfig {
        ChainConfig {
            name: "sui-testnet".to_string(),
            rpc_endpoint: self.rpc_url.clone(),
            explorer_url: self.explorer_url.clone(),
        }
    }

    pub fn faucet_timeout(&self) -> Duration {
        Duration::from_secs(self.faucet_timeout_secs)
    }

    pub fn proxy_cooldown(&self) -> Duration {
        Duration::from_secs(self.proxy_cooldown_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = FarmConfig::from_vars(HashMap::new()).unwrap();

        assert_eq!(config.faucet_threads, 3);
        assert_eq!(config.faucet_timeout(), Duration::from_secs(1200));
        assert_eq!(config.proxy_file, "proxy.txt");
        assert_eq!(config.mnemonic_file, "mnemonic.txt");
        assert_eq!(config.run_mode(), RunMode::Static);
        assert_eq!(config.max_cycles, None);
    }

    #[test]
    fn test_change_ip_selects_dynamic_mode() {
        let config = FarmConfig::from_vars(vars(&[
            ("CHANGE_IP", "http://10.0.0.1:8000/changeip"),
            ("FAUCET_THREADS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.faucet_threads, 5);
        assert_eq!(
            config.run_mode(),
            RunMode::Dynamic {
                signal_url: "http://10.0.0.1:8000/changeip".to_string()
            }
        );
    }

    #[test]
    fn test_empty_change_ip_is_static() {
        let config = FarmConfig::from_vars(vars(&[("CHANGE_IP", "  ")])).unwrap();
        assert_eq!(config.run_mode(), RunMode::Static);
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(FarmConfig::from_vars(vars(&[("FAUCET_THREADS", "0")])).is_err());
    }

    #[test]
    fn test_bad_faucet_url_rejected() {
        let err = FarmConfig::from_vars(vars(&[("FAUCET_URL", "not a url")])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidUrl { .. })
        ));
    }
}
