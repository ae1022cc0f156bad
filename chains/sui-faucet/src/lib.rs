//! Sui Faucet Farm - bulk testnet accounts funded through rotating proxies
//!
//! Each cycle generates a fresh Sui account, tops it up from the public
//! faucet through one proxy, records the seed phrase and mints a fixed set of
//! NFTs with it.
//!
//! # Architecture
//!
//! - **[`CycleScheduler`]**: the control loop, static (rotate the pool) or
//!   dynamic (single proxy with a rotating exit IP)
//! - **[`FaucetClient`]**: faucet requests with the per-proxy 429 wait-and-resend
//!   loop, over a [`FaucetTransport`]
//! - **[`AccountFactory`]**: BIP-39 phrase and Ed25519 key at Sui's derivation path
//! - **[`MintSequencer`]**: launchpad mint then the [`MintCatalog`] NFTs, each
//!   isolated from the others
//! - **[`SuiRpcClient`]**: JSON-RPC [`ChainClient`] used by the mints
//!
//! # Configuration
//!
//! Environment variables (or `.env`), see [`FarmConfig`]. Setting `CHANGE_IP`
//! switches to dynamic mode.
//!
//! ```bash
//! FAUCET_THREADS=3 cargo run -p sui-faucet
//! ```

pub mod account;
pub mod chain;
pub mod config;
pub mod faucet;
pub mod http;
pub mod mint;
pub mod scheduler;
pub mod signal;

pub use account::{AccountFactory, AccountIdentity};
pub use chain::{ChainClient, MoveCall, SuiRpcClient};
pub use config::{FarmConfig, RunMode};
pub use faucet::{
    FaucetClient, FaucetOutcome, FaucetReply, FaucetSettings, FaucetTransport,
    HttpFaucetTransport,
};
pub use mint::{LaunchpadMint, MintCatalog, MintReport, MintSequencer, NftMint};
pub use scheduler::{CycleOutcome, CycleScheduler, HaltReason, RunSummary, SchedulerSettings};
pub use signal::{DynamicIpSignal, HttpIpSignal};
