//! Mint Sequencer
//!
//! Runs the launchpad mint and then every catalog NFT against a funded
//! identity, one at a time. A failed mint is logged and the sequence moves on.

use crate::account::AccountIdentity;
use crate::chain::{ChainClient, MoveCall};
use core_logic::{MetricsCollector, TaskResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

const DEVNET_NFT_PACKAGE: &str = "0x2";
const DEVNET_NFT_MODULE: &str = "devnet_nft";
const BLUEMOVE_PACKAGE: &str = "0x3c2468cdc0288983f099a52fc6f5b43e4ed0c959";
const BLUEMOVE_MODULE: &str = "bluemove_launchpad";
const DRAGON_COLLECTION: &str = "0x81e876200a657e173397f722aba3b6628c6d270";

/// A `devnet_nft::mint` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftMint {
    pub name: String,
    pub description: String,
    pub url: String,
}

impl NftMint {
    pub fn new(name: &str, description: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            url: url.to_string(),
        }
    }

    pub fn to_call(&self, gas_budget: u64) -> MoveCall {
        MoveCall {
            package: DEVNET_NFT_PACKAGE.to_string(),
            module: DEVNET_NFT_MODULE.to_string(),
            function: "mint".to_string(),
            type_arguments: Vec::new(),
            arguments: vec![
                Value::from(self.name.as_str()),
                Value::from(self.description.as_str()),
                Value::from(self.url.as_str()),
            ],
            gas_budget,
        }
    }
}

/// `mint_with_quantity` against a launchpad collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchpadMint {
    pub package: String,
    pub collection: String,
    pub quantity: u64,
}

impl LaunchpadMint {
    pub fn bluemove(collection: &str) -> Self {
        Self {
            package: BLUEMOVE_PACKAGE.to_string(),
            collection: collection.to_string(),
            quantity: 1,
        }
    }

    pub fn to_call(&self, gas_budget: u64) -> MoveCall {
        MoveCall {
            package: self.package.clone(),
            module: BLUEMOVE_MODULE.to_string(),
            function: "mint_with_quantity".to_string(),
            type_arguments: Vec::new(),
            arguments: vec![json!(self.collection), json!(self.quantity)],
            gas_budget,
        }
    }
}

/// Read-only set of mints every funded account goes through.
#[derive(Debug, Clone)]
pub struct MintCatalog {
    pub launchpad: LaunchpadMint,
    pub nfts: Vec<NftMint>,
    pub gas_budget: u64,
}

impl MintCatalog {
    pub fn default_catalog(gas_budget: u64) -> Self {
        Self {
            launchpad: LaunchpadMint::bluemove(DRAGON_COLLECTION),
            nfts: vec![
                NftMint::new(
                    "Example NFT",
                    "An NFT created by Sui Wallet",
                    "ipfs://QmZPWWy5Si54R3d26toaqRiqvCH7HkGdXkxwUgCm2oKKM2?filename=img-sq-01.png",
                ),
                NftMint::new(
                    "Example NFT",
                    "An NFT created by the wallet Command Line Tool",
                    "ipfs://bafkreibngqhl3gaa7daob4i2vccziay2jjlp435cf66vhono7nrvww53ty",
                ),
                NftMint::new(
                    "Wizard Land",
                    "Expanding The Magic Land",
                    "https://gateway.pinata.cloud/ipfs/QmYfw8RbtdjPAF3LrC6S3wGVwWgn6QKq4LGS4HFS55adU2?w=800&h=450&c=crop",
                ),
                NftMint::new(
                    "Ethos 2048 Game",
                    "This player has unlocked the 2048 tile on Ethos 2048. They are a Winner!",
                    "https://arweave.net/QW9doLmmWdQ-7t8GZ85HtY8yzutoir8lGEJP9zOPQqA",
                ),
            ],
            gas_budget,
        }
    }

    /// Launchpad first, then the NFTs in catalog order.
    pub fn jobs(&self) -> Vec<(String, MoveCall)> {
        let mut jobs = Vec::with_capacity(self.nfts.len() + 1);
        jobs.push((
            format!("Bluemove {}", self.launchpad.collection),
            self.launchpad.to_call(self.gas_budget),
        ));
        for nft in &self.nfts {
            jobs.push((nft.name.clone(), nft.to_call(self.gas_budget)));
        }
        jobs
    }
}

#[derive(Debug, Clone, Default)]
pub struct MintReport {
    /// `(mint name, result)` in execution order
    pub results: Vec<(String, TaskResult)>,
}

impl MintReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

pub struct MintSequencer {
    chain: Arc<dyn ChainClient>,
    catalog: Arc<MintCatalog>,
    metrics: Arc<MetricsCollector>,
}

impl MintSequencer {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        catalog: Arc<MintCatalog>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            chain,
            catalog,
            metrics,
        }
    }

    pub async fn run(&self, identity: &AccountIdentity) -> MintReport {
        let tag = identity.short_tag();
        let mut report = MintReport::default();

        for (name, call) in self.catalog.jobs() {
            info!("{}: Minting: {}", tag, name);

            let result = match self.chain.execute_move_call(identity, &call).await {
                Ok(digest) => {
                    info!("{}: {} SUCCESS ({})", tag, name, digest);
                    TaskResult::ok(format!("{} minted", name), Some(digest))
                }
                Err(e) => {
                    warn!("{}: {} FAILED: {:#}", tag, name, e);
                    TaskResult::failed(format!("{}: {:#}", name, e))
                }
            };

            self.metrics.record_mint(result.success);
            report.results.push((name, result));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountFactory;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls; fails any call whose function matches `fail_function`.
    struct ScriptedChain {
        calls: Mutex<Vec<MoveCall>>,
        fail_function: Option<&'static str>,
    }

    #[async_trait]
    impl ChainClient for ScriptedChain {
        async fn execute_move_call(&self, _: &AccountIdentity, call: &MoveCall) -> Result<String> {
            self.calls.lock().unwrap().push(call.clone());
            if self.fail_function == Some(call.function.as_str()) {
                bail!("insufficient gas");
            }
            Ok(format!("digest-{}", self.calls.lock().unwrap().len()))
        }
    }

    fn sequencer(fail_function: Option<&'static str>) -> (Arc<ScriptedChain>, MintSequencer) {
        let chain = Arc::new(ScriptedChain {
            calls: Mutex::new(Vec::new()),
            fail_function,
        });
        let sequencer = MintSequencer::new(
            chain.clone(),
            Arc::new(MintCatalog::default_catalog(10000)),
            Arc::new(MetricsCollector::default()),
        );
        (chain, sequencer)
    }

    #[test]
    fn test_default_catalog_order() {
        let jobs = MintCatalog::default_catalog(10000).jobs();
        assert_eq!(jobs.len(), 5);
        assert_eq!(jobs[0].1.function, "mint_with_quantity");
        assert_eq!(jobs[0].1.arguments[1], json!(1));
        assert!(jobs[1..].iter().all(|(_, call)| call.module == "devnet_nft"));
        assert_eq!(jobs[3].0, "Wizard Land");
        assert!(jobs.iter().all(|(_, call)| call.gas_budget == 10000));
    }

    #[tokio::test]
    async fn test_runs_every_mint_in_order() {
        let (chain, sequencer) = sequencer(None);
        let identity = AccountFactory::default().create().unwrap();

        let report = sequencer.run(&identity).await;

        assert_eq!(report.succeeded(), 5);
        let calls = chain.calls.lock().unwrap();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0].module, "bluemove_launchpad");
        assert_eq!(calls[4].arguments[0], json!("Ethos 2048 Game"));
    }

    #[tokio::test]
    async fn test_launchpad_failure_does_not_stop_catalog() {
        let (chain, sequencer) = sequencer(Some("mint_with_quantity"));
        let identity = AccountFactory::default().create().unwrap();

        let report = sequencer.run(&identity).await;

        assert_eq!(chain.calls.lock().unwrap().len(), 5);
        assert_eq!(report.failed(), 1);
        assert!(!report.results[0].1.success);
        assert_eq!(report.succeeded(), 4);
    }
}
