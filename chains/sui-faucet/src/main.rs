use anyhow::{Context, Result};
use core_logic::{setup_logger, MetricsCollector, ProxyError, ProxyPool, SecretLog};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use sui_faucet::{
    CycleScheduler, FaucetClient, FaucetSettings, FarmConfig, HttpFaucetTransport,
    HttpIpSignal, MintCatalog, MintSequencer, RunMode, SchedulerSettings, SuiRpcClient,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // Held until exit so the file writer flushes
    let _log_guard = setup_logger();

    let config = match FarmConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            return Ok(());
        }
    };

    let pool = match ProxyPool::load_file(&config.proxy_file) {
        Ok(pool) => pool.with_cooldown(config.proxy_cooldown()),
        Err(ProxyError::PoolExhausted { .. }) => {
            error!("No working proxy found, please make sure the proxy is in the correct format");
            return Ok(());
        }
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };
    let pool = Arc::new(pool);

    let metrics = Arc::new(MetricsCollector::default());

    let transport = Arc::new(HttpFaucetTransport::new(
        config.faucet_url.clone(),
        config.faucet_timeout(),
    ));
    let faucet = FaucetClient::new(
        transport,
        FaucetSettings {
            top_up_calls: config.faucet_threads,
            max_rate_limit_retries: config.max_rate_limit_retries,
            max_rate_limit_wait: Duration::from_secs(config.max_rate_limit_wait_secs),
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
        },
        metrics.clone(),
    );

    let chain_config = config.chain();
    info!("Farming on {} via {}", chain_config.name, chain_config.rpc_endpoint);
    let chain = Arc::new(
        SuiRpcClient::new(chain_config.rpc_endpoint.clone(), Duration::from_secs(60))
            .context("Failed to set up RPC client")?,
    );
    let minter = MintSequencer::new(
        chain,
        Arc::new(MintCatalog::default_catalog(config.mint_gas_budget)),
        metrics.clone(),
    );

    let recorder = Arc::new(SecretLog::new(&config.mnemonic_file));

    let mut scheduler = CycleScheduler::new(
        pool,
        faucet,
        minter,
        recorder,
        metrics,
        SchedulerSettings {
            error_pause: Duration::from_secs(config.cycle_error_pause_secs),
            max_cycles: config.max_cycles,
            chain: chain_config,
        },
    );

    let mode = config.run_mode();
    if let RunMode::Dynamic { signal_url } = &mode {
        info!("Dynamic IP mode, signal: {}", signal_url);
        let signal = HttpIpSignal::new(
            signal_url.clone(),
            config.ip_echo_url.clone(),
            config.dynamic_default_wait_secs,
        )?;
        scheduler = scheduler.with_signal(Arc::new(signal));
    } else {
        info!("Static proxy mode");
    }

    scheduler.run(&mode).await?;
    Ok(())
}
