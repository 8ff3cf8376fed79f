//! Chain discovery integration
//!
//! Queries the ChainRegistry on known EVM chains to discover all registered chains.
//! Runs on startup and periodically (every 4 hours) to detect newly registered chains.

use alloy::primitives::Address;
use eyre::Result;
use multichain_rs::discovery::{discover_chains, KnownChain};
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::config::Config;

/// Interval between discovery runs (4 hours)
const DISCOVERY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(4 * 60 * 60);

/// Run chain discovery on startup and every 4 hours until shutdown.
pub async fn run_discovery_task(config: &Config, mut shutdown: mpsc::Receiver<()>) -> Result<()> {
    let known_chains = build_known_chains(config)?;
    if known_chains.is_empty() {
        tracing::warn!("No EVM chains configured for discovery, skipping");
        return Ok(());
    }

    tracing::info!(
        chains = known_chains.len(),
        "Chain discovery starting (runs on startup and every 4 hours)"
    );

    // Run immediately on startup
    run_discovery_once(&known_chains).await;

    let mut interval = tokio::time::interval(DISCOVERY_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Chain discovery shutdown");
                break;
            }
            _ = interval.tick() => {
                run_discovery_once(&known_chains).await;
            }
        }
    }

    Ok(())
}

/// Build KnownChain list from operator config
pub(crate) fn build_known_chains(config: &Config) -> Result<Vec<KnownChain>> {
    let mut chains = Vec::new();

    // Primary EVM chain
    let bridge_addr = Address::from_str(&config.evm.bridge_address)
        .map_err(|e| eyre::eyre!("Invalid EVM_BRIDGE_ADDRESS: {}", e))?;
    chains.push(KnownChain {
        rpc_url: config.evm.rpc_url.clone(),
        bridge_address: bridge_addr,
        native_chain_id: config.evm.chain_id,
    });

    // Multi-EVM chains
    if let Some(ref multi) = config.multi_evm {
        for chain in multi.enabled_chains() {
            let bridge_addr = Address::from_str(&chain.bridge_address)
                .map_err(|e| eyre::eyre!("Invalid bridge_address for {}: {}", chain.name, e))?;
            chains.push(KnownChain {
                rpc_url: chain.rpc_url.clone(),
                bridge_address: bridge_addr,
                native_chain_id: chain.chain_id,
            });
        }
    }

    Ok(chains)
}

/// Run discovery once and log results
async fn run_discovery_once(known_chains: &[KnownChain]) {
    match discover_chains(known_chains).await {
        Ok(discovered) => {
            let chain_ids: Vec<String> = discovered.iter().map(|c| c.chain_id.to_hex()).collect();
            tracing::info!(
                count = discovered.len(),
                chain_ids = ?chain_ids,
                "Chain discovery complete"
            );
            for c in &discovered {
                tracing::debug!(
                    chain_id = %c.chain_id.to_hex(),
                    "Discovered chain"
                );
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Chain discovery failed");
        }
    }
}
