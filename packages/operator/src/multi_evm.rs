//! Multi-EVM Chain Configuration
//!
//! Re-exports shared multi-EVM types from `multichain_rs::multi_evm` and adds
//! operator-specific extensions (e.g., converting to operator `EvmConfig`).

#![allow(dead_code)]

// Re-export shared types
pub use multichain_rs::multi_evm::{load_from_env, EvmChainConfig, MultiEvmConfig};

/// Extension trait for operator-specific functionality on `EvmChainConfig`.
pub trait EvmChainConfigExt {
    /// Convert to the operator's `EvmConfig` format.
    ///
    /// Requires the shared private key from `MultiEvmConfig` since
    /// individual chain configs don't store it.
    fn to_operator_evm_config(&self, private_key: &str) -> crate::config::EvmConfig;
}

impl EvmChainConfigExt for EvmChainConfig {
    fn to_operator_evm_config(&self, private_key: &str) -> crate::config::EvmConfig {
        crate::config::EvmConfig {
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id,
            bridge_address: self.bridge_address.clone(),
            private_key: private_key.to_string(),
            finality_blocks: self.finality_blocks,
            this_chain_id: Some(self.this_chain_id.to_u32()),
            use_v2_events: Some(true),
        }
    }
}
