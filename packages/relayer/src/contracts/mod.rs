//! Contract ABI and message definitions for interacting with bridge contracts

pub mod evm_bridge;
pub mod terra_bridge;

pub use evm_bridge::CL8YBridge;
