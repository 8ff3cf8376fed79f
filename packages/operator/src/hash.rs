//! Hash computation for cross-chain transfer IDs
//!
//! Re-exports hash functions from multichain-rs.

// Re-export everything from multichain-rs
pub use multichain_rs::hash::*;
