//! Hash computation for verification
//!
//! Re-exports hash functions from multichain-rs for consistency.

// Re-export everything from multichain-rs
pub use multichain_rs::hash::*;
