//! Infrastructure layer - External service integrations
//!
//! This layer contains the alloy-based JSON-RPC client and the chain
//! gateway built on top of it.

pub mod ethereum;

pub use ethereum::{ChainGateway, TransferError, TransferOutcome};
