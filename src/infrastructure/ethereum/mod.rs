//! Ethereum infrastructure - JSON-RPC client and the chain gateway

mod error;
mod gateway;
mod provider;

pub use error::TransferError;
pub use gateway::{
    ChainGateway, TransactionDetails, TransferOutcome, TransferReceipt, DEFAULT_SCAN_LIMIT,
    TRANSFER_GAS_LIMIT,
};
pub use provider::{
    AlloyClient, ChainClient, Connect, HttpConnector, RawBlock, RawTransaction,
};
