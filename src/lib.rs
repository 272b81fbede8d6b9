//! Testnet wallet toolkit
//!
//! Two independent tracks:
//! - mock mode: simulated USDT wallets and transfers in a local SQLite
//!   ledger ([`store::Ledger`])
//! - chain mode: balances, transfers and history on a public test network
//!   over JSON-RPC ([`infrastructure::ethereum::ChainGateway`])
//!
//! Balances of the two tracks are never reconciled.

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod store;
