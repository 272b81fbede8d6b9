//! Domain layer - pure types and rules with no I/O

pub mod address;
pub mod network;
pub mod transaction;
pub mod units;
pub mod validate;

pub use address::{generate_key_pair, generate_placeholder_address, KeyPair};
pub use network::{NetworkConfig, NetworkKey, NetworkTable, UnknownNetwork};
pub use transaction::{ChainTransaction, Direction};
pub use validate::ValidationError;
