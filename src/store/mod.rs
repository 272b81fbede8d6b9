//! Local persistence

mod ledger;

pub use ledger::{
    Contact, Ledger, LedgerError, TransactionRecord, TransactionStatus, TransactionType, WalletRecord,
    DEFAULT_OPENING_BALANCE,
};
