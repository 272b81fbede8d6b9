//! Transaction views shared by the mock ledger and the chain scanner

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Direction of a transfer relative to the wallet viewing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    /// `Received` iff the recipient is the viewer (case-insensitive)
    pub fn relative_to(viewer: &str, recipient: Option<&str>) -> Self {
        match recipient {
            Some(to) if to.eq_ignore_ascii_case(viewer) => Direction::Received,
            _ => Direction::Sent,
        }
    }

    pub fn sign(&self) -> char {
        match self {
            Direction::Sent => '-',
            Direction::Received => '+',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => f.write_str("Sent"),
            Direction::Received => f.write_str("Received"),
        }
    }
}

/// A transaction found on chain that touches the viewing address
#[derive(Debug, Clone, Serialize)]
pub struct ChainTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    /// Value in display units of the network's native currency
    pub value: String,
    pub block_number: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub direction: Direction,
}

impl ChainTransaction {
    /// Signed amount, e.g. "+0.5" or "-1"
    pub fn display_amount(&self) -> String {
        format!("{}{}", self.direction.sign(), self.value)
    }

    /// The other side of the transfer from the viewer's perspective
    pub fn counterparty(&self) -> Option<&str> {
        match self.direction {
            Direction::Received => Some(self.from.as_str()),
            Direction::Sent => self.to.as_deref(),
        }
    }
}
