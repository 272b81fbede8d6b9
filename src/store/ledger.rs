//! Mock-mode ledger: simulated wallets and transfers in SQLite

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;

use crate::domain::address::generate_placeholder_address;
use crate::domain::units::{format_units, UnitError, MOCK_DECIMALS};
use crate::domain::validate::{check_address, positive_amount, require, ValidationError};
use crate::domain::Direction;

/// Balance credited to a wallet when it is first created: 100 USDT
pub const DEFAULT_OPENING_BALANCE: i64 = 100_000_000;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no wallet for user '{0}'")]
    WalletNotFound(String),

    #[error("no wallet with address {0}")]
    RecipientNotFound(String),

    #[error("no transaction with id {0}")]
    TransactionNotFound(i64),

    #[error("insufficient balance: have {available} USDT, need {requested} USDT")]
    InsufficientBalance { available: String, requested: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Send,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised value '{0}'")]
pub struct UnknownVariant(String);

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Send => "send",
            TransactionType::Receive => "receive",
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(TransactionType::Send),
            "receive" => Ok(TransactionType::Receive),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's simulated wallet. Balance is in USDT base units (6 decimals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletRecord {
    pub user_id: String,
    pub address: String,
    pub balance: i64,
    #[serde(skip)]
    pub private_key: Option<String>,
}

impl WalletRecord {
    pub fn display_balance(&self) -> String {
        format_units(&self.balance.to_string(), MOCK_DECIMALS)
    }
}

/// A recorded transfer, seen from one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: String,
    pub amount: i64,
    pub sender_address: String,
    pub recipient_address: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub direction: Direction,
}

impl TransactionRecord {
    pub fn display_amount(&self) -> String {
        format!(
            "{}{}",
            self.direction.sign(),
            format_units(&self.amount.to_string(), MOCK_DECIMALS)
        )
    }

    pub fn counterparty(&self) -> &str {
        match self.direction {
            Direction::Received => &self.sender_address,
            Direction::Sent => &self.recipient_address,
        }
    }
}

/// A named address saved by a user. The address is free text so entries
/// for other chains fit too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed ledger holding the `wallets`, `transactions` and
/// `contacts` tables
#[derive(Debug)]
pub struct Ledger {
    conn: Connection,
    opening_balance: i64,
}

impl Ledger {
    /// Open or create the ledger database
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        let ledger = Self {
            conn,
            opening_balance: DEFAULT_OPENING_BALANCE,
        };
        ledger.init()?;
        Ok(ledger)
    }

    /// Balance, in base units, given to wallets created from now on
    pub fn with_opening_balance(mut self, units: i64) -> Self {
        self.opening_balance = units;
        self
    }

    fn init(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS wallets (
                user_id       TEXT PRIMARY KEY,
                walletaddress TEXT NOT NULL UNIQUE,
                balance       INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                private_key   TEXT
            );
            CREATE TABLE IF NOT EXISTS transactions (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id           TEXT NOT NULL,
                amount            INTEGER NOT NULL,
                recipient_address TEXT NOT NULL,
                sender_address    TEXT NOT NULL,
                transaction_type  TEXT NOT NULL,
                status            TEXT NOT NULL,
                created_at        TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS contacts (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    TEXT NOT NULL,
                name       TEXT NOT NULL,
                address    TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tx_sender ON transactions(sender_address);
            CREATE INDEX IF NOT EXISTS idx_tx_recipient ON transactions(recipient_address);
            CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id);",
        )?;
        Ok(())
    }

    // === Wallets ===

    pub fn wallet(&self, user_id: &str) -> Result<Option<WalletRecord>, LedgerError> {
        let user_id = require(user_id, "user id")?;
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, walletaddress, balance, private_key FROM wallets WHERE user_id = ?1",
                params![user_id],
                wallet_from_row,
            )
            .optional()?)
    }

    pub fn wallet_by_address(&self, address: &str) -> Result<Option<WalletRecord>, LedgerError> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, walletaddress, balance, private_key FROM wallets
                 WHERE walletaddress = lower(?1)",
                params![address.trim()],
                wallet_from_row,
            )
            .optional()?)
    }

    /// The user's wallet, created with a placeholder address and the
    /// opening balance on first access
    pub fn get_or_create_wallet(&self, user_id: &str) -> Result<WalletRecord, LedgerError> {
        let user_id = require(user_id, "user id")?;
        if let Some(wallet) = self.wallet(user_id)? {
            return Ok(wallet);
        }

        let address = generate_placeholder_address();
        self.conn.execute(
            "INSERT INTO wallets(user_id, walletaddress, balance) VALUES (?1, ?2, ?3)",
            params![user_id, address, self.opening_balance],
        )?;
        info!("created wallet {address} for user {user_id}");

        Ok(WalletRecord {
            user_id: user_id.to_string(),
            address,
            balance: self.opening_balance,
            private_key: None,
        })
    }

    // === Transfers ===

    /// Move `amount` USDT from the user's wallet to `recipient`.
    ///
    /// Debit, credit and the history row commit together or not at all.
    pub fn send(
        &mut self,
        user_id: &str,
        recipient: &str,
        amount: &str,
    ) -> Result<TransactionRecord, LedgerError> {
        let user_id = require(user_id, "user id")?;
        let recipient = require(recipient, "recipient address")?;
        let amount = require(amount, "amount")?;
        check_address(recipient)?;
        let amount = i64::try_from(positive_amount(amount, MOCK_DECIMALS)?)
            .map_err(|_| ValidationError::InvalidAmount(UnitError::Overflow))?;

        let sender = self
            .wallet(user_id)?
            .ok_or_else(|| LedgerError::WalletNotFound(user_id.to_string()))?;
        if sender.address.eq_ignore_ascii_case(recipient) {
            return Err(ValidationError::SelfTransfer.into());
        }
        if sender.balance < amount {
            return Err(insufficient(sender.balance, amount));
        }
        let receiver = self
            .wallet_by_address(recipient)?
            .ok_or_else(|| LedgerError::RecipientNotFound(recipient.to_string()))?;

        let created_at = Utc::now();
        let tx = self.conn.transaction()?;

        let debited = tx.execute(
            "UPDATE wallets SET balance = balance - ?1 WHERE user_id = ?2 AND balance >= ?1",
            params![amount, sender.user_id],
        )?;
        if debited == 0 {
            // balance moved since the check above; dropping tx rolls back
            let available = current_balance(&tx, &sender.user_id)?;
            return Err(insufficient(available, amount));
        }

        let credited = tx.execute(
            "UPDATE wallets SET balance = balance + ?1 WHERE user_id = ?2",
            params![amount, receiver.user_id],
        )?;
        if credited == 0 {
            return Err(LedgerError::RecipientNotFound(receiver.address));
        }

        tx.execute(
            "INSERT INTO transactions(user_id, amount, recipient_address, sender_address,
                                      transaction_type, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sender.user_id,
                amount,
                receiver.address,
                sender.address,
                TransactionType::Send.as_str(),
                TransactionStatus::Completed.as_str(),
                created_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "transferred {} USDT from {} to {}",
            format_units(&amount.to_string(), MOCK_DECIMALS),
            sender.address,
            receiver.address
        );

        Ok(TransactionRecord {
            id,
            user_id: sender.user_id,
            amount,
            sender_address: sender.address,
            recipient_address: receiver.address,
            transaction_type: TransactionType::Send,
            status: TransactionStatus::Completed,
            created_at,
            direction: Direction::Sent,
        })
    }

    /// Transfers in or out of the user's wallet, newest first
    pub fn transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let user_id = require(user_id, "user id")?;
        let wallet = self
            .wallet(user_id)?
            .ok_or_else(|| LedgerError::WalletNotFound(user_id.to_string()))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, sender_address, recipient_address,
                    transaction_type, status, created_at
             FROM transactions
             WHERE sender_address = ?1 OR recipient_address = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![wallet.address, limit], |row| {
            transaction_from_row(row, &wallet.address)
        })?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("loaded {} transactions for {}", records.len(), wallet.address);
        Ok(records)
    }

    /// Status is the only field of a recorded transfer that may change
    pub fn set_status(&self, id: i64, status: TransactionStatus) -> Result<(), LedgerError> {
        let updated = self.conn.execute(
            "UPDATE transactions SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(LedgerError::TransactionNotFound(id));
        }
        Ok(())
    }

    // === Address book ===

    /// Save a named address for the user. Duplicates are allowed.
    pub fn add_contact(
        &self,
        user_id: &str,
        name: &str,
        address: &str,
    ) -> Result<Contact, LedgerError> {
        let user_id = require(user_id, "user id")?;
        let name = require(name, "name")?;
        let address = require(address, "address")?;

        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO contacts(user_id, name, address, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, name, address, created_at.to_rfc3339()],
        )?;
        debug!("saved address '{name}' for user {user_id}");

        Ok(Contact {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            created_at,
        })
    }

    /// Saved addresses of the user in the order they were added
    pub fn contacts(&self, user_id: &str) -> Result<Vec<Contact>, LedgerError> {
        let user_id = require(user_id, "user id")?;
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, address, created_at
             FROM contacts WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], contact_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn insufficient(available: i64, requested: i64) -> LedgerError {
    LedgerError::InsufficientBalance {
        available: format_units(&available.to_string(), MOCK_DECIMALS),
        requested: format_units(&requested.to_string(), MOCK_DECIMALS),
    }
}

fn current_balance(conn: &Connection, user_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT balance FROM wallets WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<WalletRecord> {
    Ok(WalletRecord {
        user_id: row.get(0)?,
        address: row.get(1)?,
        balance: row.get(2)?,
        private_key: row.get(3)?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn transaction_from_row(row: &Row<'_>, viewer: &str) -> rusqlite::Result<TransactionRecord> {
    let recipient_address: String = row.get(4)?;
    let created_at = timestamp_column(row, 7)?;

    Ok(TransactionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        sender_address: row.get(3)?,
        direction: Direction::relative_to(viewer, Some(&recipient_address)),
        recipient_address,
        transaction_type: text_column(row, 5)?,
        status: text_column(row, 6)?,
        created_at,
    })
}

fn text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
