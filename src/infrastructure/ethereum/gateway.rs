//! Chain gateway - network selection plus balance, transfer and history
//! access against the selected network's JSON-RPC endpoint

use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use chrono::DateTime;
use log::{debug, info, warn};
use serde::{Serialize, Serializer};

use crate::domain::address::signer_from_private_key;
use crate::domain::units::{format_units, NATIVE_DECIMALS};
use crate::domain::validate::{check_address, positive_amount, require, ValidationError};
use crate::domain::{
    ChainTransaction, Direction, NetworkConfig, NetworkKey, NetworkTable, UnknownNetwork,
};
use crate::infrastructure::ethereum::error::TransferError;
use crate::infrastructure::ethereum::provider::{
    ChainClient, Connect, HttpConnector, RawBlock, RawTransaction,
};

/// Gas limit of a plain native-currency transfer. Transfers to contracts
/// need more and will fail.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Matches returned by a history scan when the caller does not say
pub const DEFAULT_SCAN_LIMIT: usize = 10;

/// A broadcast transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub hash: String,
    pub explorer_url: String,
}

/// Result of a transfer attempt. Validation problems and chain failures
/// both land in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Submitted(TransferReceipt),
    Failed(TransferError),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Submitted(_))
    }

    pub fn receipt(&self) -> Option<&TransferReceipt> {
        match self {
            TransferOutcome::Submitted(receipt) => Some(receipt),
            TransferOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferOutcome::Submitted(_) => None,
            TransferOutcome::Failed(err) => Some(err),
        }
    }
}

impl Serialize for TransferOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            success: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            hash: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            block_explorer: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error_kind: Option<&'static str>,
        }

        let receipt = self.receipt();
        Wire {
            success: self.is_success(),
            hash: receipt.map(|r| r.hash.as_str()),
            block_explorer: receipt.map(|r| r.explorer_url.as_str()),
            error: self.error().map(|e| e.to_string()),
            error_kind: self.error().map(TransferError::kind),
        }
        .serialize(serializer)
    }
}

/// One transaction looked up by hash
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub nonce: u64,
    pub gas: u64,
    pub block_number: Option<u64>,
    pub explorer_url: String,
}

/// Access to one selectable network at a time.
///
/// The selection lives in this value, so separate gateways never see each
/// other's choice. A new gateway starts on the default network.
pub struct ChainGateway<C = HttpConnector> {
    networks: NetworkTable,
    current: NetworkKey,
    connector: C,
}

impl ChainGateway<HttpConnector> {
    pub fn new(networks: NetworkTable) -> Self {
        Self::with_connector(networks, HttpConnector)
    }
}

impl<C: Connect> ChainGateway<C> {
    pub fn with_connector(networks: NetworkTable, connector: C) -> Self {
        Self {
            networks,
            current: NetworkKey::default(),
            connector,
        }
    }

    /// Switch the current network by key name
    pub fn select_network(&mut self, key: &str) -> Result<&NetworkConfig, UnknownNetwork> {
        let key: NetworkKey = key.parse()?;
        Ok(self.select(key))
    }

    pub fn select(&mut self, key: NetworkKey) -> &NetworkConfig {
        self.current = key;
        let network = self.networks.get(key);
        info!("selected network {} ({})", network.name, network.rpc_url);
        network
    }

    pub fn current_network(&self) -> &NetworkConfig {
        self.networks.get(self.current)
    }

    pub fn available_networks(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter()
    }

    /// A new client for the current network. Nothing is cached between calls.
    pub async fn connection(&self) -> Result<Box<dyn ChainClient>> {
        let network = self.current_network();
        let client = self
            .connector
            .connect(network)
            .await
            .with_context(|| format!("connect to {}", network.name))?;
        debug!("new connection to {}", client.endpoint_name());
        Ok(client)
    }

    /// Native balance of `address` in display units
    pub async fn balance(&self, address: &str) -> Result<String> {
        let address = parse_address(address)?;
        let client = self.connection().await?;
        let balance = client
            .get_balance(address)
            .await
            .with_context(|| format!("fetch balance of {address}"))?;
        Ok(format_units(&balance.to_string(), NATIVE_DECIMALS))
    }

    /// Look up a transaction by hash
    pub async fn transaction(&self, hash: &str) -> Result<Option<TransactionDetails>> {
        let parsed: B256 = hash
            .trim()
            .parse()
            .with_context(|| format!("invalid transaction hash '{hash}'"))?;
        let client = self.connection().await?;
        let Some(tx) = client.get_transaction(parsed).await? else {
            return Ok(None);
        };
        let explorer_url = self.current_network().tx_url(&tx.hash);
        Ok(Some(TransactionDetails {
            value: format_units(&tx.value.to_string(), NATIVE_DECIMALS),
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            nonce: tx.nonce,
            gas: tx.gas,
            block_number: tx.block_number,
            explorer_url,
        }))
    }

    /// Sign and broadcast a native transfer of `amount` display units.
    ///
    /// Never returns `Err`: every failure, including bad input, is reported
    /// as `TransferOutcome::Failed`.
    pub async fn submit_transfer(
        &self,
        private_key: &str,
        to: &str,
        amount: &str,
    ) -> TransferOutcome {
        match self.try_transfer(private_key, to, amount).await {
            Ok(receipt) => {
                info!("transfer submitted: {}", receipt.hash);
                TransferOutcome::Submitted(receipt)
            }
            Err(err) => {
                warn!("transfer failed: {err}");
                TransferOutcome::Failed(err)
            }
        }
    }

    async fn try_transfer(
        &self,
        private_key: &str,
        to: &str,
        amount: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let private_key = require(private_key, "private key")?;
        let to = require(to, "recipient address")?;
        let amount = require(amount, "amount")?;

        check_address(to)?;
        let recipient: Address = to
            .parse()
            .map_err(|_| ValidationError::MalformedAddress(to.to_string()))?;
        let value = U256::from(positive_amount(amount, NATIVE_DECIMALS)?);
        let signer =
            signer_from_private_key(private_key).map_err(|_| TransferError::InvalidPrivateKey)?;

        let network = self.current_network();
        let client = self.connection().await.map_err(|e| TransferError::from_rpc(&e))?;

        let balance = client
            .get_balance(signer.address())
            .await
            .map_err(|e| TransferError::from_rpc(&e))?;
        if balance < value {
            return Err(TransferError::InsufficientBalance {
                balance: format_units(&balance.to_string(), NATIVE_DECIMALS),
                requested: format_units(&value.to_string(), NATIVE_DECIMALS),
                symbol: network.symbol.clone(),
            });
        }

        // informational only, the client's fillers price the transaction
        match client.gas_price().await {
            Ok(price) => debug!("gas price on {}: {} wei", network.name, price),
            Err(err) => debug!("fee data unavailable on {}: {err:#}", network.name),
        }

        let hash = client
            .send_transfer(signer, recipient, value, TRANSFER_GAS_LIMIT)
            .await
            .map_err(|e| TransferError::from_rpc(&e))?;
        let hash = hash.to_string();

        Ok(TransferReceipt {
            explorer_url: network.tx_url(&hash),
            hash,
        })
    }

    /// Transactions touching `address`, newest block first.
    ///
    /// Walks back from the head one block at a time until `limit` matches
    /// are found or genesis has been inspected. A quiet address costs a
    /// full history walk.
    pub async fn scan_recent_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<ChainTransaction>> {
        let address = address.trim();
        check_address(address).with_context(|| format!("invalid address '{address}'"))?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let client = self.connection().await?;
        let head = client.block_number().await.context("fetch chain head")?;
        debug!("scanning back from block {head} for {address} (limit {limit})");

        let mut found = Vec::new();
        let mut number = head;
        loop {
            if let Some(block) = client.get_block(number).await? {
                if collect_matches(block, address, limit, &mut found) {
                    debug!("scan complete at block {number}");
                    return Ok(found);
                }
            }
            if number == 0 {
                break;
            }
            number -= 1;
        }

        debug!("scan reached genesis with {} matches", found.len());
        Ok(found)
    }
}

/// Append matching transactions of one block; true once `limit` is reached
fn collect_matches(
    block: RawBlock,
    address: &str,
    limit: usize,
    found: &mut Vec<ChainTransaction>,
) -> bool {
    let RawBlock {
        number,
        timestamp,
        transactions,
    } = block;

    for tx in transactions {
        if !touches(&tx, address) {
            continue;
        }
        found.push(to_chain_transaction(tx, number, timestamp, address));
        if found.len() >= limit {
            return true;
        }
    }
    false
}

fn touches(tx: &RawTransaction, address: &str) -> bool {
    tx.from.eq_ignore_ascii_case(address)
        || tx
            .to
            .as_deref()
            .is_some_and(|to| to.eq_ignore_ascii_case(address))
}

fn to_chain_transaction(
    tx: RawTransaction,
    block_number: u64,
    timestamp: u64,
    viewer: &str,
) -> ChainTransaction {
    let direction = Direction::relative_to(viewer, tx.to.as_deref());
    let timestamp = i64::try_from(timestamp)
        .ok()
        .filter(|ts| *ts > 0)
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    ChainTransaction {
        value: format_units(&tx.value.to_string(), NATIVE_DECIMALS),
        hash: tx.hash,
        from: tx.from,
        to: tx.to,
        block_number,
        timestamp,
        direction,
    }
}

fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    check_address(address).with_context(|| format!("invalid address '{address}'"))?;
    address
        .parse()
        .with_context(|| format!("invalid address '{address}'"))
}
