//! JSON-RPC client abstraction and its alloy HTTP implementation
//!
//! Blocks and transactions are fetched with raw requests and parsed from
//! JSON so sidechains with non-standard transaction types still parse.

use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use reqwest::Url;

use crate::domain::NetworkConfig;

/// Block data parsed from JSON - works with any EVM chain
#[derive(Debug, Clone, Default)]
pub struct RawBlock {
    pub number: u64,
    pub timestamp: u64,
    pub transactions: Vec<RawTransaction>,
}

/// Transaction data parsed from JSON - chain agnostic
#[derive(Debug, Clone, Default)]
pub struct RawTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: U256,
    pub gas: u64,
    pub nonce: u64,
    /// `None` while the transaction is pending
    pub block_number: Option<u64>,
}

/// Operations the gateway needs from a JSON-RPC endpoint
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain head
    async fn block_number(&self) -> Result<u64>;

    /// Block by number with full transactions
    async fn get_block(&self, number: u64) -> Result<Option<RawBlock>>;

    /// Transaction by hash
    async fn get_transaction(&self, hash: B256) -> Result<Option<RawTransaction>>;

    /// Native balance in base units
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Current gas price in wei
    async fn gas_price(&self) -> Result<u128>;

    /// Sign and broadcast a plain value transfer, returning its hash
    async fn send_transfer(
        &self,
        signer: PrivateKeySigner,
        to: Address,
        value: U256,
        gas_limit: u64,
    ) -> Result<B256>;

    fn endpoint_name(&self) -> String;
}

/// Produces a fresh client for a network on every call
#[async_trait::async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, network: &NetworkConfig) -> Result<Box<dyn ChainClient>>;
}

/// Production connector: a new HTTP client per call, nothing pooled
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

#[async_trait::async_trait]
impl Connect for HttpConnector {
    async fn connect(&self, network: &NetworkConfig) -> Result<Box<dyn ChainClient>> {
        Ok(Box::new(AlloyClient::new(&network.rpc_url)?))
    }
}

type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// HTTP JSON-RPC client backed by an alloy provider
pub struct AlloyClient {
    provider: HttpFillProvider,
    url: Url,
}

impl AlloyClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url: Url = rpc_url
            .parse()
            .with_context(|| format!("invalid RPC URL {rpc_url}"))?;
        let provider = ProviderBuilder::new().connect_http(url.clone());
        Ok(Self { provider, url })
    }
}

#[async_trait::async_trait]
impl ChainClient for AlloyClient {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn get_block(&self, number: u64) -> Result<Option<RawBlock>> {
        let block_num_hex = format!("0x{:x}", number);
        let json: serde_json::Value = self
            .provider
            .raw_request("eth_getBlockByNumber".into(), (&block_num_hex, true))
            .await
            .with_context(|| format!("fetch block {number}"))?;

        if json.is_null() {
            return Ok(None);
        }
        Ok(Some(parse_raw_block(&json)?))
    }

    async fn get_transaction(&self, hash: B256) -> Result<Option<RawTransaction>> {
        let json: serde_json::Value = self
            .provider
            .raw_request("eth_getTransactionByHash".into(), (hash,))
            .await
            .with_context(|| format!("fetch transaction {hash}"))?;

        if json.is_null() {
            return Ok(None);
        }
        Ok(parse_raw_transaction(&json))
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn send_transfer(
        &self,
        signer: PrivateKeySigner,
        to: Address,
        value: U256,
        gas_limit: u64,
    ) -> Result<B256> {
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.url.clone());

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_value(value)
            .with_gas_limit(gas_limit);

        let pending = provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    fn endpoint_name(&self) -> String {
        self.url.to_string()
    }
}

/// Parse a raw `eth_getBlockByNumber` response
pub(crate) fn parse_raw_block(json: &serde_json::Value) -> Result<RawBlock> {
    let number = parse_hex_u64(json.get("number").and_then(|v| v.as_str()).unwrap_or("0x0"))?;
    let timestamp = parse_hex_u64(json.get("timestamp").and_then(|v| v.as_str()).unwrap_or("0x0"))?;

    let mut transactions = Vec::new();
    if let Some(txs) = json.get("transactions").and_then(|v| v.as_array()) {
        for tx_json in txs {
            // hash-only entries when the node ignored the full-tx flag
            if let Some(tx) = parse_raw_transaction(tx_json) {
                transactions.push(tx);
            }
        }
    }

    Ok(RawBlock {
        number,
        timestamp,
        transactions,
    })
}

/// Parse a single transaction object
pub(crate) fn parse_raw_transaction(json: &serde_json::Value) -> Option<RawTransaction> {
    let hash = json.get("hash")?.as_str()?.to_string();
    let from = json.get("from")?.as_str()?.to_string();
    let to = json.get("to").and_then(|v| v.as_str()).map(|s| s.to_string());

    let value_str = json.get("value").and_then(|v| v.as_str()).unwrap_or("0x0");
    let value = parse_hex_u256(value_str).unwrap_or(U256::ZERO);

    let gas = parse_hex_u64(json.get("gas").and_then(|v| v.as_str()).unwrap_or("0x0")).unwrap_or(0);
    let nonce = parse_hex_u64(json.get("nonce").and_then(|v| v.as_str()).unwrap_or("0x0")).unwrap_or(0);
    let block_number = json
        .get("blockNumber")
        .and_then(|v| v.as_str())
        .and_then(|s| parse_hex_u64(s).ok());

    Some(RawTransaction {
        hash,
        from,
        to,
        value,
        gas,
        nonce,
        block_number,
    })
}

fn parse_hex_u64(s: &str) -> Result<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).context("Failed to parse hex u64")
}

fn parse_hex_u256(s: &str) -> Result<U256> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(s, 16).context("Failed to parse hex U256")
}
