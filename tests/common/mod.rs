//! In-memory chain used by the gateway tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, Result};

use testwallet::domain::NetworkConfig;
use testwallet::infrastructure::ethereum::{ChainClient, Connect, RawBlock, RawTransaction};

/// First default anvil account
pub const FUNDED_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const FUNDED_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct SentTransfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
}

#[derive(Debug, Default)]
pub struct ChainState {
    /// Indexed by block number
    pub blocks: Vec<RawBlock>,
    pub balances: HashMap<Address, U256>,
    pub gas_price: Option<u128>,
    pub send_error: Option<String>,
    pub sent: Vec<SentTransfer>,
    pub fetched_blocks: Vec<u64>,
    pub connections: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        let chain = Self::default();
        chain.state().gas_price = Some(1_000_000_000);
        chain
    }

    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn fund(&self, address: &str, wei: u128) {
        let address: Address = address.parse().unwrap();
        self.state().balances.insert(address, U256::from(wei));
    }

    /// Append a block holding `txs` as (from, to, wei)
    pub fn push_block(&self, txs: &[(&str, Option<&str>, u128)]) -> u64 {
        let mut state = self.state();
        let number = state.blocks.len() as u64;
        let transactions = txs
            .iter()
            .enumerate()
            .map(|(i, (from, to, value))| RawTransaction {
                hash: format!("0x{:062x}{:02x}", number, i),
                from: from.to_string(),
                to: to.map(str::to_string),
                value: U256::from(*value),
                gas: 21_000,
                nonce: i as u64,
                block_number: Some(number),
            })
            .collect();
        state.blocks.push(RawBlock {
            number,
            timestamp: 1_700_000_000 + number * 12,
            transactions,
        });
        number
    }

    pub fn connection_count(&self) -> usize {
        self.state().connections.len()
    }
}

#[async_trait::async_trait]
impl Connect for MockChain {
    async fn connect(&self, network: &NetworkConfig) -> Result<Box<dyn ChainClient>> {
        self.state().connections.push(network.rpc_url.clone());
        Ok(Box::new(self.clone()))
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn block_number(&self) -> Result<u64> {
        let state = self.state();
        state
            .blocks
            .len()
            .checked_sub(1)
            .map(|n| n as u64)
            .ok_or_else(|| anyhow!("no blocks"))
    }

    async fn get_block(&self, number: u64) -> Result<Option<RawBlock>> {
        let mut state = self.state();
        state.fetched_blocks.push(number);
        Ok(state.blocks.get(number as usize).cloned())
    }

    async fn get_transaction(&self, hash: B256) -> Result<Option<RawTransaction>> {
        let wanted = hash.to_string();
        let state = self.state();
        Ok(state
            .blocks
            .iter()
            .flat_map(|block| block.transactions.iter())
            .find(|tx| tx.hash.eq_ignore_ascii_case(&wanted))
            .cloned())
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self
            .state()
            .balances
            .get(&address)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.state()
            .gas_price
            .ok_or_else(|| anyhow!("eth_gasPrice not supported"))
    }

    async fn send_transfer(
        &self,
        signer: PrivateKeySigner,
        to: Address,
        value: U256,
        gas_limit: u64,
    ) -> Result<B256> {
        let mut state = self.state();
        if let Some(message) = state.send_error.clone() {
            return Err(anyhow!(message));
        }
        state.sent.push(SentTransfer {
            from: signer.address(),
            to,
            value,
            gas_limit,
        });
        Ok(B256::repeat_byte(0xab))
    }

    fn endpoint_name(&self) -> String {
        "mock".to_string()
    }
}
