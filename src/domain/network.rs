//! Predefined test networks and the lookup table built from them

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Key identifying one of the predefined networks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum NetworkKey {
    #[default]
    #[serde(rename = "ETHEREUM_GOERLI")]
    EthereumGoerli,
    #[serde(rename = "POLYGON_MUMBAI")]
    PolygonMumbai,
}

impl NetworkKey {
    pub const ALL: [NetworkKey; 2] = [NetworkKey::EthereumGoerli, NetworkKey::PolygonMumbai];

    fn index(self) -> usize {
        match self {
            NetworkKey::EthereumGoerli => 0,
            NetworkKey::PolygonMumbai => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKey::EthereumGoerli => "ETHEREUM_GOERLI",
            NetworkKey::PolygonMumbai => "POLYGON_MUMBAI",
        }
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network '{0}' (expected one of: ETHEREUM_GOERLI, POLYGON_MUMBAI)")]
pub struct UnknownNetwork(pub String);

impl FromStr for NetworkKey {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "ETHEREUM_GOERLI" | "GOERLI" => Ok(NetworkKey::EthereumGoerli),
            "POLYGON_MUMBAI" | "MUMBAI" => Ok(NetworkKey::PolygonMumbai),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// Connection and display details for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub key: NetworkKey,
    pub name: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub symbol: String,
    pub block_explorer: String,
}

impl NetworkConfig {
    /// Built-in configuration for a key
    pub fn predefined(key: NetworkKey) -> Self {
        match key {
            NetworkKey::EthereumGoerli => Self {
                key,
                name: "Ethereum Goerli".into(),
                rpc_url: "https://goerli.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161".into(),
                chain_id: 5,
                symbol: "ETH".into(),
                block_explorer: "https://goerli.etherscan.io".into(),
            },
            NetworkKey::PolygonMumbai => Self {
                key,
                name: "Polygon Mumbai".into(),
                rpc_url: "https://rpc-mumbai.maticvigil.com".into(),
                chain_id: 80001,
                symbol: "MATIC".into(),
                block_explorer: "https://mumbai.polygonscan.com".into(),
            },
        }
    }

    /// Explorer link for a transaction hash
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base(), hash)
    }

    /// Explorer link for an address
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_base(), address)
    }

    fn explorer_base(&self) -> &str {
        self.block_explorer.trim_end_matches('/')
    }
}

/// The fixed set of networks, with endpoint overrides applied
#[derive(Debug, Clone)]
pub struct NetworkTable {
    entries: [NetworkConfig; 2],
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self {
            entries: NetworkKey::ALL.map(NetworkConfig::predefined),
        }
    }
}

impl NetworkTable {
    pub fn get(&self, key: NetworkKey) -> &NetworkConfig {
        &self.entries[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.entries.iter()
    }

    /// Replace the endpoint URLs of a known network. Name, chain id and
    /// symbol stay fixed.
    pub fn override_endpoint(&mut self, key: NetworkKey, rpc: Option<&str>, explorer: Option<&str>) {
        let entry = &mut self.entries[key.index()];
        if let Some(rpc) = rpc.map(str::trim).filter(|s| !s.is_empty()) {
            entry.rpc_url = rpc.to_string();
        }
        if let Some(explorer) = explorer.map(str::trim).filter(|s| !s.is_empty()) {
            entry.block_explorer = explorer.to_string();
        }
    }
}
