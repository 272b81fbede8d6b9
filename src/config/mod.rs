use std::fs;
use std::path::PathBuf;

use log::warn;
use serde::Deserialize;

use crate::domain::units::{parse_units, MOCK_DECIMALS};
use crate::domain::{NetworkKey, NetworkTable};
use crate::infrastructure::ethereum::DEFAULT_SCAN_LIMIT;
use crate::store::DEFAULT_OPENING_BALANCE;

/// Endpoint override for one of the predefined networks
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkOverride {
    pub key: String,
    pub rpc: Option<String>,
    pub explorer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub default_network: Option<String>,

    /// Ledger database path
    pub database: Option<PathBuf>,

    /// Opening balance of new mock wallets, in USDT
    pub opening_balance: Option<String>,

    pub scan_limit: Option<usize>,

    #[serde(default)]
    pub networks: Vec<NetworkOverride>,
}

impl Config {
    /// Predefined networks with this file's endpoint overrides applied
    pub fn network_table(&self) -> NetworkTable {
        let mut table = NetworkTable::default();
        for entry in &self.networks {
            match entry.key.parse::<NetworkKey>() {
                Ok(key) => {
                    table.override_endpoint(key, entry.rpc.as_deref(), entry.explorer.as_deref())
                }
                Err(err) => warn!("ignoring network override: {err}"),
            }
        }
        table
    }

    pub fn default_network(&self) -> NetworkKey {
        match self.default_network.as_deref().map(str::parse::<NetworkKey>) {
            Some(Ok(key)) => key,
            Some(Err(err)) => {
                warn!("ignoring default_network: {err}");
                NetworkKey::default()
            }
            None => NetworkKey::default(),
        }
    }

    /// Opening balance in USDT base units
    pub fn opening_balance(&self) -> i64 {
        let Some(raw) = self.opening_balance.as_deref() else {
            return DEFAULT_OPENING_BALANCE;
        };
        match parse_units(raw, MOCK_DECIMALS).map(i64::try_from) {
            Ok(Ok(units)) => units,
            _ => {
                warn!("ignoring opening_balance '{raw}'");
                DEFAULT_OPENING_BALANCE
            }
        }
    }

    pub fn scan_limit(&self) -> usize {
        self.scan_limit.unwrap_or(DEFAULT_SCAN_LIMIT)
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.clone().or_else(ledger_db_path)
    }
}

/// Load the config file, falling back to defaults when it is missing or
/// does not parse
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    parse(&content).unwrap_or_else(|err| {
        warn!("ignoring {}: {err}", path.display());
        Config::default()
    })
}

pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TESTWALLET_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("testwallet").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("testwallet").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "testwallet", "testwallet")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("testwallet"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("testwallet"));
    }
    directories::ProjectDirs::from("io", "testwallet", "testwallet")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn ledger_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("ledger.sqlite3"))
}
