//! Command handlers: run one operation and report it to the user

use std::fs;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::config::Config;
use crate::domain::{generate_key_pair, generate_placeholder_address, Direction};
use crate::infrastructure::ethereum::{ChainGateway, Connect, HttpConnector, TransferOutcome};
use crate::store::{Contact, Ledger, TransactionRecord};

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
}

pub struct App<C = HttpConnector> {
    pub gateway: ChainGateway<C>,
    config: Config,
    output: Output,
}

impl App<HttpConnector> {
    pub fn new(config: Config, output: Output) -> Self {
        let gateway = ChainGateway::new(config.network_table());
        Self::with_gateway(config, gateway, output)
    }
}

impl<C: Connect> App<C> {
    pub fn with_gateway(config: Config, mut gateway: ChainGateway<C>, output: Output) -> Self {
        gateway.select(config.default_network());
        Self {
            gateway,
            config,
            output,
        }
    }

    pub fn select_network(&mut self, key: &str) -> Result<()> {
        self.gateway.select_network(key)?;
        Ok(())
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        match self.output {
            Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Output::Human => human(),
        }
        Ok(())
    }

    // === Address / keys ===

    pub fn placeholder_address(&self) -> Result<()> {
        let address = generate_placeholder_address();
        self.emit(&json!({ "address": address }), || println!("{address}"))
    }

    pub fn keygen(&self) -> Result<()> {
        let pair = generate_key_pair();
        self.emit(&pair, || {
            println!("address:     {}", pair.address);
            println!("private key: {}", pair.private_key);
            println!("Keep the private key secret; anyone holding it controls the funds.");
        })
    }

    // === Chain mode ===

    pub fn networks(&self) -> Result<()> {
        let current = self.gateway.current_network().key;
        let networks: Vec<_> = self.gateway.available_networks().collect();
        self.emit(&json!({ "current": current, "networks": networks }), || {
            for network in &networks {
                let marker = if network.key == current { "*" } else { " " };
                println!(
                    "{marker} {:<16} {:<16} chain {:<6} {:<6} {}",
                    network.key.as_str(),
                    network.name,
                    network.chain_id,
                    network.symbol,
                    network.rpc_url
                );
            }
        })
    }

    pub async fn balance(&self, address: &str) -> Result<()> {
        let balance = self.gateway.balance(address).await?;
        let network = self.gateway.current_network();
        self.emit(
            &json!({ "address": address, "balance": balance, "symbol": network.symbol }),
            || println!("{balance} {}", network.symbol),
        )
    }

    pub async fn send(&self, private_key: &str, to: &str, amount: &str) -> Result<()> {
        let outcome = self.gateway.submit_transfer(private_key, to, amount).await;
        self.emit(&outcome, || match &outcome {
            TransferOutcome::Submitted(receipt) => {
                println!("Transaction sent: {}", receipt.hash);
                println!("View on explorer: {}", receipt.explorer_url);
            }
            TransferOutcome::Failed(_) => {}
        })?;
        if let TransferOutcome::Failed(err) = outcome {
            bail!("transaction failed: {err}");
        }
        Ok(())
    }

    pub async fn history(&self, address: &str, limit: Option<usize>) -> Result<()> {
        let limit = limit.unwrap_or_else(|| self.config.scan_limit());
        let txs = self.gateway.scan_recent_transactions(address, limit).await?;
        let network = self.gateway.current_network();
        self.emit(&txs, || {
            if txs.is_empty() {
                println!("No transactions yet");
            }
            for tx in &txs {
                let when = tx
                    .timestamp
                    .map(|ts| ts.to_rfc3339())
                    .unwrap_or_else(|| "Unknown date".to_string());
                let prefix = match tx.direction {
                    Direction::Received => "From",
                    Direction::Sent => "To",
                };
                println!(
                    "{:<8} {} {}  block {}  {}",
                    tx.direction.to_string(),
                    tx.display_amount(),
                    network.symbol,
                    tx.block_number,
                    when
                );
                println!("         {prefix}: {}", tx.counterparty().unwrap_or("(contract creation)"));
                println!("         {}", network.tx_url(&tx.hash));
            }
        })
    }

    pub async fn transaction(&self, hash: &str) -> Result<()> {
        let Some(tx) = self.gateway.transaction(hash).await? else {
            bail!("transaction {hash} not found on {}", self.gateway.current_network().name);
        };
        let symbol = &self.gateway.current_network().symbol;
        self.emit(&tx, || {
            println!("hash:   {}", tx.hash);
            println!("from:   {}", tx.from);
            println!("to:     {}", tx.to.as_deref().unwrap_or("(contract creation)"));
            println!("value:  {} {symbol}", tx.value);
            match tx.block_number {
                Some(block) => println!("block:  {block}"),
                None => println!("block:  pending"),
            }
            println!("nonce:  {}", tx.nonce);
            println!("gas:    {}", tx.gas);
            println!("{}", tx.explorer_url);
        })
    }

    // === Mock mode ===

    pub fn open_ledger(&self) -> Result<Ledger> {
        let path = self
            .config
            .database_path()
            .context("cannot determine a data directory for the ledger database")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        Ok(Ledger::open(&path)?.with_opening_balance(self.config.opening_balance()))
    }

    pub fn wallet_show(&self, ledger: &Ledger, user_id: &str) -> Result<()> {
        let wallet = ledger.get_or_create_wallet(user_id)?;
        self.emit(
            &json!({
                "user_id": wallet.user_id,
                "address": wallet.address,
                "balance": wallet.display_balance(),
                "symbol": "USDT",
            }),
            || {
                println!("address: {}", wallet.address);
                println!("balance: {} USDT", wallet.display_balance());
            },
        )
    }

    pub fn wallet_receive(&self, ledger: &Ledger, user_id: &str) -> Result<()> {
        let wallet = ledger.get_or_create_wallet(user_id)?;
        self.emit(&json!({ "address": wallet.address }), || {
            println!("Share this address to receive USDT:");
            println!("{}", wallet.address);
        })
    }

    pub fn wallet_send(
        &self,
        ledger: &mut Ledger,
        user_id: &str,
        to: &str,
        amount: &str,
    ) -> Result<()> {
        ledger.get_or_create_wallet(user_id)?;
        let record = ledger.send(user_id, to, amount)?;
        self.emit(&record, || {
            println!(
                "Sent {} USDT to {} ({})",
                record.display_amount().trim_start_matches('-'),
                record.recipient_address,
                record.status
            );
        })
    }

    pub fn wallet_history(&self, ledger: &Ledger, user_id: &str, limit: usize) -> Result<()> {
        ledger.get_or_create_wallet(user_id)?;
        let records = ledger.transactions(user_id, limit)?;
        self.emit(&records, || print_ledger_history(&records))
    }

    pub fn contact_add(
        &self,
        ledger: &Ledger,
        user_id: &str,
        name: &str,
        address: &str,
    ) -> Result<()> {
        let contact = ledger.add_contact(user_id, name, address)?;
        self.emit(&contact, || {
            println!("Saved {} as '{}'", contact.address, contact.name)
        })
    }

    pub fn contact_list(&self, ledger: &Ledger, user_id: &str) -> Result<()> {
        let contacts = ledger.contacts(user_id)?;
        self.emit(&contacts, || print_contacts(&contacts))
    }
}

fn print_contacts(contacts: &[Contact]) {
    if contacts.is_empty() {
        println!("No addresses added yet");
    }
    for contact in contacts {
        println!("{}", contact.name);
        println!("  {}", contact.address);
    }
}

fn print_ledger_history(records: &[TransactionRecord]) {
    if records.is_empty() {
        println!("No transactions yet");
    }
    for record in records {
        let prefix = match record.direction {
            Direction::Received => "From",
            Direction::Sent => "To",
        };
        println!(
            "{:<8} {} USDT  {}  {}",
            record.direction.to_string(),
            record.display_amount(),
            record.status,
            record.created_at.to_rfc3339()
        );
        println!("         {prefix}: {}", record.counterparty());
    }
}
