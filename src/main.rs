use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use testwallet::app::{App, Output};
use testwallet::config;

#[derive(Debug, Parser)]
#[command(
    name = "testwallet",
    version,
    about = "Testnet wallet: mock USDT ledger and real testnet transfers"
)]
struct Args {
    /// Network to use (ETHEREUM_GOERLI or POLYGON_MUMBAI)
    #[arg(long, global = true)]
    network: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available networks
    Networks,
    /// Print a random placeholder address (not backed by a key)
    Address,
    /// Generate a new key pair
    Keygen,
    /// Native balance of an address
    Balance { address: String },
    /// Send native currency on the selected network
    Send {
        /// Sender private key (hex)
        #[arg(long)]
        key: String,
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Amount in the network's native currency
        #[arg(long)]
        amount: String,
    },
    /// Recent transactions touching an address
    History {
        address: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Look up a transaction by hash
    Tx { hash: String },
    /// Mock-mode wallet backed by the local ledger
    Wallet {
        /// User the wallet belongs to
        #[arg(long)]
        user: String,
        #[command(subcommand)]
        command: WalletCommand,
    },
}

#[derive(Debug, Subcommand)]
enum WalletCommand {
    /// Show address and balance, creating the wallet if needed
    Show,
    /// Print the address to receive USDT on
    Receive,
    /// Send USDT to another mock wallet
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Transactions in and out of the wallet
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Saved addresses
    Contacts {
        #[command(subcommand)]
        command: ContactCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ContactCommand {
    /// Save an address under a name
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
    },
    /// List saved addresses
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let output = if args.json { Output::Json } else { Output::Human };
    let mut app = App::new(config::load(), output);
    if let Some(network) = args.network.as_deref() {
        app.select_network(network)?;
    }

    match args.command {
        Command::Networks => app.networks(),
        Command::Address => app.placeholder_address(),
        Command::Keygen => app.keygen(),
        Command::Balance { address } => app.balance(&address).await,
        Command::Send { key, to, amount } => app.send(&key, &to, &amount).await,
        Command::History { address, limit } => app.history(&address, limit).await,
        Command::Tx { hash } => app.transaction(&hash).await,
        Command::Wallet { user, command } => {
            let mut ledger = app.open_ledger()?;
            match command {
                WalletCommand::Show => app.wallet_show(&ledger, &user),
                WalletCommand::Receive => app.wallet_receive(&ledger, &user),
                WalletCommand::Send { to, amount } => {
                    app.wallet_send(&mut ledger, &user, &to, &amount)
                }
                WalletCommand::History { limit } => app.wallet_history(&ledger, &user, limit),
                WalletCommand::Contacts { command } => match command {
                    ContactCommand::Add { name, address } => {
                        app.contact_add(&ledger, &user, &name, &address)
                    }
                    ContactCommand::List => app.contact_list(&ledger, &user),
                },
            }
        }
    }
}
