//! SolanaSwift: a quick and efficient Solana wallet CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use solswift_core::commands::{self, DEFAULT_RECOVERED_WALLET_PATH, DEFAULT_WALLET_PATH};
use solswift_core::error::EXIT_FAILURE;
use solswift_core::{keystore, Command, Network, NetworkConfig, RpcGateway, WalletError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

const BANNER: &str = r"
 ____        _                   ____          _  __ _
/ ___|  ___ | | __ _ _ __   __ _/ ___|_      _(_)/ _| |_
\___ \ / _ \| |/ _` | '_ \ / _` \___ \ \ /\ / / | |_| __|
 ___) | (_) | | (_| | | | | (_| |___) \ V  V /| |  _| |_
|____/ \___/|_|\__,_|_| |_|\__,_|____/ \_/\_/ |_|_|  \__|
";

#[derive(Debug, Parser)]
#[command(
    name = "solswift",
    version,
    about = "SolanaSwift: A quick and efficient Solana wallet CLI"
)]
struct Cli {
    /// Network to connect to: devnet, testnet, mainnet or localnet
    #[arg(long, global = true, env = "SOLSWIFT_NETWORK", default_value = "devnet")]
    network: Network,

    /// Custom RPC endpoint (overrides --network)
    #[arg(long, global = true, env = "SOLSWIFT_RPC_URL")]
    url: Option<String>,

    /// RPC request timeout in seconds
    #[arg(long, global = true, env = "SOLSWIFT_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Seconds to wait for transfers and airdrops to confirm
    #[arg(long, global = true, env = "SOLSWIFT_CONFIRM_TIMEOUT", default_value_t = 60)]
    confirm_timeout: u64,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Do not print the startup banner
    #[arg(long, global = true)]
    no_banner: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new wallet and save the secret key to a file
    CreateWallet {
        #[arg(value_name = "OUTPUT_PATH", default_value = DEFAULT_WALLET_PATH)]
        output: PathBuf,
    },

    /// Recover a wallet from a mnemonic phrase
    RecoverWallet {
        /// The recovery phrase, quoted as one argument
        mnemonic: String,
        #[arg(value_name = "OUTPUT_PATH", default_value = DEFAULT_RECOVERED_WALLET_PATH)]
        output: PathBuf,
    },

    /// Wallet operations
    Wallet {
        /// Path to the JSON file containing the wallet's secret key
        #[arg(short = 'k', long = "key", global = true, value_name = "PATH")]
        key: Option<PathBuf>,

        #[command(subcommand)]
        action: WalletAction,
    },
}

#[derive(Debug, Subcommand)]
enum WalletAction {
    /// Get wallet balance
    Balance,
    /// Transfer SOL to another address
    Transfer {
        recipient: String,
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },
    /// Get wallet public address for receiving SOL
    Address,
    /// Request an airdrop of SOL from the test network
    Airdrop {
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },
    /// Get transaction history
    History,
}

impl WalletAction {
    fn into_command(self) -> Result<Command, WalletError> {
        match self {
            WalletAction::Balance => Ok(Command::Balance),
            WalletAction::Address => Ok(Command::Address),
            WalletAction::History => Ok(Command::History),
            WalletAction::Transfer { recipient, amount } => Command::transfer(&recipient, &amount),
            WalletAction::Airdrop { amount } => Command::airdrop(&amount),
        }
    }
}

impl Cli {
    fn network_config(&self) -> NetworkConfig {
        let network = if self.url.is_some() {
            Network::Custom
        } else {
            self.network
        };
        NetworkConfig {
            network,
            custom_url: self.url.clone(),
            timeout: Duration::from_secs(self.timeout),
            confirm_timeout: Duration::from_secs(self.confirm_timeout),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.no_banner && !cli.json {
        eprintln!("{BANNER}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.network_config();
    let json = cli.json;

    match cli.command {
        Commands::CreateWallet { output } => {
            println!("{}", commands::create_wallet(&output, json)?);
        }

        Commands::RecoverWallet { mnemonic, output } => {
            let phrase = Zeroizing::new(mnemonic);
            println!("{}", commands::recover_wallet(&phrase, &output, json)?);
        }

        Commands::Wallet { key, action } => {
            let Some(key) = key else {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "the wallet commands require --key <PATH>",
                    )
                    .exit();
            };

            let keypair = keystore::load(&key)?;
            debug!(key = %key.display(), "wallet loaded");

            let outcome = commands::dispatch(action.into_command(), &keypair, &config, json, |config| {
                let gateway = RpcGateway::new(config)?;
                info!(network = %config.network, "using rpc endpoint");
                Ok(gateway)
            })
            .await?;

            println!("{}", outcome.output);
            if let Some(warning) = outcome.warning {
                eprintln!("warning[{}]: {warning}", warning.kind());
            }
        }
    }

    Ok(())
}

fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<WalletError>() {
        Some(wallet_err) => {
            eprintln!("error[{}]: {wallet_err}", wallet_err.kind());
            ExitCode::from(wallet_err.exit_code() as u8)
        }
        None => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FAILURE as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_may_follow_the_action() {
        let cli = Cli::try_parse_from(["solswift", "wallet", "balance", "-k", "w.json"]).unwrap();
        match cli.command {
            Commands::Wallet { key, action } => {
                assert_eq!(key, Some(PathBuf::from("w.json")));
                assert!(matches!(action, WalletAction::Balance));
            }
            other => panic!("expected wallet command, got {other:?}"),
        }
    }

    #[test]
    fn negative_amount_reaches_validation() {
        let cli = Cli::try_parse_from([
            "solswift", "wallet", "-k", "w.json", "transfer", "11111111111111111111111111111112", "-1",
        ])
        .unwrap();
        let Commands::Wallet { action, .. } = cli.command else {
            panic!("expected wallet command");
        };
        let err = action.into_command().unwrap_err();
        assert_eq!(err.kind(), "InvalidAmount");
    }

    #[test]
    fn default_output_paths() {
        let cli = Cli::try_parse_from(["solswift", "create-wallet"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::CreateWallet { ref output } if output == &PathBuf::from(DEFAULT_WALLET_PATH)
        ));

        let cli = Cli::try_parse_from(["solswift", "recover-wallet", "a b c"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::RecoverWallet { ref output, .. }
                if output == &PathBuf::from(DEFAULT_RECOVERED_WALLET_PATH)
        ));
    }

    #[test]
    fn url_selects_custom_network() {
        let cli = Cli::try_parse_from([
            "solswift", "--url", "http://localhost:8899", "wallet", "-k", "w.json", "balance",
        ])
        .unwrap();
        let config = cli.network_config();
        assert_eq!(config.network, Network::Custom);
        assert_eq!(config.rpc_url().unwrap(), "http://localhost:8899");
    }
}
