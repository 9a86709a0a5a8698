//! Wallet commands: validation up front, then at most a handful of gateway
//! calls, then rendered output.
use std::future::Future;
use std::path::Path;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tracing::debug;

use crate::display;
use crate::error::{Result, WalletError};
use crate::keystore;
use crate::network::{fetch_history, Gateway, NetworkConfig};

pub const DEFAULT_WALLET_PATH: &str = "wallet-secret.json";
pub const DEFAULT_RECOVERED_WALLET_PATH: &str = "recovered-wallet-secret.json";

/// What a command produced: text for stdout and an optional non-fatal
/// warning for stderr.
#[derive(Debug)]
pub struct Outcome {
    pub output: String,
    pub warning: Option<WalletError>,
}

impl From<String> for Outcome {
    fn from(output: String) -> Self {
        Self {
            output,
            warning: None,
        }
    }
}

/// Operations on an existing wallet file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show wallet balance
    Balance,
    /// Show wallet address
    Address,
    /// Transfer SOL to another address
    Transfer { recipient: Pubkey, lamports: u64 },
    /// Request test-network SOL, then show the new balance
    Airdrop { lamports: u64 },
    /// Show recent transactions
    History,
}

/// Parse a base58 recipient address.
pub fn parse_address(input: &str) -> Result<Pubkey> {
    let input = input.trim();
    Pubkey::from_str(input).map_err(|e| WalletError::InvalidAddress {
        address: input.to_string(),
        reason: e.to_string(),
    })
}

impl Command {
    /// Validate a transfer request. A zero amount is accepted and submitted.
    pub fn transfer(recipient: &str, amount: &str) -> Result<Self> {
        let recipient = parse_address(recipient)?;
        let lamports = display::parse_sol_amount(amount)?;
        Ok(Command::Transfer {
            recipient,
            lamports,
        })
    }

    pub fn airdrop(amount: &str) -> Result<Self> {
        let lamports = display::parse_sol_amount(amount)?;
        Ok(Command::Airdrop { lamports })
    }

    /// Execute a command and return its output.
    ///
    /// Every gateway call is bounded by the configured operation deadline; a
    /// call that outlives it is reported as `NetworkUnavailable`.
    pub async fn execute(
        &self,
        keypair: &Keypair,
        gateway: &dyn Gateway,
        config: &NetworkConfig,
        json_output: bool,
    ) -> Result<Outcome> {
        let pubkey = keypair.pubkey();
        let deadline = Deadline(config);

        match self {
            Command::Balance => {
                let lamports = deadline.run("balance", gateway.balance(&pubkey)).await?;
                let output = if json_output {
                    display::format_balance_json(lamports)
                } else {
                    format!("Balance: {}", display::format_balance(lamports))
                };
                Ok(output.into())
            }

            Command::Address => Ok(render_address(&pubkey, json_output).into()),

            Command::Transfer {
                recipient,
                lamports,
            } => {
                debug!(from = %pubkey, to = %recipient, lamports, "transfer");
                let signature = deadline
                    .run("transfer", gateway.transfer(keypair, recipient, *lamports))
                    .await?;

                let output = if json_output {
                    serde_json::json!({
                        "signature": signature.to_string(),
                        "amount_lamports": lamports,
                        "amount_sol": display::lamports_to_sol(*lamports),
                        "recipient": recipient.to_string(),
                    })
                    .to_string()
                } else {
                    format!(
                        "Transfer successful. Signature: {signature}\n  Amount: {} -> {recipient}",
                        display::format_balance(*lamports),
                    )
                };
                Ok(output.into())
            }

            Command::Airdrop { lamports } => {
                if !config.airdrop_allowed() {
                    return Err(WalletError::AirdropFailed {
                        cause: format!("airdrops are not available on {}", config.network),
                    });
                }
                let signature = deadline
                    .run("airdrop", gateway.request_airdrop(&pubkey, *lamports))
                    .await?;
                // The funds have landed; a failed balance query only costs the
                // "New balance" line, never the signature.
                let balance = deadline.run("balance", gateway.balance(&pubkey)).await;
                if let Err(e) = &balance {
                    debug!(%signature, "airdrop confirmed but balance query failed: {e}");
                }

                let output = if json_output {
                    let balance = balance.as_ref().ok().copied();
                    serde_json::json!({
                        "signature": signature.to_string(),
                        "amount_lamports": lamports,
                        "balance_lamports": balance,
                        "balance_sol": balance.map(display::lamports_to_sol),
                    })
                    .to_string()
                } else {
                    match &balance {
                        Ok(balance) => format!(
                            "Airdrop successful. Signature: {signature}\nNew balance: {}",
                            display::format_balance(*balance)
                        ),
                        Err(_) => format!("Airdrop successful. Signature: {signature}"),
                    }
                };
                Ok(Outcome {
                    output,
                    warning: balance.err(),
                })
            }

            Command::History => {
                let history = deadline
                    .run("history", fetch_history(gateway, &pubkey))
                    .await?;
                let output = if json_output {
                    display::format_history_json(&history)
                } else {
                    display::format_history(&history)
                };
                Ok(Outcome {
                    output,
                    warning: history.partial_error(),
                })
            }
        }
    }
}

/// Run a validated request, connecting to the network only when the command
/// needs it. A request that failed validation returns its error without
/// calling `connect`.
pub async fn dispatch<G, F>(
    request: Result<Command>,
    keypair: &Keypair,
    config: &NetworkConfig,
    json_output: bool,
    connect: F,
) -> Result<Outcome>
where
    G: Gateway,
    F: FnOnce(&NetworkConfig) -> Result<G>,
{
    let command = request?;
    debug!(?command, "dispatching");
    if command == Command::Address {
        return Ok(render_address(&keypair.pubkey(), json_output).into());
    }
    let gateway = connect(config)?;
    command.execute(keypair, &gateway, config, json_output).await
}

fn render_address(pubkey: &Pubkey, json_output: bool) -> String {
    let address = pubkey.to_string();
    if json_output {
        display::format_address_json(&address)
    } else {
        format!("Wallet address to receive SOL: {address}")
    }
}

struct Deadline<'a>(&'a NetworkConfig);

impl Deadline<'_> {
    async fn run<T>(&self, operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.0.operation_deadline();
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            WalletError::NetworkUnavailable(format!(
                "{operation} did not complete within {}s",
                limit.as_secs()
            ))
        })?
    }
}

/// Create a wallet from a freshly generated mnemonic and save it to `output`.
pub fn create_wallet(output: &Path, json_output: bool) -> Result<String> {
    let (keypair, mnemonic) = keystore::derive_from_mnemonic(None)?;
    keystore::save(output, &keypair)?;

    let pubkey = keypair.pubkey().to_string();
    if json_output {
        return Ok(serde_json::json!({
            "public_key": pubkey,
            "path": output.display().to_string(),
            "mnemonic": mnemonic.to_string(),
        })
        .to_string());
    }
    Ok(format!(
        "New wallet created successfully!\n\
         Public key: {pubkey}\n\
         Secret key saved to: {}\n\
         Mnemonic (keep this safe!): {mnemonic}",
        output.display()
    ))
}

/// Recover a wallet from an existing phrase and save it to `output`.
pub fn recover_wallet(phrase: &str, output: &Path, json_output: bool) -> Result<String> {
    let (keypair, _) = keystore::derive_from_mnemonic(Some(phrase))?;
    keystore::save(output, &keypair)?;

    let pubkey = keypair.pubkey().to_string();
    if json_output {
        return Ok(serde_json::json!({
            "public_key": pubkey,
            "path": output.display().to_string(),
        })
        .to_string());
    }
    Ok(format!(
        "Wallet recovered successfully!\n\
         Public key: {pubkey}\n\
         Secret key saved to: {}",
        output.display()
    ))
}
