//! Thin wrapper around the Solana RPC client for network operations.
mod history;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use solana_system_interface::instruction as system_instruction;
use solana_transaction_status::UiTransactionEncoding;
use tracing::{debug, info};

use crate::error::{Result, WalletError};

pub use history::{fetch_history, History, HISTORY_CONCURRENCY};

pub const DEVNET_URL: &str = "https://api.devnet.solana.com";
pub const TESTNET_URL: &str = "https://api.testnet.solana.com";
pub const MAINNET_URL: &str = "https://api.mainnet-beta.solana.com";
pub const LOCALNET_URL: &str = "http://127.0.0.1:8899";

/// Default per-request transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default time to wait for a submitted transaction to confirm.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Network {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
    Localnet,
    Custom,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Localnet => "localnet",
            Network::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            "custom" => Ok(Self::Custom),
            other => Err(format!(
                "Unknown network: '{other}'. Use devnet, testnet, mainnet, localnet or custom."
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub custom_url: Option<String>,
    /// Transport timeout for each RPC request.
    pub timeout: Duration,
    /// How long to wait for a transfer or airdrop to confirm.
    pub confirm_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: Network::Devnet,
            custom_url: None,
            timeout: DEFAULT_TIMEOUT,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }
}

impl NetworkConfig {
    /// RPC endpoint for the configured network.
    pub fn rpc_url(&self) -> Result<String> {
        let url = match self.network {
            Network::Devnet => DEVNET_URL,
            Network::Testnet => TESTNET_URL,
            Network::Mainnet => MAINNET_URL,
            Network::Localnet => LOCALNET_URL,
            Network::Custom => {
                return self.custom_url.clone().ok_or_else(|| {
                    WalletError::InvalidConfig("Custom network requires a node URL".to_string())
                });
            }
        };
        Ok(url.to_string())
    }

    /// Upper bound for a whole gateway operation, confirmation included.
    #[must_use]
    pub fn operation_deadline(&self) -> Duration {
        self.timeout + self.confirm_timeout
    }

    /// Test funds can only be requested outside mainnet.
    #[must_use]
    pub fn airdrop_allowed(&self) -> bool {
        self.network != Network::Mainnet
    }
}

/// One resolved entry of an account's transaction history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub signature: String,
    pub success: bool,
    /// Unix timestamp of the containing block, if the node reports one.
    pub block_time: Option<i64>,
}

/// The four remote operations the wallet needs, with amounts in lamports.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64>;

    /// Submit a single system transfer and wait for it to confirm.
    async fn transfer(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature>;

    /// Request test funds and wait for the funding transaction to confirm.
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature>;

    /// Recent signatures involving `pubkey`, most recent first.
    async fn signatures_for_address(&self, pubkey: &Pubkey) -> Result<Vec<String>>;

    async fn transaction_record(&self, signature: &str) -> Result<TransactionRecord>;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for &T {
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64> {
        (**self).balance(pubkey).await
    }

    async fn transfer(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature> {
        (**self).transfer(from, to, lamports).await
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        (**self).request_airdrop(pubkey, lamports).await
    }

    async fn signatures_for_address(&self, pubkey: &Pubkey) -> Result<Vec<String>> {
        (**self).signatures_for_address(pubkey).await
    }

    async fn transaction_record(&self, signature: &str) -> Result<TransactionRecord> {
        (**self).transaction_record(signature).await
    }
}

pub struct RpcGateway {
    client: RpcClient,
    config: NetworkConfig,
}

impl RpcGateway {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let url = config.rpc_url()?;
        debug!(%url, network = %config.network, "creating rpc client");
        let client =
            RpcClient::new_with_timeout_and_commitment(url, config.timeout, CommitmentConfig::confirmed());
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Poll the signature status until it lands or the confirmation window
    /// closes. Errors carry the cause as a plain string.
    async fn wait_for_confirmation(&self, signature: &Signature) -> std::result::Result<(), String> {
        let deadline = tokio::time::Instant::now() + self.config.confirm_timeout;
        loop {
            match self.client.get_signature_status(signature).await {
                Ok(Some(Ok(()))) => return Ok(()),
                Ok(Some(Err(e))) => return Err(format!("transaction {signature} failed: {e}")),
                Ok(None) => {}
                Err(e) => debug!(%signature, "status poll failed: {e}"),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(format!(
                    "transaction {signature} was not confirmed within {}s",
                    self.config.confirm_timeout.as_secs()
                ));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}

fn unavailable(context: &str, err: ClientError) -> WalletError {
    WalletError::NetworkUnavailable(format!("{context}: {err}"))
}

#[async_trait]
impl Gateway for RpcGateway {
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64> {
        debug!(%pubkey, "querying balance");
        self.client
            .get_balance(pubkey)
            .await
            .map_err(|e| unavailable("Failed to query balance", e))
    }

    async fn transfer(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature> {
        let failed = |cause: String| WalletError::TransferFailed { cause };

        let instruction = system_instruction::transfer(&from.pubkey(), to, lamports);
        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(|e| failed(format!("Failed to fetch recent blockhash: {e}")))?;
        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&from.pubkey()),
            &[from],
            blockhash,
        );

        let signature = self
            .client
            .send_transaction(&tx)
            .await
            .map_err(|e| failed(format!("Failed to submit transaction: {e}")))?;
        info!(%signature, %to, lamports, "transfer submitted");

        self.wait_for_confirmation(&signature).await.map_err(failed)?;
        Ok(signature)
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        let failed = |cause: String| WalletError::AirdropFailed { cause };

        let signature = self
            .client
            .request_airdrop(pubkey, lamports)
            .await
            .map_err(|e| failed(format!("Airdrop request failed: {e}")))?;
        info!(%signature, %pubkey, lamports, "airdrop requested");

        self.wait_for_confirmation(&signature).await.map_err(failed)?;
        Ok(signature)
    }

    async fn signatures_for_address(&self, pubkey: &Pubkey) -> Result<Vec<String>> {
        let statuses = self
            .client
            .get_signatures_for_address(pubkey)
            .await
            .map_err(|e| WalletError::HistoryFetchFailed(e.to_string()))?;
        Ok(statuses.into_iter().map(|s| s.signature).collect())
    }

    async fn transaction_record(&self, signature: &str) -> Result<TransactionRecord> {
        let parsed = Signature::from_str(signature)
            .map_err(|e| WalletError::HistoryFetchFailed(format!("bad signature {signature}: {e}")))?;
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let tx = self
            .client
            .get_transaction_with_config(&parsed, config)
            .await
            .map_err(|e| unavailable("Failed to query transaction", e))?;

        let success = tx
            .transaction
            .meta
            .as_ref()
            .map_or(true, |meta| meta.err.is_none());
        Ok(TransactionRecord {
            signature: signature.to_string(),
            success,
            block_time: tx.block_time,
        })
    }
}
