//! In-memory `Gateway` for tests. Records every call so tests can assert
//! that validation failures never reach the network.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

use crate::error::{Result, WalletError};
use crate::network::{Gateway, TransactionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub balance: usize,
    pub transfer: usize,
    pub airdrop: usize,
    pub listing: usize,
    pub lookups: usize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.balance + self.transfer + self.airdrop + self.listing + self.lookups
    }
}

#[derive(Default)]
pub struct MockGateway {
    balance: u64,
    signatures: Vec<String>,
    failing_lookups: HashSet<String>,
    listing_failure: bool,
    staggered: bool,
    hang_balance: bool,
    transfer_failure: Option<String>,
    airdrop_failure: Option<String>,
    calls: Mutex<Calls>,
    transfers: Mutex<Vec<(Pubkey, u64)>>,
    airdrops: Mutex<Vec<u64>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockGateway {
    pub fn with_balance(mut self, lamports: u64) -> Self {
        self.balance = lamports;
        self
    }

    pub fn with_signatures(mut self, signatures: &[&str]) -> Self {
        self.signatures = signatures.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_failing_lookup(mut self, signature: &str) -> Self {
        self.failing_lookups.insert(signature.to_string());
        self
    }

    pub fn with_listing_failure(mut self) -> Self {
        self.listing_failure = true;
        self
    }

    /// Earlier signatures take longer to resolve than later ones.
    pub fn with_staggered_lookups(mut self) -> Self {
        self.staggered = true;
        self
    }

    /// `balance` never completes.
    pub fn with_hanging_balance(mut self) -> Self {
        self.hang_balance = true;
        self
    }

    pub fn with_transfer_failure(mut self, cause: &str) -> Self {
        self.transfer_failure = Some(cause.to_string());
        self
    }

    pub fn with_airdrop_failure(mut self, cause: &str) -> Self {
        self.airdrop_failure = Some(cause.to_string());
        self
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    pub fn transfers(&self) -> Vec<(Pubkey, u64)> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn airdrops(&self) -> Vec<u64> {
        self.airdrops.lock().unwrap().clone()
    }

    pub fn peak_concurrent_lookups(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.calls.lock().unwrap());
    }
}

fn fake_signature(seed: u8) -> Signature {
    Signature::from([seed; 64])
}

#[async_trait]
impl Gateway for MockGateway {
    async fn balance(&self, _pubkey: &Pubkey) -> Result<u64> {
        self.record(|c| c.balance += 1);
        if self.hang_balance {
            futures::future::pending::<()>().await;
        }
        Ok(self.balance)
    }

    async fn transfer(&self, _from: &Keypair, to: &Pubkey, lamports: u64) -> Result<Signature> {
        self.record(|c| c.transfer += 1);
        if let Some(cause) = &self.transfer_failure {
            return Err(WalletError::TransferFailed {
                cause: cause.clone(),
            });
        }
        self.transfers.lock().unwrap().push((*to, lamports));
        Ok(fake_signature(1))
    }

    async fn request_airdrop(&self, _pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        self.record(|c| c.airdrop += 1);
        if let Some(cause) = &self.airdrop_failure {
            return Err(WalletError::AirdropFailed {
                cause: cause.clone(),
            });
        }
        self.airdrops.lock().unwrap().push(lamports);
        Ok(fake_signature(2))
    }

    async fn signatures_for_address(&self, _pubkey: &Pubkey) -> Result<Vec<String>> {
        self.record(|c| c.listing += 1);
        if self.listing_failure {
            return Err(WalletError::NetworkUnavailable("connection refused".to_string()));
        }
        Ok(self.signatures.clone())
    }

    async fn transaction_record(&self, signature: &str) -> Result<TransactionRecord> {
        self.record(|c| c.lookups += 1);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if self.staggered {
            let position = self
                .signatures
                .iter()
                .position(|s| s == signature)
                .unwrap_or(0);
            let delay = (self.signatures.len() - position) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_lookups.contains(signature) {
            return Err(WalletError::NetworkUnavailable(format!(
                "lookup of {signature} failed"
            )));
        }
        Ok(TransactionRecord {
            signature: signature.to_string(),
            success: true,
            block_time: Some(1_700_000_000),
        })
    }
}
