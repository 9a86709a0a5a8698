use futures::stream::{self, StreamExt};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use super::{Gateway, TransactionRecord};
use crate::error::{Result, WalletError};

/// Upper bound on concurrent per-signature lookups.
pub const HISTORY_CONCURRENCY: usize = 10;

/// Best-effort transaction history: the records that resolved, plus the
/// signatures whose lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    /// Resolved records, most recent first.
    pub records: Vec<TransactionRecord>,
    /// Signatures that could not be resolved, in listing order.
    pub missing: Vec<String>,
}

impl History {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// The partial-fetch warning, if any lookup failed.
    #[must_use]
    pub fn partial_error(&self) -> Option<WalletError> {
        if self.is_complete() {
            return None;
        }
        Some(WalletError::HistoryFetchPartial {
            missing: self.missing.len(),
            total: self.records.len() + self.missing.len(),
        })
    }
}

/// List the recent signatures for `pubkey` and resolve each into a record.
///
/// Failing to list signatures fails the whole call. A failed lookup only
/// marks that signature as missing. Lookups run concurrently and are put
/// back into listing order.
pub async fn fetch_history(gateway: &dyn Gateway, pubkey: &Pubkey) -> Result<History> {
    let signatures = gateway.signatures_for_address(pubkey).await.map_err(|e| match e {
        WalletError::HistoryFetchFailed(_) => e,
        other => WalletError::HistoryFetchFailed(other.to_string()),
    })?;
    debug!(%pubkey, count = signatures.len(), "resolving transaction history");

    let mut lookups: Vec<(usize, String, Result<TransactionRecord>)> =
        stream::iter(signatures.into_iter().enumerate())
            .map(|(index, signature)| async move {
                let record = gateway.transaction_record(&signature).await;
                (index, signature, record)
            })
            .buffer_unordered(HISTORY_CONCURRENCY)
            .collect()
            .await;
    lookups.sort_by_key(|(index, _, _)| *index);

    let mut history = History::default();
    for (_, signature, record) in lookups {
        match record {
            Ok(record) => history.records.push(record),
            Err(e) => {
                warn!(%signature, "transaction lookup failed: {e}");
                history.missing.push(signature);
            }
        }
    }
    Ok(history)
}
