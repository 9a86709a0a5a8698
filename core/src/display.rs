//! Output formatting: SOL denomination conversion and display helpers.
//!
//! SOL uses 9 decimal places. 1 SOL = 1_000_000_000 lamports.
use chrono::{DateTime, Local};
use solana_sdk::native_token::LAMPORTS_PER_SOL;

use crate::error::{Result, WalletError};
use crate::network::{History, TransactionRecord};

const DECIMALS: usize = 9;

/// Convert lamports to a human-readable SOL string.
/// Examples: 1_500_000_000 -> "1.500000000", 0 -> "0.000000000"
#[must_use]
pub fn lamports_to_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    format!("{whole}.{frac:09}")
}

#[must_use]
pub fn format_balance(lamports: u64) -> String {
    format!("{} SOL", lamports_to_sol(lamports))
}

/// Parse a decimal SOL amount into lamports.
/// Accepts: "1.5" -> 1_500_000_000, "1" -> 1_000_000_000, "0.001" -> 1_000_000,
/// ".5" -> 500_000_000. Zero is valid; negative, non-numeric and
/// non-finite input is rejected.
pub fn parse_sol_amount(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let invalid = |reason: &str| WalletError::invalid_amount(input, reason);

    if trimmed.is_empty() {
        return Err(invalid("amount cannot be empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("amount must not be negative"));
    }

    let (whole_str, frac_str) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (trimmed, None),
    };
    if whole_str.is_empty() && frac_str.map_or(true, str::is_empty) {
        return Err(invalid("not a number"));
    }
    if !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a number"));
    }

    let whole: u64 = if whole_str.is_empty() {
        0
    } else {
        whole_str.parse().map_err(|_| invalid("amount too large"))?
    };

    let frac_lamports = match frac_str {
        None | Some("") => 0,
        Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => {
            return Err(invalid("not a number"));
        }
        Some(frac) if frac.len() > DECIMALS => {
            return Err(invalid("too many decimal places, SOL supports up to 9"));
        }
        Some(frac) => format!("{:0<width$}", frac, width = DECIMALS)
            .parse::<u64>()
            .map_err(|_| invalid("not a number"))?,
    };

    whole
        .checked_mul(LAMPORTS_PER_SOL)
        .and_then(|w| w.checked_add(frac_lamports))
        .ok_or_else(|| invalid("amount too large"))
}

/// Render a unix timestamp in the local time zone.
#[must_use]
pub fn format_block_time(block_time: Option<i64>) -> String {
    block_time
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn status_label(record: &TransactionRecord) -> &'static str {
    if record.success {
        "Success"
    } else {
        "Failed"
    }
}

/// Format a transaction history for display, numbered from 1.
#[must_use]
pub fn format_history(history: &History) -> String {
    if history.records.is_empty() {
        return "No transactions found.".to_string();
    }

    let mut output = String::from("Transaction History:\n");
    for (i, record) in history.records.iter().enumerate() {
        output.push_str(&format!("{}. Signature: {}\n", i + 1, record.signature));
        output.push_str(&format!("   Status: {}\n", status_label(record)));
        output.push_str(&format!(
            "   Block Time: {}\n",
            format_block_time(record.block_time)
        ));
        output.push_str("---\n");
    }
    output.truncate(output.trim_end().len());
    output
}

#[must_use]
pub fn format_balance_json(lamports: u64) -> String {
    serde_json::json!({
        "balance_lamports": lamports,
        "balance_sol": lamports_to_sol(lamports),
    })
    .to_string()
}

#[must_use]
pub fn format_address_json(address: &str) -> String {
    serde_json::json!({
        "address": address,
    })
    .to_string()
}

#[must_use]
pub fn format_history_json(history: &History) -> String {
    let records: Vec<serde_json::Value> = history
        .records
        .iter()
        .map(|record| {
            serde_json::json!({
                "signature": record.signature,
                "status": status_label(record),
                "block_time": record.block_time,
            })
        })
        .collect();
    serde_json::json!({
        "transactions": records,
        "missing": history.missing,
    })
    .to_string()
}
