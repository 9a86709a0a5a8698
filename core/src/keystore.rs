//! Key material store: keypair generation, mnemonic derivation and the
//! on-disk wallet file.
//!
//! The wallet file is a flat JSON array of the 64 secret key bytes (the
//! 32-byte ed25519 seed followed by the 32-byte public key), the same layout
//! `solana-keygen` writes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bip39::Mnemonic;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::signer::keypair::keypair_from_seed;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

/// Length of the serialized secret key.
pub const SECRET_KEY_LEN: usize = 64;
/// Length of the seed half of the secret key.
pub const SEED_LEN: usize = 32;
/// Words in a freshly generated mnemonic.
pub const MNEMONIC_WORDS: usize = 12;

/// Generate a fresh keypair from the OS random source.
#[must_use]
pub fn generate() -> Keypair {
    Keypair::new()
}

/// Derive a keypair from a BIP-39 mnemonic.
///
/// With `None` a new 12-word phrase is generated. A supplied phrase is
/// validated against the English word list and its checksum first. The first
/// 32 bytes of the BIP-39 seed (empty passphrase) seed the ed25519 key.
pub fn derive_from_mnemonic(phrase: Option<&str>) -> Result<(Keypair, Mnemonic)> {
    let mnemonic = match phrase {
        Some(phrase) => parse_mnemonic(phrase)?,
        None => Mnemonic::generate(MNEMONIC_WORDS)
            .map_err(|e| WalletError::InvalidMnemonic(format!("failed to generate: {e}")))?,
    };

    let seed = Zeroizing::new(mnemonic.to_seed_normalized(""));
    let keypair = keypair_from_seed(&seed[..SEED_LEN])
        .map_err(|e| WalletError::InvalidMnemonic(format!("failed to derive keypair: {e}")))?;
    Ok((keypair, mnemonic))
}

/// Parse a user supplied phrase. Surrounding whitespace, repeated spaces and
/// upper case letters are tolerated.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    let normalized = Zeroizing::new(
        phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    );
    if normalized.is_empty() {
        return Err(WalletError::InvalidMnemonic("phrase is empty".to_string()));
    }
    Mnemonic::parse_normalized(&normalized).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Load a keypair from a wallet file.
pub fn load(path: &Path) -> Result<Keypair> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => Zeroizing::new(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(WalletError::FileNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(WalletError::ReadError {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let malformed = |reason: String| WalletError::MalformedKeyFile {
        path: path.to_path_buf(),
        reason,
    };

    let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
        serde_json::from_str(&contents)
            .map_err(|e| malformed(format!("expected a JSON array of bytes: {e}")))?,
    );
    if bytes.len() != SECRET_KEY_LEN {
        return Err(malformed(format!(
            "expected {SECRET_KEY_LEN} bytes, found {}",
            bytes.len()
        )));
    }

    let keypair = keypair_from_seed(&bytes[..SEED_LEN])
        .map_err(|e| malformed(format!("invalid secret key: {e}")))?;
    if keypair.pubkey().to_bytes()[..] != bytes[SEED_LEN..] {
        return Err(malformed(
            "public key does not match the secret key".to_string(),
        ));
    }

    debug!(path = %path.display(), pubkey = %keypair.pubkey(), "loaded key file");
    Ok(keypair)
}

/// Save a keypair, replacing any existing file at `path`.
///
/// The bytes go to a sibling temp file which is then renamed over the
/// destination.
pub fn save(path: &Path, keypair: &Keypair) -> Result<()> {
    let write_error = |source: io::Error| WalletError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let bytes = Zeroizing::new(keypair.to_bytes());
    let json = Zeroizing::new(
        serde_json::to_string(&bytes[..]).map_err(|e| write_error(io::Error::other(e)))?,
    );

    let tmp = temp_path(path);
    let result = write_private(&tmp, json.as_bytes()).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(write_error(e));
    }

    info!(path = %path.display(), pubkey = %keypair.pubkey(), "saved key file");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wallet".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
