pub mod commands;
pub mod display;
pub mod error;
pub mod keystore;
pub mod network;

#[cfg(test)]
mod testing;

pub use commands::Command;
pub use error::WalletError;
pub use network::{Gateway, Network, NetworkConfig, RpcGateway};
