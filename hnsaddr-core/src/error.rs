//! Error types for hnsaddr-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported network: {0}. Use main, testnet, regtest, or simnet")]
    UnsupportedNetwork(String),

    #[error("Invalid account index {0}: must be below 2^31")]
    InvalidAccount(u32),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Address encoding failed: {0}")]
    Encoding(String),

    #[error("Device error: {0}")]
    Device(String),
}

impl From<bitcoin::bip32::Error> for Error {
    fn from(err: bitcoin::bip32::Error) -> Self {
        Error::Derivation(err.to_string())
    }
}

impl From<bitcoin::base58::Error> for Error {
    fn from(err: bitcoin::base58::Error) -> Self {
        Error::Derivation(format!("base58: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
