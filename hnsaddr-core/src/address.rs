//! Receive-chain child key derivation and Handshake address encoding

use bech32::{Hrp, segwit};
use bitcoin::bip32::{ChildNumber, DerivationPath};
use bitcoin::secp256k1::{PublicKey, Secp256k1};
use blake2::digest::consts::U20;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::network::{AddressEncoding, Network, NetworkSpec};
use crate::xpub::ExtendedPublicKey;

type Blake2b160 = Blake2b<U20>;

/// Address index used for the watch address
pub const RECEIVE_INDEX: u32 = 0;

/// Non-hardened chain below the account key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// External chain (0), addresses handed out to payers
    #[default]
    Receive,
    /// Internal chain (1), change outputs
    Change,
}

impl Chain {
    pub fn index(self) -> u32 {
        match self {
            Chain::Receive => 0,
            Chain::Change => 1,
        }
    }
}

/// Compressed secp256k1 point derived below an account key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildPublicKey([u8; 33]);

impl ChildPublicKey {
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

impl AsRef<[u8]> for ChildPublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ChildPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Result of decoding an address back into its witness program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedAddress {
    pub network: Network,
    pub witness_version: u8,
    #[serde(with = "hex::serde")]
    pub program: Vec<u8>,
}

/// Path suffix `/chain/index` appended to an account path
fn chain_suffix(chain: Chain, index: u32) -> Result<[ChildNumber; 2]> {
    Ok([
        ChildNumber::from_normal_idx(chain.index())?,
        ChildNumber::from_normal_idx(index)?,
    ])
}

/// Full path of a derived address below `account_path`
pub fn address_path(account_path: &DerivationPath, chain: Chain, index: u32) -> Result<DerivationPath> {
    Ok(account_path.extend(chain_suffix(chain, index)?))
}

/// Derive the key at `0/0` below the account key
pub fn derive_receive_public_key(xpub: &ExtendedPublicKey) -> Result<ChildPublicKey> {
    derive_public_key(xpub, Chain::Receive, RECEIVE_INDEX)
}

/// Derive the key at `chain/index` with two unhardened CKDpub steps
pub fn derive_public_key(xpub: &ExtendedPublicKey, chain: Chain, index: u32) -> Result<ChildPublicKey> {
    let secp = Secp256k1::verification_only();
    let suffix = chain_suffix(chain, index)?;

    let mut key = *xpub.as_xpub();
    for child in suffix {
        key = key.ckd_pub(&secp, child)?;
        debug!(
            "Derived child {child} at depth {depth}: {pubkey}",
            depth = key.depth,
            pubkey = hex::encode(key.public_key.serialize())
        );
    }

    Ok(ChildPublicKey(key.public_key.serialize()))
}

/// 20-byte BLAKE2b digest used as the witness program
pub fn address_hash(pubkey: &ChildPublicKey) -> [u8; 20] {
    let digest = Blake2b160::digest(pubkey.as_bytes());
    let mut program = [0u8; 20];
    program.copy_from_slice(&digest);
    program
}

/// Encode a compressed public key as an address for `spec`
pub fn encode_address(pubkey: &[u8], spec: &NetworkSpec) -> Result<String> {
    if pubkey.len() != 33 {
        return Err(Error::Encoding(format!(
            "Invalid public key length: expected 33 bytes, got {pubkey_len}",
            pubkey_len = pubkey.len()
        )));
    }

    let key = PublicKey::from_slice(pubkey)
        .map_err(|e| Error::Encoding(format!("Failed to parse compressed public key: {e}")))?;
    let child = ChildPublicKey(key.serialize());

    match spec.address_encoding {
        AddressEncoding::WitnessV0 => {
            let hrp = Hrp::parse(spec.address_hrp)
                .map_err(|e| Error::Encoding(format!("Invalid address prefix: {e}")))?;
            segwit::encode_v0(hrp, &address_hash(&child))
                .map_err(|e| Error::Encoding(e.to_string()))
        }
    }
}

/// Decode an address, checking it belongs to `spec`
pub fn decode_address(address: &str, spec: &NetworkSpec) -> Result<DecodedAddress> {
    match spec.address_encoding {
        AddressEncoding::WitnessV0 => {
            let (hrp, version, program) = segwit::decode(address)
                .map_err(|e| Error::Encoding(format!("Invalid address {address}: {e}")))?;

            if !hrp.as_str().eq_ignore_ascii_case(spec.address_hrp) {
                return Err(Error::Encoding(format!(
                    "Address prefix '{hrp}' does not belong to {network} (expected '{expected}')",
                    network = spec.name,
                    expected = spec.address_hrp
                )));
            }
            if version != segwit::VERSION_0 || program.len() != 20 {
                return Err(Error::Encoding(format!(
                    "Unsupported witness program: version {version}, {len} bytes",
                    version = version.to_u8(),
                    len = program.len()
                )));
            }

            Ok(DecodedAddress {
                network: spec.network,
                witness_version: version.to_u8(),
                program,
            })
        }
    }
}
