//! Handshake network constants

use bitcoin::NetworkKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How a network turns a compressed public key into an address string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressEncoding {
    /// bech32 witness version 0 over the 20-byte BLAKE2b digest of the key
    WitnessV0,
}

/// Static parameters of one Handshake network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSpec {
    pub network: Network,
    pub name: &'static str,
    /// BIP44 coin type, applied hardened
    pub coin_type: u32,
    pub address_hrp: &'static str,
    pub address_encoding: AddressEncoding,
    /// Version bytes of the base58 extended public key serialization
    pub xpub_version: [u8; 4],
    pub xpub_prefix: &'static str,
}

pub static MAIN: NetworkSpec = NetworkSpec {
    network: Network::Main,
    name: "main",
    coin_type: 5353,
    address_hrp: "hs",
    address_encoding: AddressEncoding::WitnessV0,
    xpub_version: [0x04, 0x88, 0xb2, 0x1e],
    xpub_prefix: "xpub",
};

pub static TESTNET: NetworkSpec = NetworkSpec {
    network: Network::Testnet,
    name: "testnet",
    coin_type: 5354,
    address_hrp: "ts",
    address_encoding: AddressEncoding::WitnessV0,
    xpub_version: [0x04, 0x35, 0x87, 0xcf],
    xpub_prefix: "tpub",
};

pub static REGTEST: NetworkSpec = NetworkSpec {
    network: Network::Regtest,
    name: "regtest",
    coin_type: 5355,
    address_hrp: "rs",
    address_encoding: AddressEncoding::WitnessV0,
    xpub_version: [0xea, 0xb4, 0xfa, 0x05],
    xpub_prefix: "rpub",
};

pub static SIMNET: NetworkSpec = NetworkSpec {
    network: Network::Simnet,
    name: "simnet",
    coin_type: 5356,
    address_hrp: "ss",
    address_encoding: AddressEncoding::WitnessV0,
    xpub_version: [0x04, 0x20, 0xbd, 0x3a],
    xpub_prefix: "spub",
};

/// Handshake network variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Testnet,
    Regtest,
    Simnet,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Main,
        Network::Testnet,
        Network::Regtest,
        Network::Simnet,
    ];

    pub fn spec(self) -> &'static NetworkSpec {
        match self {
            Network::Main => &MAIN,
            Network::Testnet => &TESTNET,
            Network::Regtest => &REGTEST,
            Network::Simnet => &SIMNET,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Look up the network whose extended public keys carry `version`
    pub fn from_xpub_version(version: [u8; 4]) -> Option<Network> {
        Network::ALL
            .into_iter()
            .find(|network| network.spec().xpub_version == version)
    }

    /// Key kind used when handing keys to the bitcoin crate's BIP32 code
    pub(crate) fn network_kind(self) -> NetworkKind {
        match self {
            Network::Main => NetworkKind::Main,
            Network::Testnet | Network::Regtest | Network::Simnet => NetworkKind::Test,
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "main" => Ok(Network::Main),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            "simnet" => Ok(Network::Simnet),
            other => Err(Error::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
