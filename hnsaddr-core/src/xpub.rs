// Handshake extended public key serialization
// Same 78-byte BIP32 layout as bitcoin, with per-network version bytes

use bitcoin::base58;
use bitcoin::bip32::{ChainCode, ChildNumber, Fingerprint, Xpub};
use bitcoin::secp256k1::PublicKey;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::network::Network;

/// Version bytes the bitcoin crate accepts for mainnet keys
const VERSION_MAGIC_XPUB: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
/// Version bytes the bitcoin crate accepts for test keys
const VERSION_MAGIC_TPUB: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];

/// Serialized length of an extended key
pub const XPUB_LEN: usize = 78;

/// An account-level extended public key bound to the network it was exported for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    network: Network,
    xpub: Xpub,
}

impl ExtendedPublicKey {
    pub fn new(network: Network, xpub: Xpub) -> Self {
        Self { network, xpub }
    }

    /// Build a key from the raw fields a device returns
    pub fn from_parts(
        network: Network,
        depth: u8,
        parent_fingerprint: [u8; 4],
        child_number: ChildNumber,
        public_key: &[u8],
        chain_code: &[u8],
    ) -> Result<Self> {
        let chain_code: [u8; 32] = chain_code.try_into().map_err(|_| {
            Error::Derivation(format!(
                "Invalid chain code length: expected 32 bytes, got {len}",
                len = chain_code.len()
            ))
        })?;

        if public_key.len() != 33 {
            return Err(Error::Derivation(format!(
                "Invalid public key length: expected 33 bytes, got {len}",
                len = public_key.len()
            )));
        }
        let public_key = PublicKey::from_slice(public_key)
            .map_err(|e| Error::Derivation(format!("Public key is not a curve point: {e}")))?;

        let xpub = Xpub {
            network: network.network_kind(),
            depth,
            parent_fingerprint: Fingerprint::from(parent_fingerprint),
            child_number,
            chain_code: ChainCode::from(chain_code),
            public_key,
        };

        Ok(Self { network, xpub })
    }

    /// Parse a base58 key, requiring the version bytes of `network`
    pub fn parse(s: &str, network: Network) -> Result<Self> {
        let key = Self::parse_any(s)?;
        if key.network != network {
            return Err(Error::Derivation(format!(
                "Extended key is a {found} key ({prefix}), expected {network}",
                found = key.network,
                prefix = key.network.spec().xpub_prefix,
            )));
        }
        Ok(key)
    }

    /// Parse a base58 key and detect its network from the version bytes
    pub fn parse_any(s: &str) -> Result<Self> {
        let mut data = base58::decode_check(s)?;
        if data.len() != XPUB_LEN {
            return Err(Error::Derivation(format!(
                "Invalid extended key length: expected {XPUB_LEN} bytes, got {len}",
                len = data.len()
            )));
        }

        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&data[0..4]);
        let network = Network::from_xpub_version(prefix).ok_or_else(|| {
            Error::Derivation(format!("Unknown extended key version: {}", hex::encode(prefix)))
        })?;

        // Swap in a version the bitcoin crate understands before decoding
        let magic = match network {
            Network::Main => VERSION_MAGIC_XPUB,
            Network::Testnet | Network::Regtest | Network::Simnet => VERSION_MAGIC_TPUB,
        };
        data[0..4].copy_from_slice(&magic);
        let xpub = Xpub::decode(&data)?;

        Ok(Self { network, xpub })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn depth(&self) -> u8 {
        self.xpub.depth
    }

    pub fn child_number(&self) -> ChildNumber {
        self.xpub.child_number
    }

    pub fn public_key(&self) -> [u8; 33] {
        self.xpub.public_key.serialize()
    }

    pub fn chain_code(&self) -> [u8; 32] {
        *self.xpub.chain_code.as_bytes()
    }

    /// First four bytes of HASH160 of the public key
    pub fn fingerprint(&self) -> [u8; 4] {
        *self.xpub.fingerprint().as_bytes()
    }

    pub fn as_xpub(&self) -> &Xpub {
        &self.xpub
    }

    /// 78-byte serialization with this network's version bytes
    pub fn to_bytes(&self) -> [u8; XPUB_LEN] {
        let mut data = self.xpub.encode();
        data[0..4].copy_from_slice(&self.network.spec().xpub_version);
        data
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode_check(&self.to_bytes()))
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_any(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    // BIP32 test vector 1, chain m/0'/1/2'
    const TV1_DEPTH3_XPUB: &str = "xpub6D4BDPcP2GT577Vvch3R8wDkScZWzQzMMUm3PWbmWvVJrZwQY4VUNgqFJPMM3No2dFDFGTsxxpG5uJh7n7epu4trkrX7x7DogT5Uv6fcLW5";
    const TV1_DEPTH3_TPUB: &str = "tpubDDRojdS4jYQXNugn4t2WLrZ7mjfAyoVQu7MLk4eurqFCbrc7cHLZX8W5YRS8ZskGR9k9t3PqVv68bVBjAyW4nWM9pTGRddt3GQftg6MVQsm";
    const TV1_DEPTH3_RPUB: &str = "rpubKBBUuGzUv7QvqCxejEnqtmxiCkWidjfSCqYfAjF8y6JLJ8rU3fRvE7u4ASreL67NkFFZAB8ezztMVJ5eacTd2zsngnQHfJHUN4XSU3TCHAEC";
    const TV1_DEPTH3_SPUB: &str = "spub4atrh4FoGrjfrdYLSu7J6VkEamqHHK2rmv9wUY8Lctbub4sGGmffGNYZCMZR3qXRb3dDX5uAfWVLUsdJBdakutUrRA312Z8NKpmFyFDfwCb";

    const TV1_PUBKEY: &str = "0357bfe1e341d01c69fe5654309956cbea516822fba8a601743a012a7896ee8dc2";
    const TV1_CHAIN_CODE: &str = "04466b9cc8e161e966409ca52986c584f07e9dc81f735db683c3ff6ec7b1503f";

    #[test]
    fn test_parse_each_network_prefix() -> Result<()> {
        let keys = [
            (Network::Main, TV1_DEPTH3_XPUB),
            (Network::Testnet, TV1_DEPTH3_TPUB),
            (Network::Regtest, TV1_DEPTH3_RPUB),
            (Network::Simnet, TV1_DEPTH3_SPUB),
        ];

        for (network, key_str) in keys {
            let key = ExtendedPublicKey::parse(key_str, network)?;
            assert_eq!(key.network(), network);
            assert_eq!(key.depth(), 3);
            assert_eq!(key.child_number(), ChildNumber::Hardened { index: 2 });
            assert_eq!(hex::encode(key.public_key()), TV1_PUBKEY);
            assert_eq!(hex::encode(key.chain_code()), TV1_CHAIN_CODE);
            assert_eq!(key.to_string(), key_str);
            assert!(key_str.starts_with(network.spec().xpub_prefix));
        }
        Ok(())
    }

    #[test]
    fn test_parse_any_detects_network() -> Result<()> {
        let key: ExtendedPublicKey = TV1_DEPTH3_RPUB.parse()?;
        assert_eq!(key.network(), Network::Regtest);
        Ok(())
    }

    #[test]
    fn test_parse_rejects_other_network() {
        let result = ExtendedPublicKey::parse(TV1_DEPTH3_TPUB, Network::Main);
        assert!(matches!(result, Err(Error::Derivation(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_version() {
        // zpub (SLIP-0132) has no Handshake meaning
        let zpub = "zpub6qUQGY8YyN3ZztQBDdN8gUrFNvgCdTdFyTNorQ79VfkfkmhMR6D4cHBZ4EnXdFog1e2ugyCJqTcyDE4ZpTGqcMiCEnyPEyJFKbPVL9knhKU";
        assert!(matches!(
            ExtendedPublicKey::parse_any(zpub),
            Err(Error::Derivation(_))
        ));
        assert!(ExtendedPublicKey::parse_any("not-a-key").is_err());
    }

    #[test]
    fn test_from_parts_matches_serialized_key() -> Result<()> {
        let parsed = ExtendedPublicKey::parse(TV1_DEPTH3_XPUB, Network::Main)?;
        let built = ExtendedPublicKey::from_parts(
            Network::Main,
            3,
            *parsed.as_xpub().parent_fingerprint.as_bytes(),
            ChildNumber::Hardened { index: 2 },
            &hex::decode(TV1_PUBKEY)?,
            &hex::decode(TV1_CHAIN_CODE)?,
        )?;
        assert_eq!(built, parsed);
        assert_eq!(built.to_string(), TV1_DEPTH3_XPUB);
        Ok(())
    }

    #[test]
    fn test_from_parts_rejects_malformed_material() -> Result<()> {
        let pubkey = hex::decode(TV1_PUBKEY)?;
        let chain_code = hex::decode(TV1_CHAIN_CODE)?;
        let child = ChildNumber::Hardened { index: 0 };

        let short_chain_code =
            ExtendedPublicKey::from_parts(Network::Main, 3, [0; 4], child, &pubkey, &chain_code[..31]);
        assert!(matches!(short_chain_code, Err(Error::Derivation(_))));

        let short_key =
            ExtendedPublicKey::from_parts(Network::Main, 3, [0; 4], child, &pubkey[..32], &chain_code);
        assert!(matches!(short_key, Err(Error::Derivation(_))));

        // x = 0 has no point on secp256k1
        let mut off_curve = [0u8; 33];
        off_curve[0] = 0x02;
        let off_curve =
            ExtendedPublicKey::from_parts(Network::Main, 3, [0; 4], child, &off_curve, &chain_code);
        assert!(matches!(off_curve, Err(Error::Derivation(_))));

        Ok(())
    }
}
