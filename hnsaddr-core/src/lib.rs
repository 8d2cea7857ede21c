//! Handshake account path building and watch-address derivation.
//!
//! The hardware device only ever hands out the account-level extended public
//! key for `m/44'/coin_type'/account'`; everything below that (the receive
//! chain and the address encoding) happens here.

pub mod address;
pub mod device;
pub mod error;
pub mod network;
pub mod path;
pub mod watch;
pub mod xpub;

pub use address::{
    Chain, ChildPublicKey, DecodedAddress, RECEIVE_INDEX, address_hash, address_path,
    decode_address, derive_public_key, derive_receive_public_key, encode_address,
};
pub use device::{WatchOnlyProvider, XpubProvider};
pub use error::{Error, Result};
pub use network::{AddressEncoding, Network, NetworkSpec};
pub use path::{PURPOSE, account_path, build_path, format_path, parse_derivation_path};
pub use watch::{WatchAddressOutput, generate_watch_address};
pub use xpub::ExtendedPublicKey;

// Re-export bitcoin types needed by the CLI
pub use bitcoin::bip32::{ChildNumber, DerivationPath};
