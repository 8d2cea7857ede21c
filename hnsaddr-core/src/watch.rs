//! End-to-end watch address generation

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::address::{Chain, address_path, derive_public_key, encode_address};
use crate::device::XpubProvider;
use crate::error::{Error, Result};
use crate::network::Network;
use crate::path::{build_path, format_path};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchAddressOutput {
    pub network: Network,
    pub account: u32,
    pub account_path: String,
    pub address_path: String,
    /// Account key in the network's serialization, for watch-only import
    pub xpub: String,
    pub pubkey: String,
    pub address: String,
}

/// Fetch the account key from `provider` and derive the address at `chain/index`.
///
/// The provider is closed before returning, whether or not derivation succeeded.
pub async fn generate_watch_address<P: XpubProvider>(
    mut provider: P,
    network: &str,
    account: u32,
    chain: Chain,
    index: u32,
) -> Result<WatchAddressOutput> {
    let result = fetch_and_derive(&mut provider, network, account, chain, index).await;

    match provider.close().await {
        Ok(()) => result,
        Err(close_err) => match result {
            Ok(_) => Err(close_err),
            Err(err) => {
                warn!("Failed to release device after error: {close_err}");
                Err(err)
            }
        },
    }
}

async fn fetch_and_derive<P: XpubProvider>(
    provider: &mut P,
    network: &str,
    account: u32,
    chain: Chain,
    index: u32,
) -> Result<WatchAddressOutput> {
    let (account_path, spec) = build_path(network, account)?;
    let account_path_str = format_path(&account_path);
    info!("Requesting account key for {account_path_str} on {network}");

    let xpub = provider.get_xpub(&account_path, spec.network).await?;
    if xpub.network() != spec.network {
        return Err(Error::Derivation(format!(
            "Device returned a {found} key for a {expected} path",
            found = xpub.network(),
            expected = spec.network
        )));
    }

    let pubkey = derive_public_key(&xpub, chain, index)?;
    let address = encode_address(pubkey.as_ref(), spec)?;
    let full_path = format_path(&address_path(&account_path, chain, index)?);
    info!("Derived {address} at {full_path}");

    Ok(WatchAddressOutput {
        network: spec.network,
        account,
        account_path: account_path_str,
        address_path: full_path,
        xpub: xpub.to_string(),
        pubkey: pubkey.to_string(),
        address,
    })
}
