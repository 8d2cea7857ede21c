//! Device seam: where account-level extended public keys come from

use async_trait::async_trait;
use bitcoin::bip32::DerivationPath;
use tracing::debug;

use crate::error::{Error, Result};
use crate::network::Network;
use crate::path::format_path;
use crate::xpub::ExtendedPublicKey;

/// Capability to fetch an extended public key for a hardened path.
///
/// Implementations own whatever handle they talk to; callers release it with
/// [`XpubProvider::close`] once they are done, on success and on failure.
#[async_trait]
pub trait XpubProvider: Send {
    /// Fetch the extended public key at `path` for `network`
    async fn get_xpub(&mut self, path: &DerivationPath, network: Network)
    -> Result<ExtendedPublicKey>;

    /// Release the underlying device
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Provider backed by an account key that was exported from the device earlier
#[derive(Debug, Clone)]
pub struct WatchOnlyProvider {
    xpub: ExtendedPublicKey,
}

impl WatchOnlyProvider {
    pub fn new(xpub: ExtendedPublicKey) -> Self {
        Self { xpub }
    }

    /// Parse the exported key, detecting its network from the version bytes
    pub fn parse(xpub: &str) -> Result<Self> {
        Ok(Self::new(xpub.parse()?))
    }
}

#[async_trait]
impl XpubProvider for WatchOnlyProvider {
    async fn get_xpub(
        &mut self,
        path: &DerivationPath,
        network: Network,
    ) -> Result<ExtendedPublicKey> {
        debug!("Serving exported key for {path}", path = format_path(path));

        if self.xpub.network() != network {
            return Err(Error::Device(format!(
                "Exported key belongs to {found}, requested {network}",
                found = self.xpub.network()
            )));
        }

        // Only the depth and last step are recorded in a serialized key
        let depth = path.into_iter().len();
        let last = path.into_iter().last().copied();
        if depth != usize::from(self.xpub.depth()) || last != Some(self.xpub.child_number()) {
            return Err(Error::Device(format!(
                "Exported key (depth {key_depth}, child {key_child}) was not derived at {path}",
                key_depth = self.xpub.depth(),
                key_child = self.xpub.child_number(),
                path = format_path(path)
            )));
        }

        Ok(self.xpub.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::account_path;
    use anyhow::Result;

    // BIP32 test vector 1, chain m/0'/1/2' (depth 3, child 2')
    const TV1_DEPTH3_TPUB: &str = "tpubDDRojdS4jYQXNugn4t2WLrZ7mjfAyoVQu7MLk4eurqFCbrc7cHLZX8W5YRS8ZskGR9k9t3PqVv68bVBjAyW4nWM9pTGRddt3GQftg6MVQsm";

    #[tokio::test]
    async fn test_watch_only_provider_serves_matching_path() -> Result<()> {
        let mut provider = WatchOnlyProvider::parse(TV1_DEPTH3_TPUB)?;
        let path = account_path(Network::Testnet, 2)?;

        let xpub = provider.get_xpub(&path, Network::Testnet).await?;
        assert_eq!(xpub.to_string(), TV1_DEPTH3_TPUB);

        provider.close().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_only_provider_rejects_other_account() -> Result<()> {
        let mut provider = WatchOnlyProvider::parse(TV1_DEPTH3_TPUB)?;
        let path = account_path(Network::Testnet, 0)?;

        let result = provider.get_xpub(&path, Network::Testnet).await;
        assert!(matches!(result, Err(Error::Device(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_only_provider_rejects_other_network() -> Result<()> {
        let mut provider = WatchOnlyProvider::parse(TV1_DEPTH3_TPUB)?;
        let path = account_path(Network::Regtest, 2)?;

        let result = provider.get_xpub(&path, Network::Regtest).await;
        assert!(matches!(result, Err(Error::Device(_))));
        Ok(())
    }
}
