use bitcoin::bip32::{ChildNumber, DerivationPath};

use crate::error::{Error, Result};
use crate::network::{Network, NetworkSpec};

/// BIP44 purpose field
pub const PURPOSE: u32 = 44;

/// Build the account-level path `m/44'/coin_type'/account'` for a network name
pub fn build_path(network: &str, account: u32) -> Result<(DerivationPath, &'static NetworkSpec)> {
    let network: Network = network.parse()?;
    let path = account_path(network, account)?;
    Ok((path, network.spec()))
}

/// Build the account-level path for an already parsed network
pub fn account_path(network: Network, account: u32) -> Result<DerivationPath> {
    let account_child =
        ChildNumber::from_hardened_idx(account).map_err(|_| Error::InvalidAccount(account))?;

    Ok(DerivationPath::from(vec![
        ChildNumber::Hardened { index: PURPOSE },
        ChildNumber::Hardened {
            index: network.spec().coin_type,
        },
        account_child,
    ]))
}

/// Render a path as `m/44'/5353'/0'/0/0`
pub fn format_path(path: &DerivationPath) -> String {
    let mut path_str = "m".to_string();
    for child in path.into_iter() {
        path_str.push('/');
        match child {
            ChildNumber::Hardened { index } => {
                path_str.push_str(&index.to_string());
                path_str.push('\'');
            }
            ChildNumber::Normal { index } => path_str.push_str(&index.to_string()),
        }
    }
    path_str
}

/// Parse a BIP32 path string; hardened components may use `'` or `h`
pub fn parse_derivation_path(path: &str) -> Result<DerivationPath> {
    let path_str = match path {
        "m" => "",
        _ => path
            .strip_prefix("m/")
            .ok_or_else(|| Error::InvalidPath(format!("{path}: must start with 'm/'")))?,
    };

    let mut components = Vec::new();
    for component in path_str.split('/') {
        if component.is_empty() {
            continue;
        }

        let (number_str, hardened) = match component
            .strip_suffix('\'')
            .or_else(|| component.strip_suffix('h'))
        {
            Some(stripped) => (stripped, true),
            None => (component, false),
        };

        let number: u32 = number_str
            .parse()
            .map_err(|_| Error::InvalidPath(format!("{path}: bad component '{component}'")))?;

        let child = if hardened {
            ChildNumber::from_hardened_idx(number)
        } else {
            ChildNumber::from_normal_idx(number)
        }
        .map_err(|_| Error::InvalidPath(format!("{path}: index {number} out of range")))?;

        components.push(child);
    }

    Ok(DerivationPath::from(components))
}
