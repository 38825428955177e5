//! BIP-44 style derivation paths for the supported address types.
//!
//! Every signing key lives at `m/purpose'/coin_type'/account'/0/index` where `purpose` is
//! determined by the [`AddressType`] and `coin_type` by the network.

use std::fmt;

use bitcoin::{
    bip32::{ChildNumber, DerivationPath},
    Network,
};

use crate::{
    address::AddressType,
    constants::{ACCOUNT_PATH_DEPTH, FULL_PATH_DEPTH, RECEIVE_CHAIN_INDEX},
    errors::{PathError, PathResult},
};

/// The BIP-43 purpose used for an address type.
pub const fn purpose(address_type: AddressType) -> u32 {
    match address_type {
        AddressType::Legacy => 44,
        AddressType::Segwit => 49,
        AddressType::NativeSegwit => 84,
        AddressType::Taproot => 86,
    }
}

/// The SLIP-44 coin type used on a network.
///
/// Every test network shares coin type `1`.
pub const fn coin_type(network: Network) -> u32 {
    match network {
        Network::Bitcoin => 0,
        _ => 1,
    }
}

/// The hardened `purpose'/coin_type'` prefix shared by every account of an address type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPrefix {
    purpose: u32,
    coin_type: u32,
}

impl DerivationPrefix {
    /// Creates the prefix for the given address type on the given network.
    pub const fn new(address_type: AddressType, network: Network) -> Self {
        Self {
            purpose: purpose(address_type),
            coin_type: coin_type(network),
        }
    }

    /// The BIP-43 purpose.
    pub const fn purpose(&self) -> u32 {
        self.purpose
    }

    /// The SLIP-44 coin type.
    pub const fn coin_type(&self) -> u32 {
        self.coin_type
    }

    /// Appends a hardened `account` to this prefix.
    pub fn account(&self, account: u32) -> PathResult<DerivationPath> {
        Ok(DerivationPath::from(vec![
            ChildNumber::from_hardened_idx(self.purpose)?,
            ChildNumber::from_hardened_idx(self.coin_type)?,
            ChildNumber::from_hardened_idx(account)?,
        ]))
    }
}

impl fmt::Display for DerivationPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m/{}'/{}'", self.purpose, self.coin_type)
    }
}

/// Returns `m/purpose'/coin_type'/account'` for the given address type.
pub fn account_path(
    address_type: AddressType,
    network: Network,
    account: u32,
) -> PathResult<DerivationPath> {
    DerivationPrefix::new(address_type, network).account(account)
}

/// Extends an account path with the receive chain and `address_index`.
pub fn full_path(account_path: &DerivationPath, address_index: u32) -> PathResult<DerivationPath> {
    Ok(account_path.extend([
        ChildNumber::from_normal_idx(RECEIVE_CHAIN_INDEX)?,
        ChildNumber::from_normal_idx(address_index)?,
    ]))
}

/// Drops the chain and index components of a full path, leaving the account path.
///
/// Only paths of exactly [`FULL_PATH_DEPTH`] are accepted.
pub fn account_path_of(full_path: &DerivationPath) -> PathResult<DerivationPath> {
    let components: &[ChildNumber] = full_path.as_ref();

    if components.len() != FULL_PATH_DEPTH {
        return Err(PathError::UnexpectedDepth {
            path: full_path.clone(),
            depth: components.len(),
            expected: FULL_PATH_DEPTH,
        });
    }

    Ok(DerivationPath::from(&components[..ACCOUNT_PATH_DEPTH]))
}
