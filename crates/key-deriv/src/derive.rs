//! Derivation of receive addresses below an account extended public key.
//!
//! Derivation is unhardened at two levels: the receive chain (`0`) followed by the address index.
//! Only public key arithmetic is involved, no device is contacted.

use std::str::FromStr;

use bip322_primitives::{address::AddressType, constants::RECEIVE_CHAIN_INDEX};
use bitcoin::{
    bip32::{ChildNumber, Xpub},
    secp256k1::PublicKey,
    Address, Network, ScriptBuf, XOnlyPublicKey,
};
use secp256k1::SECP256K1;

use crate::{
    address::{address_for, p2wpkh_redeem_script},
    errors::{DerivationError, DerivationResult},
};

/// The key material and scripts of one receive address.
///
/// This type can only be constructed via [`KeyDeriver::derive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    address_type: AddressType,
    address: Address,
    script_pubkey: ScriptBuf,
    public_key: PublicKey,
    redeem_script: Option<ScriptBuf>,
}

impl DerivedKey {
    /// The address type this key was derived for.
    pub const fn address_type(&self) -> AddressType {
        self.address_type
    }

    /// The derived address.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// The output script of [`Self::address`].
    pub const fn script_pubkey(&self) -> &ScriptBuf {
        &self.script_pubkey
    }

    /// The full compressed public key at the derived path.
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The 32-byte taproot internal key, i.e. the compressed key without its parity byte.
    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.public_key.x_only_public_key().0
    }

    /// The P2WPKH redeem script for nested segwit keys.
    pub const fn redeem_script(&self) -> Option<&ScriptBuf> {
        self.redeem_script.as_ref()
    }

    /// The public key bytes a signer commits to: 32 bytes for taproot, 33 bytes otherwise.
    pub fn signing_key_bytes(&self) -> Vec<u8> {
        match self.address_type {
            AddressType::Taproot => self.internal_key().serialize().to_vec(),
            AddressType::Legacy | AddressType::Segwit | AddressType::NativeSegwit => {
                self.public_key.serialize().to_vec()
            }
        }
    }
}

/// Derives receive addresses for a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDeriver {
    network: Network,
}

impl KeyDeriver {
    /// Creates a deriver that encodes addresses for `network`.
    pub const fn new(network: Network) -> Self {
        Self { network }
    }

    /// The network addresses are encoded for.
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Parses a base58 extended public key.
    pub fn parse_xpub(xpub: &str) -> DerivationResult<Xpub> {
        Xpub::from_str(xpub).map_err(DerivationError::InvalidXpub)
    }

    /// Derives the receive address at `address_index` below the account key `xpub`.
    pub fn derive(
        &self,
        xpub: &Xpub,
        address_index: u32,
        address_type: AddressType,
    ) -> DerivationResult<DerivedKey> {
        let path = [
            ChildNumber::from_normal_idx(RECEIVE_CHAIN_INDEX)?,
            ChildNumber::from_normal_idx(address_index)?,
        ];
        let child = xpub.derive_pub(SECP256K1, &path)?;
        let public_key = child.public_key;

        let address = address_for(&public_key, address_type, self.network);
        let redeem_script = match address_type {
            AddressType::Segwit => Some(p2wpkh_redeem_script(&public_key)),
            AddressType::Legacy | AddressType::NativeSegwit | AddressType::Taproot => None,
        };

        Ok(DerivedKey {
            address_type,
            script_pubkey: address.script_pubkey(),
            address,
            public_key,
            redeem_script,
        })
    }

    /// Same as [`Self::derive`] but starting from a base58 extended public key.
    pub fn derive_from_str(
        &self,
        xpub: &str,
        address_index: u32,
        address_type: AddressType,
    ) -> DerivationResult<DerivedKey> {
        self.derive(&Self::parse_xpub(xpub)?, address_index, address_type)
    }
}
