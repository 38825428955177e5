//! Wallet policies registered with the device when signing PSBTs.
//!
//! A policy is a descriptor template with `@i` placeholders plus the key information each
//! placeholder stands for. Only single-key policies are used here.

use std::fmt;

use bip322_primitives::address::AddressType;
use bitcoin::bip32::{ChildNumber, DerivationPath, Fingerprint, Xpub};
use serde::{Deserialize, Serialize};

/// Descriptor template for nested segwit.
pub const SH_WPKH_TEMPLATE: &str = "sh(wpkh(@0/**))";

/// Descriptor template for native segwit.
pub const WPKH_TEMPLATE: &str = "wpkh(@0/**)";

/// Descriptor template for taproot key path spends.
pub const TR_TEMPLATE: &str = "tr(@0/**)";

/// An account key together with its origin, rendered as `[fingerprint/path]xpub`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Fingerprint of the device's master key.
    pub fingerprint: Fingerprint,

    /// Path of the account key below the master key.
    pub account_path: DerivationPath,

    /// The account key.
    pub xpub: Xpub,
}

impl fmt::Display for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: &[ChildNumber] = self.account_path.as_ref();

        write!(f, "[{}", self.fingerprint)?;
        for child in children {
            write!(f, "/{child}")?;
        }
        write!(f, "]{}", self.xpub)
    }
}

/// A wallet policy as understood by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPolicy {
    /// Display name; empty for the default policies.
    pub name: String,

    /// Descriptor template with key placeholders.
    pub descriptor_template: String,

    /// Key information, indexed by placeholder.
    pub keys: Vec<KeyInfo>,
}

impl WalletPolicy {
    /// The standard single-key policy for `address_type`.
    ///
    /// Legacy addresses have no policy since they are signed as plain messages.
    pub fn default_for(address_type: AddressType, key: KeyInfo) -> Option<Self> {
        let template = match address_type {
            AddressType::Legacy => return None,
            AddressType::Segwit => SH_WPKH_TEMPLATE,
            AddressType::NativeSegwit => WPKH_TEMPLATE,
            AddressType::Taproot => TR_TEMPLATE,
        };

        Some(Self {
            name: String::new(),
            descriptor_template: template.to_string(),
            keys: vec![key],
        })
    }

    /// The address type whose outputs this policy spends, if it is one of the standard ones.
    pub fn address_type(&self) -> Option<AddressType> {
        match self.descriptor_template.as_str() {
            SH_WPKH_TEMPLATE => Some(AddressType::Segwit),
            WPKH_TEMPLATE => Some(AddressType::NativeSegwit),
            TR_TEMPLATE => Some(AddressType::Taproot),
            _ => None,
        }
    }
}
