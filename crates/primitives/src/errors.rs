//! Error types shared by the address and path helpers.

use bitcoin::bip32::{self, DerivationPath};
use thiserror::Error;

/// Errors raised while interpreting a user supplied address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The address does not decode, belongs to another network, or is not one of the four
    /// supported encodings.
    #[error("unsupported address {address}: {reason}")]
    UnsupportedAddressKind {
        /// The address as supplied by the user.
        address: String,
        /// Why the address was rejected.
        reason: String,
    },
}

impl AddressError {
    pub(crate) fn unsupported(address: &str, reason: impl ToString) -> Self {
        Self::UnsupportedAddressKind {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for address operations.
pub type AddressResult<T> = Result<T, AddressError>;

/// Errors raised while building or slicing derivation paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// A path component is out of range for BIP-32.
    #[error("invalid child index: {0}")]
    InvalidIndex(#[from] bip32::Error),

    /// The path does not have the `m/purpose'/coin_type'/account'/chain/index` shape.
    #[error("expected a path of depth {expected}, got {path} (depth {depth})")]
    UnexpectedDepth {
        /// The offending path.
        path: DerivationPath,
        /// Its depth.
        depth: usize,
        /// The only depth accepted.
        expected: usize,
    },
}

/// Result alias for path operations.
pub type PathResult<T> = Result<T, PathError>;
