//! Errors raised while deriving keys or searching for an address.

use bip322_primitives::errors::{AddressError, PathError};
use bitcoin::bip32;
use thiserror::Error;

/// Error type for key derivation operations.
#[derive(Debug, Error)]
pub enum DerivationError {
    /// The extended public key could not be parsed.
    #[error("invalid extended public key: {0}")]
    InvalidXpub(bip32::Error),

    /// BIP32 derivation failed.
    #[error("BIP32 derivation error: {0}")]
    Bip32(#[from] bip32::Error),

    /// A derivation path could not be built.
    #[error("derivation path error: {0}")]
    Path(#[from] PathError),
}

/// Result alias for derivation operations.
pub type DerivationResult<T> = Result<T, DerivationError>;

/// Error type for the address search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The target address is not one that can be searched for.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// A candidate key could not be derived from.
    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

/// Result alias for the address search.
pub type SearchResult<T> = Result<T, SearchError>;
