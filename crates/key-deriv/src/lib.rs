//! Key derivation and address search for message signing.
//!
//! The hardware device only ever exports account level extended public keys. This crate derives
//! the receive addresses below such keys and searches them for the address a user wants to sign
//! with.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bip322_key_deriv::{KeyDeriver, find_path};
//!
//! let deriver = KeyDeriver::new(Network::Bitcoin);
//! let key = deriver.derive(&account_xpub, 0, AddressType::NativeSegwit)?;
//!
//! let found = find_path(&deriver, "bc1q...", &candidates, 50, |progress| {
//!     println!("{}%", progress.percent());
//! })?;
//! ```

pub mod address;
pub mod derive;
pub mod errors;
pub mod search;

pub use derive::{DerivedKey, KeyDeriver};
pub use errors::{DerivationError, DerivationResult, SearchError, SearchResult};
pub use search::{find_path, scan_grid, Candidate, FoundPath, SearchProgress};
