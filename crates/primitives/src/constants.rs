//! Constants that fix the shape of the derivation tree searched for a signing address.
//!
//! Changing any of these changes which addresses can be found at all, so they must be known at
//! compile-time.

/// The number of accounts scanned (inclusive upper bound) before the user is asked to expand the
/// search.
pub const INITIAL_ACCOUNT_BOUND: u32 = 10;

/// The number of receive addresses scanned per account (inclusive upper bound) before the user is
/// asked to expand the search.
pub const INITIAL_ADDRESS_INDEX_BOUND: u32 = 50;

/// The external (receive) chain. Change addresses are never searched.
pub const RECEIVE_CHAIN_INDEX: u32 = 0;

/// Depth of an account path: `m/purpose'/coin_type'/account'`.
pub const ACCOUNT_PATH_DEPTH: usize = 3;

/// Depth of a full address path: `m/purpose'/coin_type'/account'/chain/index`.
pub const FULL_PATH_DEPTH: usize = 5;

/// The largest index a BIP-32 child number can carry (hardened or not).
pub const MAX_CHILD_INDEX: u32 = (1 << 31) - 1;
