//! Brute-force search for the derivation path of an address.
//!
//! Hardware devices do not reveal which path an address was derived from, so the receive
//! addresses of every candidate account are derived and compared with the target until one
//! matches. Accounts are scanned in the order supplied and the addresses of one account are
//! exhausted before moving on to the next, so a lower account always wins over a lower address
//! index in a higher account.

use bip322_primitives::{
    address::{classify_address, parse_address, AddressType},
    paths::full_path,
    types::Progress,
};
use bitcoin::bip32::{DerivationPath, Xpub};
use tracing::{debug, trace};

use crate::{
    derive::{DerivedKey, KeyDeriver},
    errors::{DerivationError, SearchResult},
};

/// Share of the overall progress attributed to fetching account keys from the device.
///
/// The remainder is attributed to scanning the addresses below those keys.
pub const ACCOUNT_PHASE_WEIGHT: f64 = 0.8;

/// An account level extended public key exported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The hardened account number.
    pub account: u32,

    /// The path the key was exported at (`m/purpose'/coin_type'/account'`).
    pub account_path: DerivationPath,

    /// The exported key.
    pub xpub: Xpub,
}

/// The location of an address found by [`find_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundPath {
    /// The account the address belongs to.
    pub account: u32,

    /// The receive address index within the account.
    pub address_index: u32,

    /// The path of the account key.
    pub account_path: DerivationPath,

    /// The full path of the address key.
    pub path: DerivationPath,

    /// The account key the address was derived from.
    pub account_xpub: Xpub,

    /// The derived key and scripts.
    pub key: DerivedKey,
}

impl FoundPath {
    /// The address type of the found key.
    pub const fn address_type(&self) -> AddressType {
        self.key.address_type()
    }
}

/// Maps the two search phases onto a single progress fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    accounts: u64,
}

impl SearchProgress {
    /// Creates a tracker for a search over `accounts` candidate accounts.
    pub const fn new(accounts: u64) -> Self {
        Self { accounts }
    }

    /// Progress after `fetched` account keys have been exported by the device.
    pub fn account_fetched(&self, fetched: u64) -> Progress {
        Progress::within(0.0, ACCOUNT_PHASE_WEIGHT, fetched, self.accounts)
    }

    /// Progress after the addresses of `scanned` accounts have been compared.
    pub fn candidate_scanned(&self, scanned: u64) -> Progress {
        Progress::within(
            ACCOUNT_PHASE_WEIGHT,
            1.0 - ACCOUNT_PHASE_WEIGHT,
            scanned,
            self.accounts,
        )
    }
}

/// Visits `(slot, index)` for every slot in `0..slots` and every index in
/// `0..=address_index_bound`, slot-major, stopping at the first visit that yields a value.
///
/// `on_slot_done` is called after every slot whose indices were all visited without a hit.
pub fn scan_grid<T, E>(
    slots: usize,
    address_index_bound: u32,
    mut visit: impl FnMut(usize, u32) -> Result<Option<T>, E>,
    mut on_slot_done: impl FnMut(usize),
) -> Result<Option<(usize, u32, T)>, E> {
    for slot in 0..slots {
        for index in 0..=address_index_bound {
            if let Some(hit) = visit(slot, index)? {
                return Ok(Some((slot, index, hit)));
            }
        }

        on_slot_done(slot);
    }

    Ok(None)
}

/// Searches the receive addresses of `candidates` for `target`.
///
/// Returns `Ok(None)` when the target is not within `0..=address_index_bound` of any candidate.
/// Derived addresses are compared with `target` as strings, byte for byte, so a target spelled in
/// a different letter case than the encoder emits is never matched.
/// `on_progress` is called after each candidate is exhausted and once more on a match, with
/// fractions in the `[ACCOUNT_PHASE_WEIGHT, 1]` window.
pub fn find_path(
    deriver: &KeyDeriver,
    target: &str,
    candidates: &[Candidate],
    address_index_bound: u32,
    mut on_progress: impl FnMut(Progress),
) -> SearchResult<Option<FoundPath>> {
    let target_str = target;
    let target = parse_address(target_str, deriver.network())?;
    let address_type = classify_address(&target)?;
    let progress = SearchProgress::new(candidates.len() as u64);

    debug!(%target, %address_type, candidates = candidates.len(), %address_index_bound, "scanning candidate accounts");

    let hit = scan_grid(
        candidates.len(),
        address_index_bound,
        |slot, index| {
            let key = deriver.derive(&candidates[slot].xpub, index, address_type)?;

            let matched = key.address().to_string() == target_str;

            Ok::<_, DerivationError>(matched.then_some(key))
        },
        |slot| {
            trace!(account = candidates[slot].account, "account exhausted");
            on_progress(progress.candidate_scanned(slot as u64 + 1));
        },
    )?;

    let Some((slot, address_index, key)) = hit else {
        debug!(%target, "address not found within bounds");
        return Ok(None);
    };

    let candidate = &candidates[slot];
    let path = full_path(&candidate.account_path, address_index).map_err(DerivationError::from)?;

    debug!(%target, %path, "address found");
    on_progress(Progress::DONE);

    Ok(Some(FoundPath {
        account: candidate.account,
        address_index,
        account_path: candidate.account_path.clone(),
        path,
        account_xpub: candidate.xpub,
        key,
    }))
}
