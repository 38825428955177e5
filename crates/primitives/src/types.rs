//! Types shared by the path searcher, the signing state machine and its driver.

use serde::{Deserialize, Serialize};

use crate::constants::{INITIAL_ACCOUNT_BOUND, INITIAL_ADDRESS_INDEX_BOUND, MAX_CHILD_INDEX};

/// The rectangle of `(account, address_index)` pairs scanned when looking for an address.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchSpace {
    /// The largest account number scanned.
    pub account_bound: u32,

    /// The largest receive address index scanned in every account.
    pub address_index_bound: u32,
}

impl SearchSpace {
    /// Creates a new search space with the given inclusive bounds.
    pub const fn new(account_bound: u32, address_index_bound: u32) -> Self {
        Self {
            account_bound,
            address_index_bound,
        }
    }

    /// Returns a search space with both bounds doubled.
    ///
    /// A zero bound grows to one and neither bound exceeds the largest BIP-32 index, so the result
    /// always covers `self`.
    pub fn doubled(&self) -> Self {
        let grow = |bound: u32| bound.saturating_mul(2).clamp(1, MAX_CHILD_INDEX);

        Self {
            account_bound: grow(self.account_bound),
            address_index_bound: grow(self.address_index_bound),
        }
    }

    /// Whether every pair in `other` is also scanned by `self`.
    pub const fn covers(&self, other: &SearchSpace) -> bool {
        self.account_bound >= other.account_bound
            && self.address_index_bound >= other.address_index_bound
    }

    /// The number of accounts scanned.
    pub const fn account_count(&self) -> u64 {
        self.account_bound as u64 + 1
    }

    /// The number of addresses scanned per account.
    pub const fn address_count(&self) -> u64 {
        self.address_index_bound as u64 + 1
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new(INITIAL_ACCOUNT_BOUND, INITIAL_ADDRESS_INDEX_BOUND)
    }
}

/// Fraction of a long running operation that has completed, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Progress(f64);

impl Progress {
    /// Nothing done yet.
    pub const ZERO: Progress = Progress(0.0);

    /// Everything done.
    pub const DONE: Progress = Progress(1.0);

    /// Creates a new progress value, clamping it into `[0, 1]`.
    ///
    /// `NaN` is treated as no progress.
    pub fn new(fraction: f64) -> Self {
        if fraction.is_nan() {
            return Self::ZERO;
        }

        Self(fraction.clamp(0.0, 1.0))
    }

    /// Progress of `done` out of `total` steps, scaled into the `[start, start + span]` window.
    pub fn within(start: f64, span: f64, done: u64, total: u64) -> Self {
        let fraction = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };

        Self::new(start + span * fraction)
    }

    /// The fraction as a float.
    pub const fn fraction(&self) -> f64 {
        self.0
    }

    /// The fraction as a whole percentage.
    pub fn percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}
