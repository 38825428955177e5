//! The notices emitted by the Signing State Machine for whoever presents the session.

use bip322_primitives::types::SearchSpace;
use bip322_tx_template::EncodedSignature;
use bitcoin::bip32::DerivationPath;

use crate::signing::errors::FailureKind;

/// Outcomes of a transition the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningSignal {
    /// The derivation path of the requested address was found.
    Found {
        /// The full path of the signing key.
        path: DerivationPath,
    },

    /// The address was not found within `search_space`.
    Exhausted {
        /// The bounds that were searched.
        search_space: SearchSpace,
    },

    /// The current attempt failed.
    Failed(FailureKind),

    /// A signature was produced.
    Signed(EncodedSignature),
}
