//! The duties that need to be performed in the Signing State Machine in response to the state
//! transitions.

use bip322_device::WalletPolicy;
use bip322_primitives::{address::AddressType, types::SearchSpace};
use bitcoin::{bip32::DerivationPath, Psbt};

/// The duties that need to be performed to drive the Signing State Machine forward.
///
/// Each duty that talks to the device reports back with exactly one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningDuty {
    /// Close any open session and perform a fresh handshake.
    ///
    /// Reports [`HandshakeSucceeded`](crate::signing::events::SigningEvent::HandshakeSucceeded)
    /// or [`HandshakeFailed`](crate::signing::events::SigningEvent::HandshakeFailed).
    Connect,

    /// Probe the device with a cheap request bounded by the liveness timeout.
    ///
    /// Reports `LivenessConfirmed` or `LivenessLost`.
    ProbeLiveness,

    /// Close the current session, it is no longer usable.
    CloseSession,

    /// Export the account keys and search them for `address`.
    ///
    /// Reports `SearchCompleted`, `LivenessLost` when the leading probe fails or `Failed`.
    SearchPath {
        /// The address to look for.
        address: String,
        /// Its classification.
        address_type: AddressType,
        /// The bounds to search within.
        search_space: SearchSpace,
        /// Whether a liveness probe has to succeed before the first export.
        probe_liveness: bool,
    },

    /// Ask the device to sign the `to_sign` PSBT under `policy`.
    ///
    /// Reports `PsbtSigned` or `Failed`.
    SignPsbt {
        /// The PSBT to sign.
        psbt: Box<Psbt>,
        /// The wallet policy the PSBT is signed under.
        policy: WalletPolicy,
    },

    /// Ask the device for a legacy signed-message signature.
    ///
    /// Reports `MessageSigned` or `Failed`.
    SignMessage {
        /// The message to sign.
        message: String,
        /// The path of the signing key.
        path: DerivationPath,
    },
}
