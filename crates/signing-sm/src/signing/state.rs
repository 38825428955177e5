//! The states of the Signing State Machine.

use std::fmt::Display;

use bip322_key_deriv::FoundPath;
use bip322_primitives::{address::AddressType, types::SearchSpace};
use bip322_tx_template::{EncodedSignature, UnsignedTemplate};

/// What the user asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningRequest {
    /// The address to sign with, as entered.
    pub address: String,
    /// The message to sign.
    pub message: String,
    /// The classification of `address`.
    pub address_type: AddressType,
}

/// How the device is asked to sign once the derivation path is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingSignature {
    /// A legacy signed-message signature over the raw message.
    Message,
    /// A signature over the `to_sign` template.
    Template(Box<UnsignedTemplate>),
}

/// The states of a signing session.
///
/// A path that has been found and a failure that has been surfaced are not states of their own:
/// they are announced through signals while the machine moves on to the state the session
/// continues from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SigningState {
    /// No usable session with the device.
    #[default]
    Disconnected,

    /// The handshake succeeded and the first liveness probe is pending.
    Connected,

    /// Waiting for the user to submit an address and a message.
    AwaitingInput,

    /// Searching for the derivation path of the requested address.
    Searching {
        /// The request being served.
        request: SigningRequest,
        /// The bounds of the search in flight.
        search_space: SearchSpace,
    },

    /// The search finished without finding the address.
    SearchExhausted {
        /// The request being served.
        request: SigningRequest,
        /// The bounds that were searched.
        search_space: SearchSpace,
    },

    /// The device has been asked to sign and the user has to approve on the device.
    AwaitingDeviceApproval {
        /// The request being served.
        request: SigningRequest,
        /// The bounds the path was found within.
        search_space: SearchSpace,
        /// Where the address was found.
        found: Box<FoundPath>,
        /// What the device was asked to sign.
        pending: PendingSignature,
    },

    /// A signature has been produced.
    Signed {
        /// The request that was served.
        request: SigningRequest,
        /// The encoded signature.
        signature: EncodedSignature,
    },
}

impl SigningState {
    /// The request currently being served, if any.
    pub const fn request(&self) -> Option<&SigningRequest> {
        match self {
            SigningState::Searching { request, .. }
            | SigningState::SearchExhausted { request, .. }
            | SigningState::AwaitingDeviceApproval { request, .. }
            | SigningState::Signed { request, .. } => Some(request),
            SigningState::Disconnected
            | SigningState::Connected
            | SigningState::AwaitingInput => None,
        }
    }

    /// The bounds of the current attempt's search, if one has started.
    pub const fn search_space(&self) -> Option<SearchSpace> {
        match self {
            SigningState::Searching { search_space, .. }
            | SigningState::SearchExhausted { search_space, .. }
            | SigningState::AwaitingDeviceApproval { search_space, .. } => Some(*search_space),
            SigningState::Disconnected
            | SigningState::Connected
            | SigningState::AwaitingInput
            | SigningState::Signed { .. } => None,
        }
    }

    /// Whether the session holds a live connection to the device.
    pub const fn is_connected(&self) -> bool {
        !matches!(self, SigningState::Disconnected)
    }
}

impl Display for SigningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state_str = match self {
            SigningState::Disconnected => "Disconnected",
            SigningState::Connected => "Connected",
            SigningState::AwaitingInput => "AwaitingInput",
            SigningState::Searching { .. } => "Searching",
            SigningState::SearchExhausted { .. } => "SearchExhausted",
            SigningState::AwaitingDeviceApproval { .. } => "AwaitingDeviceApproval",
            SigningState::Signed { .. } => "Signed",
        };
        write!(f, "{}", state_str)
    }
}
