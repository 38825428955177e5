//! The events that are relevant to the Signing State Machine.
//!
//! Some events come from the user (connecting, submitting input, expanding or abandoning a
//! search), the rest report the outcome of duties executed by the driver.

use std::fmt::Display;

use bip322_device::DeviceSignature;
use bip322_key_deriv::FoundPath;
use bitcoin::bip32::Fingerprint;

use crate::signing::errors::FailureKind;

/// The external events that affect the Signing State Machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningEvent {
    /// The user asked to (re)connect to the device.
    ///
    /// Accepted in every state. Any request in flight is dropped.
    ConnectRequested,

    /// The handshake with the device succeeded.
    HandshakeSucceeded {
        /// The master fingerprint reported by the device.
        fingerprint: Fingerprint,
    },

    /// The handshake with the device failed.
    HandshakeFailed {
        /// Why the handshake failed.
        reason: String,
    },

    /// The device answered a liveness probe in time.
    LivenessConfirmed,

    /// The device did not answer a liveness probe in time.
    LivenessLost {
        /// Why the probe failed.
        reason: String,
    },

    /// The user submitted an address and a message to sign.
    InputSubmitted {
        /// The address to sign with.
        address: String,
        /// The message to sign.
        message: String,
    },

    /// The derivation path search finished.
    SearchCompleted {
        /// Where the address was found, if it was.
        found: Option<Box<FoundPath>>,
    },

    /// The user asked to search again over a larger space.
    ExpandSearch,

    /// The user gave up on the current request.
    Abandon,

    /// The device returned signatures for the `to_sign` template.
    PsbtSigned {
        /// The signatures keyed by input index.
        signatures: Vec<(usize, DeviceSignature)>,
    },

    /// The device returned a legacy message signature.
    MessageSigned {
        /// The base64 encoded recoverable signature.
        signature: String,
    },

    /// A duty executed by the driver failed.
    Failed {
        /// The classification of the failure.
        kind: FailureKind,
        /// A description of the failure.
        reason: String,
    },

    /// The user acknowledged the signature and wants to sign something else.
    Reset,
}

impl Display for SigningEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_str = match self {
            SigningEvent::ConnectRequested => "ConnectRequested".to_string(),
            SigningEvent::HandshakeSucceeded { fingerprint } => {
                format!("HandshakeSucceeded({fingerprint})")
            }
            SigningEvent::HandshakeFailed { .. } => "HandshakeFailed".to_string(),
            SigningEvent::LivenessConfirmed => "LivenessConfirmed".to_string(),
            SigningEvent::LivenessLost { .. } => "LivenessLost".to_string(),
            SigningEvent::InputSubmitted { address, .. } => format!("InputSubmitted({address})"),
            SigningEvent::SearchCompleted { found } => match found {
                Some(found) => format!("SearchCompleted({})", found.path),
                None => "SearchCompleted(not found)".to_string(),
            },
            SigningEvent::ExpandSearch => "ExpandSearch".to_string(),
            SigningEvent::Abandon => "Abandon".to_string(),
            SigningEvent::PsbtSigned { signatures } => {
                format!("PsbtSigned({} signatures)", signatures.len())
            }
            SigningEvent::MessageSigned { .. } => "MessageSigned".to_string(),
            SigningEvent::Failed { kind, .. } => format!("Failed({kind})"),
            SigningEvent::Reset => "Reset".to_string(),
        };

        write!(f, "{}", display_str)
    }
}
