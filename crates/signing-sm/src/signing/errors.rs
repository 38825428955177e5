//! Errors related to the state transitions in the Signing State Machine.

use std::fmt::Display;

use bip322_device::DeviceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signing::{events::SigningEvent, state::SigningState};

/// The classification of a failed signing attempt as presented to the user.
///
/// The kind decides where the session continues from: connectivity failures drop the session,
/// everything else returns to the input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The address is not one of the supported single-key kinds.
    UnsupportedAddressKind,
    /// The device could not be reached or did not answer in time.
    Connectivity,
    /// The user declined the request on the device.
    UserRejected,
    /// Anything else.
    Unknown,
}

impl FailureKind {
    /// Whether the session has to reconnect before continuing.
    pub const fn requires_reconnect(&self) -> bool {
        matches!(self, FailureKind::Connectivity)
    }
}

impl From<&DeviceError> for FailureKind {
    fn from(err: &DeviceError) -> Self {
        if err.is_user_rejection() {
            FailureKind::UserRejected
        } else if err.is_connectivity() {
            FailureKind::Connectivity
        } else {
            FailureKind::Unknown
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind_str = match self {
            FailureKind::UnsupportedAddressKind => "unsupported address kind",
            FailureKind::Connectivity => "device connectivity",
            FailureKind::UserRejected => "rejected by user",
            FailureKind::Unknown => "unknown",
        };
        write!(f, "{}", kind_str)
    }
}

/// Errors that can occur in the Signing State Machine.
#[derive(Debug, Clone, Error)]
pub enum SigningSMError {
    /// An invalid event was received for the current state.
    #[error("Received invalid event {event} in state {state}; reason: {reason:?}")]
    InvalidEvent {
        /// The state in which the event was received.
        state: String,
        /// The invalid event that was received.
        event: String,
        /// The reason for the invalidity.
        reason: Option<String>,
    },

    /// An event was rejected in the current state.
    #[error("Event rejected in state: {state}, reason: {reason}")]
    Rejected {
        /// The state in which the event was rejected.
        state: Box<SigningState>,
        /// The reason for the rejection.
        reason: String,
    },
}

impl SigningSMError {
    /// Creates an [`SigningSMError::InvalidEvent`] error.
    pub fn invalid_event(
        state: &SigningState,
        event: &SigningEvent,
        reason: Option<String>,
    ) -> Self {
        SigningSMError::InvalidEvent {
            state: state.to_string(),
            event: event.to_string(),
            reason,
        }
    }

    /// Creates an [`SigningSMError::Rejected`] error.
    pub fn rejected(state: SigningState, reason: impl Into<String>) -> Self {
        SigningSMError::Rejected {
            state: Box::new(state),
            reason: reason.into(),
        }
    }
}

/// The result type for operations in the Signing State Machine.
pub type SigningSMResult<T> = Result<T, SigningSMError>;
