//! Errors reported by a device session.

use std::{fmt, time::Duration};

use thiserror::Error;

/// An APDU status word as returned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(pub u16);

impl StatusWord {
    /// The command succeeded.
    pub const OK: StatusWord = StatusWord(0x9000);

    /// The user declined the request on the device.
    pub const DENIED_BY_USER: StatusWord = StatusWord(0x6985);

    /// The request was malformed or referenced data the device cannot handle.
    pub const INCORRECT_DATA: StatusWord = StatusWord(0x6a80);

    /// The device is locked or the expected app is not open.
    pub const LOCKED_DEVICE: StatusWord = StatusWord(0x5515);
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Failure of a single device request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device could not be reached or the session is no longer usable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The device did not answer in time.
    #[error("device did not respond within {0:?}")]
    Timeout(Duration),

    /// The device answered with an error status.
    #[error("device returned status {status}")]
    Status {
        /// The status word returned.
        status: StatusWord,
    },

    /// The device answered with something that could not be interpreted.
    #[error("unexpected device response: {0}")]
    UnexpectedResponse(String),
}

impl DeviceError {
    /// Whether the user explicitly declined the request on the device.
    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            DeviceError::Status {
                status: StatusWord::DENIED_BY_USER
            }
        )
    }

    /// Whether the failure means the session must be re-established.
    pub fn is_connectivity(&self) -> bool {
        match self {
            DeviceError::Transport(_) | DeviceError::Timeout(_) => true,
            DeviceError::Status { status } => *status == StatusWord::LOCKED_DEVICE,
            DeviceError::UnexpectedResponse(_) => false,
        }
    }
}

/// Result alias for device requests.
pub type DeviceResult<T> = Result<T, DeviceError>;
