//! Context for the Signing State Machine.

use bitcoin::bip32::Fingerprint;

use crate::signing::errors::FailureKind;

/// Execution context of a signing session.
///
/// Lives as long as the session and survives individual signing attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SigningSMCtx {
    /// Master fingerprint of the connected device, known once the handshake succeeds.
    pub fingerprint: Option<Fingerprint>,
    /// The most recent failure surfaced to the user.
    pub last_failure: Option<FailureKind>,
}

impl SigningSMCtx {
    /// Returns the master fingerprint of the connected device.
    pub const fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    /// Returns the most recent failure surfaced to the user.
    pub const fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure
    }
}
