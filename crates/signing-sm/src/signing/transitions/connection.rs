use bitcoin::bip32::Fingerprint;
use tracing::{debug, info};

use crate::{
    signing::{
        duties::SigningDuty,
        errors::{FailureKind, SigningSMError, SigningSMResult},
        events::SigningEvent,
        machine::{SigningSM, SigningSMOutput},
        state::SigningState,
    },
    state_machine::SMOutput,
};

impl SigningSM {
    /// Processes a request to (re)connect to the device.
    ///
    /// Accepted in every state: whatever was in flight is dropped and the driver replaces the
    /// current session with a fresh one.
    pub(crate) fn process_connect_requested(&mut self) -> SigningSMResult<SigningSMOutput> {
        if let Some(request) = self.state.request() {
            debug!(address = %request.address, "dropping request for reconnection");
        }

        self.state = SigningState::Disconnected;
        self.context.fingerprint = None;

        Ok(SMOutput::with_duties(vec![SigningDuty::Connect]))
    }

    /// Processes a successful handshake.
    pub(crate) fn process_handshake_succeeded(
        &mut self,
        fingerprint: Fingerprint,
    ) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::Disconnected => {
                info!(%fingerprint, "connected to device");

                self.context.fingerprint = Some(fingerprint);
                self.state = SigningState::Connected;

                Ok(SMOutput::with_duties(vec![SigningDuty::ProbeLiveness]))
            }
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::HandshakeSucceeded { fingerprint }.to_string(),
                reason: None,
            }),
        }
    }

    /// Processes a failed handshake.
    pub(crate) fn process_handshake_failed(
        &mut self,
        reason: String,
    ) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::Disconnected => Ok(self.fail(FailureKind::Connectivity, reason)),
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::HandshakeFailed { reason }.to_string(),
                reason: None,
            }),
        }
    }

    /// Processes a liveness probe that was answered in time.
    pub(crate) fn process_liveness_confirmed(&mut self) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::Connected => {
                self.state = SigningState::AwaitingInput;

                Ok(SMOutput::new())
            }
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::LivenessConfirmed.to_string(),
                reason: Some("no liveness probe is pending".to_string()),
            }),
        }
    }

    /// Processes a liveness probe that failed or timed out.
    pub(crate) fn process_liveness_lost(
        &mut self,
        reason: String,
    ) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::Connected | SigningState::Searching { .. } => {
                Ok(self.fail(FailureKind::Connectivity, reason))
            }
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::LivenessLost { reason }.to_string(),
                reason: Some("no liveness probe is pending".to_string()),
            }),
        }
    }
}
