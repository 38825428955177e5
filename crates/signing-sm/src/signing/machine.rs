//! The Signing State Machine (SSM).
//!
//! Responsible for driving a signing session by reacting to events and producing the duties the
//! driver has to execute and the signals the user has to see.

use std::sync::Arc;

use crate::{
    signing::{
        config::SigningSMCfg, context::SigningSMCtx, duties::SigningDuty,
        errors::SigningSMError, events::SigningEvent, signals::SigningSignal,
        state::SigningState,
    },
    state_machine::{SMOutput, StateMachine},
};

/// The State Machine that tracks a signing session from the handshake to the final signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningSM {
    /// Context associated with this session.
    pub context: SigningSMCtx,
    /// The current state of the session.
    pub state: SigningState,
}

impl StateMachine for SigningSM {
    type Config = Arc<SigningSMCfg>;
    type Duty = SigningDuty;
    type OutgoingSignal = SigningSignal;
    type Event = SigningEvent;
    type Error = SigningSMError;

    fn process_event(
        &mut self,
        cfg: Self::Config,
        event: Self::Event,
    ) -> Result<SMOutput<Self::Duty, Self::OutgoingSignal>, Self::Error> {
        match event {
            SigningEvent::ConnectRequested => self.process_connect_requested(),
            SigningEvent::HandshakeSucceeded { fingerprint } => {
                self.process_handshake_succeeded(fingerprint)
            }
            SigningEvent::HandshakeFailed { reason } => self.process_handshake_failed(reason),
            SigningEvent::LivenessConfirmed => self.process_liveness_confirmed(),
            SigningEvent::LivenessLost { reason } => self.process_liveness_lost(reason),
            SigningEvent::InputSubmitted { address, message } => {
                self.process_input_submitted(cfg, address, message)
            }
            SigningEvent::SearchCompleted { found } => self.process_search_completed(found),
            SigningEvent::ExpandSearch => self.process_expand_search(),
            SigningEvent::Abandon => self.process_abandon(),
            SigningEvent::PsbtSigned { signatures } => self.process_psbt_signed(signatures),
            SigningEvent::MessageSigned { signature } => self.process_message_signed(signature),
            SigningEvent::Failed { kind, reason } => self.process_failure(kind, reason),
            SigningEvent::Reset => self.process_reset(),
        }
    }
}

/// The output of the Signing State Machine after processing an event.
pub type SigningSMOutput = SMOutput<SigningDuty, SigningSignal>;

impl SigningSM {
    /// Creates a new [`SigningSM`] for a session that has not connected yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the context of the session.
    pub const fn context(&self) -> &SigningSMCtx {
        &self.context
    }

    /// Returns a reference to the current state of the session.
    pub const fn state(&self) -> &SigningState {
        &self.state
    }

    /// Returns a mutable reference to the current state of the session.
    pub const fn state_mut(&mut self) -> &mut SigningState {
        &mut self.state
    }
}
