use tracing::warn;

use crate::{
    signing::{
        duties::SigningDuty,
        errors::FailureKind,
        machine::{SigningSM, SigningSMOutput},
        signals::SigningSignal,
        state::SigningState,
    },
    state_machine::SMOutput,
};

impl SigningSM {
    /// Ends the current attempt with a failure of the given kind.
    ///
    /// Connectivity failures drop the session (closing it if it was open). Every other failure
    /// clears the request and returns to the input step.
    pub(crate) fn fail(&mut self, kind: FailureKind, reason: impl Into<String>) -> SigningSMOutput {
        let reason = reason.into();
        warn!(state = %self.state, %kind, %reason, "signing attempt failed");

        self.context.last_failure = Some(kind);

        let mut duties = Vec::new();
        if kind.requires_reconnect() {
            if self.state.is_connected() {
                duties.push(SigningDuty::CloseSession);
            }
            self.context.fingerprint = None;
            self.state = SigningState::Disconnected;
        } else {
            self.state = SigningState::AwaitingInput;
        }

        SMOutput::with_duties_and_signals(duties, vec![SigningSignal::Failed(kind)])
    }
}
