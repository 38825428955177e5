use bip322_device::DeviceSignature;
use bip322_tx_template::EncodedSignature;
use tracing::info;

use crate::{
    signing::{
        errors::{FailureKind, SigningSMError, SigningSMResult},
        events::SigningEvent,
        machine::{SigningSM, SigningSMOutput},
        signals::SigningSignal,
        state::{PendingSignature, SigningRequest, SigningState},
    },
    state_machine::SMOutput,
};

impl SigningSM {
    /// Processes the signatures returned by the device for the `to_sign` template.
    pub(crate) fn process_psbt_signed(
        &mut self,
        signatures: Vec<(usize, DeviceSignature)>,
    ) -> SigningSMResult<SigningSMOutput> {
        let SigningState::AwaitingDeviceApproval {
            request,
            pending: PendingSignature::Template(template),
            ..
        } = &self.state
        else {
            return Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::PsbtSigned { signatures }.to_string(),
                reason: Some("no template is awaiting a signature".to_string()),
            });
        };

        let request = request.clone();
        let encoded = template
            .as_ref()
            .clone()
            .attach(&signatures)
            .and_then(|signed| signed.encode());

        match encoded {
            Ok(signature) => Ok(self.complete(request, signature)),
            Err(e) => Ok(self.fail(FailureKind::Unknown, e.to_string())),
        }
    }

    /// Processes the legacy message signature returned by the device.
    pub(crate) fn process_message_signed(
        &mut self,
        signature: String,
    ) -> SigningSMResult<SigningSMOutput> {
        let SigningState::AwaitingDeviceApproval {
            request,
            pending: PendingSignature::Message,
            ..
        } = &self.state
        else {
            return Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::MessageSigned { signature }.to_string(),
                reason: Some("no message is awaiting a signature".to_string()),
            });
        };

        let request = request.clone();
        match EncodedSignature::legacy(&signature) {
            Ok(signature) => Ok(self.complete(request, signature)),
            Err(e) => Ok(self.fail(FailureKind::Unknown, e.to_string())),
        }
    }

    fn complete(
        &mut self,
        request: SigningRequest,
        signature: EncodedSignature,
    ) -> SigningSMOutput {
        info!(address = %request.address, "message signed");

        self.state = SigningState::Signed {
            request,
            signature: signature.clone(),
        };

        SMOutput::with_signals(vec![SigningSignal::Signed(signature)])
    }

    /// Processes the failure of a duty executed on behalf of the current attempt.
    pub(crate) fn process_failure(
        &mut self,
        kind: FailureKind,
        reason: String,
    ) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::Searching { .. } | SigningState::AwaitingDeviceApproval { .. } => {
                Ok(self.fail(kind, reason))
            }
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::Failed { kind, reason }.to_string(),
                reason: Some("no duty is in flight".to_string()),
            }),
        }
    }

    /// Processes the user acknowledging the signature.
    ///
    /// The next attempt starts again from the initial search space.
    pub(crate) fn process_reset(&mut self) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::Signed { .. } => {
                self.state = SigningState::AwaitingInput;

                Ok(SMOutput::new())
            }
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::Reset.to_string(),
                reason: None,
            }),
        }
    }
}
