use std::sync::Arc;

use bip322_device::WalletPolicy;
use bip322_key_deriv::FoundPath;
use bip322_primitives::address::{classify, AddressType};
use bip322_tx_template::ToSign;
use tracing::{debug, info};

use crate::{
    signing::{
        config::SigningSMCfg,
        duties::SigningDuty,
        errors::{FailureKind, SigningSMError, SigningSMResult},
        events::SigningEvent,
        machine::{SigningSM, SigningSMOutput},
        signals::SigningSignal,
        state::{PendingSignature, SigningRequest, SigningState},
    },
    state_machine::SMOutput,
};

impl SigningSM {
    /// Processes the address and message submitted by the user.
    ///
    /// The address is classified before anything is asked of the device; an unsupported address
    /// keeps the session at the input step.
    pub(crate) fn process_input_submitted(
        &mut self,
        cfg: Arc<SigningSMCfg>,
        address: String,
        message: String,
    ) -> SigningSMResult<SigningSMOutput> {
        if !matches!(self.state, SigningState::AwaitingInput) {
            return Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::InputSubmitted { address, message }.to_string(),
                reason: None,
            });
        }

        let address_type = match classify(&address, cfg.network()) {
            Ok(address_type) => address_type,
            Err(e) => return Ok(self.fail(FailureKind::UnsupportedAddressKind, e.to_string())),
        };

        let search_space = cfg.initial_search_space();
        info!(%address, %address_type, ?search_space, "searching for derivation path");

        self.context.last_failure = None;
        self.state = SigningState::Searching {
            request: SigningRequest {
                address: address.clone(),
                message,
                address_type,
            },
            search_space,
        };

        Ok(SMOutput::with_duties(vec![SigningDuty::SearchPath {
            address,
            address_type,
            search_space,
            probe_liveness: true,
        }]))
    }

    /// Processes the outcome of a derivation path search.
    ///
    /// When the path is found the signing request for the device is prepared right away: legacy
    /// addresses are signed as plain messages, everything else through the `to_sign` template.
    pub(crate) fn process_search_completed(
        &mut self,
        found: Option<Box<FoundPath>>,
    ) -> SigningSMResult<SigningSMOutput> {
        let SigningState::Searching {
            request,
            search_space,
        } = &self.state
        else {
            return Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::SearchCompleted { found }.to_string(),
                reason: None,
            });
        };
        let request = request.clone();
        let search_space = *search_space;

        let Some(found) = found else {
            info!(address = %request.address, ?search_space, "address not found");

            self.state = SigningState::SearchExhausted {
                request,
                search_space,
            };

            return Ok(SMOutput::with_signals(vec![SigningSignal::Exhausted {
                search_space,
            }]));
        };

        if found.address_type() != request.address_type {
            return Ok(self.fail(
                FailureKind::Unknown,
                format!(
                    "found a {} key for a {} address",
                    found.address_type(),
                    request.address_type
                ),
            ));
        }

        info!(address = %request.address, path = %found.path, "found derivation path");

        let (duty, pending) = match self.prepare_signature(&request, &found) {
            Ok(prepared) => prepared,
            Err(reason) => return Ok(self.fail(FailureKind::Unknown, reason)),
        };

        let path = found.path.clone();
        self.state = SigningState::AwaitingDeviceApproval {
            request,
            search_space,
            found,
            pending,
        };

        Ok(SMOutput::with_duties_and_signals(
            vec![duty],
            vec![SigningSignal::Found { path }],
        ))
    }

    fn prepare_signature(
        &self,
        request: &SigningRequest,
        found: &FoundPath,
    ) -> Result<(SigningDuty, PendingSignature), String> {
        if request.address_type == AddressType::Legacy {
            let duty = SigningDuty::SignMessage {
                message: request.message.clone(),
                path: found.path.clone(),
            };

            return Ok((duty, PendingSignature::Message));
        }

        let fingerprint = self
            .context
            .fingerprint
            .ok_or_else(|| "device fingerprint is unknown".to_string())?;
        let template =
            ToSign::new(&request.message, found, fingerprint).map_err(|e| e.to_string())?;
        let policy = WalletPolicy::default_for(request.address_type, template.key_info().clone())
            .ok_or_else(|| format!("no wallet policy for {}", request.address_type))?;

        debug!(policy = %policy.descriptor_template, "prepared template");

        let duty = SigningDuty::SignPsbt {
            psbt: Box::new(template.psbt().clone()),
            policy,
        };

        Ok((duty, PendingSignature::Template(Box::new(template))))
    }

    /// Processes the user's request to search a larger space.
    pub(crate) fn process_expand_search(&mut self) -> SigningSMResult<SigningSMOutput> {
        let SigningState::SearchExhausted {
            request,
            search_space,
        } = &self.state
        else {
            return Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::ExpandSearch.to_string(),
                reason: Some("no exhausted search to expand".to_string()),
            });
        };

        let expanded = search_space.doubled();
        if expanded == *search_space {
            return Err(SigningSMError::rejected(
                self.state.clone(),
                "search space cannot grow any further",
            ));
        }

        info!(address = %request.address, ?expanded, "expanding search");

        let request = request.clone();
        let duty = SigningDuty::SearchPath {
            address: request.address.clone(),
            address_type: request.address_type,
            search_space: expanded,
            probe_liveness: false,
        };
        self.state = SigningState::Searching {
            request,
            search_space: expanded,
        };

        Ok(SMOutput::with_duties(vec![duty]))
    }

    /// Processes the user giving up on an address that could not be found.
    pub(crate) fn process_abandon(&mut self) -> SigningSMResult<SigningSMOutput> {
        match self.state {
            SigningState::SearchExhausted { .. } => {
                self.state = SigningState::AwaitingInput;

                Ok(SMOutput::new())
            }
            _ => Err(SigningSMError::InvalidEvent {
                state: self.state.to_string(),
                event: SigningEvent::Abandon.to_string(),
                reason: None,
            }),
        }
    }
}
