//! The loop that connects the Signing State Machine to a device.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use bip322_device::{DeviceConnector, DeviceSession};
use bip322_primitives::{address::AddressType, paths::DerivationPrefix};
use bip322_signing_sm::{
    signing::{
        config::SigningSMCfg, context::SigningSMCtx, duties::SigningDuty, errors::FailureKind,
        events::SigningEvent, machine::SigningSM, signals::SigningSignal, state::SigningState,
    },
    state_machine::StateMachine,
};
use bip322_tx_template::EncodedSignature;
use bitcoin::{bip32::DerivationPath, Network};
use tracing::{debug, info};

use crate::{
    config::SigningConfig,
    errors::OrchestratorResult,
    executor,
    observer::{SigningObserver, TracingObserver},
};

/// Runs signing sessions against the devices handed out by a [`DeviceConnector`].
///
/// At most one device session is open at a time. Every public method feeds one user event into
/// the state machine and returns once the machine is waiting for the user again.
#[expect(missing_debug_implementations)]
pub struct Orchestrator<C: DeviceConnector, O: SigningObserver = TracingObserver> {
    connector: C,
    session: Option<C::Session>,
    sm: SigningSM,
    sm_cfg: Arc<SigningSMCfg>,
    network: Network,
    request_timeout: Duration,
    max_account_exports: u64,
    probe_path: DerivationPath,
    observer: O,
}

impl<C: DeviceConnector, O: SigningObserver> Orchestrator<C, O> {
    /// Creates a new orchestrator. No session is opened until [`Self::connect`] is called.
    pub fn new(connector: C, config: &SigningConfig, observer: O) -> OrchestratorResult<Self> {
        config.validate()?;

        // any key the device can export without user interaction will do
        let probe_path =
            DerivationPrefix::new(AddressType::NativeSegwit, config.network).account(0)?;

        Ok(Self {
            connector,
            session: None,
            sm: SigningSM::new(),
            sm_cfg: Arc::new(config.sm_config()),
            network: config.network,
            request_timeout: config.liveness_timeout(),
            max_account_exports: config.max_account_exports,
            probe_path,
            observer,
        })
    }

    /// The current state of the session.
    pub const fn state(&self) -> &SigningState {
        self.sm.state()
    }

    /// The context of the session.
    pub const fn context(&self) -> &SigningSMCtx {
        self.sm.context()
    }

    /// The observer notified by this orchestrator.
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// The connector sessions are opened with.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// The signature of the current request, once it has been produced.
    pub const fn signature(&self) -> Option<&EncodedSignature> {
        match self.sm.state() {
            SigningState::Signed { signature, .. } => Some(signature),
            _ => None,
        }
    }

    /// Performs a fresh handshake with the device, closing any session that is still open.
    pub async fn connect(&mut self) -> OrchestratorResult<()> {
        self.handle(SigningEvent::ConnectRequested).await
    }

    /// Submits an address and a message to sign.
    pub async fn submit(
        &mut self,
        address: impl Into<String>,
        message: impl Into<String>,
    ) -> OrchestratorResult<()> {
        self.handle(SigningEvent::InputSubmitted {
            address: address.into(),
            message: message.into(),
        })
        .await
    }

    /// Searches again over twice the space of the search that was just exhausted.
    pub async fn expand_search(&mut self) -> OrchestratorResult<()> {
        self.handle(SigningEvent::ExpandSearch).await
    }

    /// Gives up on an exhausted search and waits for new input.
    pub async fn abandon(&mut self) -> OrchestratorResult<()> {
        self.handle(SigningEvent::Abandon).await
    }

    /// Discards the produced signature and waits for new input.
    pub async fn reset(&mut self) -> OrchestratorResult<()> {
        self.handle(SigningEvent::Reset).await
    }

    /// Closes the device session, if one is open.
    pub async fn shutdown(mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }

    /// Processes `event` and every event produced by the duties it triggers.
    async fn handle(&mut self, event: SigningEvent) -> OrchestratorResult<()> {
        let mut pending = VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            let from = self.sm.state().clone();
            debug!(%event, state = %from, "processing event");

            let output = self.sm.process_event(self.sm_cfg.clone(), event)?;

            if from != *self.sm.state() {
                self.observer.on_transition(&from, self.sm.state());
            }

            for signal in &output.signals {
                self.notify(signal);
            }

            for duty in output.duties {
                if let Some(next) = self.execute(duty).await {
                    pending.push_back(next);
                }
            }
        }

        Ok(())
    }

    fn notify(&mut self, signal: &SigningSignal) {
        match signal {
            SigningSignal::Found { path } => self.observer.on_found(path),
            SigningSignal::Exhausted { search_space } => self.observer.on_exhausted(*search_space),
            SigningSignal::Failed(kind) => self.observer.on_failure(*kind),
            SigningSignal::Signed(signature) => self.observer.on_signature(signature),
        }
    }

    /// Executes `duty` and returns the event that reports its outcome, if it has one.
    async fn execute(&mut self, duty: SigningDuty) -> Option<SigningEvent> {
        debug!(?duty, "executing duty");

        match duty {
            SigningDuty::Connect => {
                if let Some(mut stale) = self.session.take() {
                    stale.close().await;
                }

                Some(
                    match executor::handshake(&mut self.connector, self.request_timeout).await {
                        Ok((session, fingerprint)) => {
                            self.session = Some(session);
                            SigningEvent::HandshakeSucceeded { fingerprint }
                        }
                        Err(err) => SigningEvent::HandshakeFailed {
                            reason: err.to_string(),
                        },
                    },
                )
            }
            SigningDuty::ProbeLiveness => Some(match self.probe().await {
                Ok(()) => SigningEvent::LivenessConfirmed,
                Err(reason) => SigningEvent::LivenessLost { reason },
            }),
            SigningDuty::CloseSession => {
                if let Some(mut session) = self.session.take() {
                    info!("closing device session");
                    session.close().await;
                }

                None
            }
            SigningDuty::SearchPath {
                address,
                address_type,
                search_space,
                probe_liveness,
            } => {
                if probe_liveness {
                    if let Err(reason) = self.probe().await {
                        return Some(SigningEvent::LivenessLost { reason });
                    }
                }

                let Some(session) = self.session.as_mut() else {
                    return Some(no_session());
                };

                Some(
                    executor::search_path(
                        session,
                        &mut self.observer,
                        self.network,
                        &address,
                        address_type,
                        search_space,
                        self.max_account_exports,
                        self.request_timeout,
                    )
                    .await,
                )
            }
            SigningDuty::SignPsbt { psbt, policy } => Some(match self.session.as_mut() {
                Some(session) => executor::sign_psbt(session, &psbt, &policy).await,
                None => no_session(),
            }),
            SigningDuty::SignMessage { message, path } => Some(match self.session.as_mut() {
                Some(session) => executor::sign_message(session, &message, &path).await,
                None => no_session(),
            }),
        }
    }

    async fn probe(&mut self) -> Result<(), String> {
        let Some(session) = self.session.as_mut() else {
            return Err("no open device session".to_string());
        };

        executor::probe_liveness(session, &self.probe_path, self.request_timeout)
            .await
            .map_err(|err| err.to_string())
    }
}

fn no_session() -> SigningEvent {
    SigningEvent::Failed {
        kind: FailureKind::Connectivity,
        reason: "no open device session".to_string(),
    }
}
