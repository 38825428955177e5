//! Presentation hooks for a signing session.

use bip322_primitives::types::{Progress, SearchSpace};
use bip322_signing_sm::signing::{errors::FailureKind, state::SigningState};
use bip322_tx_template::EncodedSignature;
use bitcoin::bip32::DerivationPath;
use tracing::{info, warn};

/// Receives everything the user of a signing session should be shown.
///
/// Every method has an empty default so that implementors only handle what they present.
pub trait SigningObserver {
    /// The state machine moved from `from` to `to`.
    fn on_transition(&mut self, _from: &SigningState, _to: &SigningState) {}

    /// The path search advanced. Values are non-decreasing within one search.
    fn on_progress(&mut self, _progress: Progress) {}

    /// The derivation path of the requested address was found.
    fn on_found(&mut self, _path: &DerivationPath) {}

    /// The address was not found within `search_space`.
    fn on_exhausted(&mut self, _search_space: SearchSpace) {}

    /// The current attempt failed.
    fn on_failure(&mut self, _kind: FailureKind) {}

    /// A signature was produced.
    fn on_signature(&mut self, _signature: &EncodedSignature) {}
}

/// Logs every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SigningObserver for TracingObserver {
    fn on_transition(&mut self, from: &SigningState, to: &SigningState) {
        info!(%from, %to, "state changed");
    }

    fn on_progress(&mut self, progress: Progress) {
        info!(percent = progress.percent(), "searching");
    }

    fn on_found(&mut self, path: &DerivationPath) {
        info!(%path, "found derivation path");
    }

    fn on_exhausted(&mut self, search_space: SearchSpace) {
        warn!(
            account_bound = search_space.account_bound,
            address_index_bound = search_space.address_index_bound,
            "address not found"
        );
    }

    fn on_failure(&mut self, kind: FailureKind) {
        warn!(%kind, "signing failed");
    }

    fn on_signature(&mut self, signature: &EncodedSignature) {
        info!(%signature, "signed");
    }
}

/// A single call received by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// See [`SigningObserver::on_transition`]. States are recorded by name.
    Transition {
        /// The state left.
        from: String,
        /// The state entered.
        to: String,
    },
    /// See [`SigningObserver::on_progress`].
    Progress(Progress),
    /// See [`SigningObserver::on_found`].
    Found(DerivationPath),
    /// See [`SigningObserver::on_exhausted`].
    Exhausted(SearchSpace),
    /// See [`SigningObserver::on_failure`].
    Failure(FailureKind),
    /// See [`SigningObserver::on_signature`].
    Signature(EncodedSignature),
}

/// Keeps every observation in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    observations: Vec<Observation>,
}

impl RecordingObserver {
    /// All observations so far.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The names of the states entered, in order.
    pub fn states_entered(&self) -> Vec<&str> {
        self.observations
            .iter()
            .filter_map(|observation| match observation {
                Observation::Transition { to, .. } => Some(to.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The progress values reported, in order.
    pub fn progress(&self) -> Vec<Progress> {
        self.observations
            .iter()
            .filter_map(|observation| match observation {
                Observation::Progress(progress) => Some(*progress),
                _ => None,
            })
            .collect()
    }

    /// The search spaces reported as exhausted, in order.
    pub fn exhausted(&self) -> Vec<SearchSpace> {
        self.observations
            .iter()
            .filter_map(|observation| match observation {
                Observation::Exhausted(search_space) => Some(*search_space),
                _ => None,
            })
            .collect()
    }

    /// The failures reported, in order.
    pub fn failures(&self) -> Vec<FailureKind> {
        self.observations
            .iter()
            .filter_map(|observation| match observation {
                Observation::Failure(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// The last signature reported.
    pub fn last_signature(&self) -> Option<&EncodedSignature> {
        self.observations
            .iter()
            .rev()
            .find_map(|observation| match observation {
                Observation::Signature(signature) => Some(signature),
                _ => None,
            })
    }
}

impl SigningObserver for RecordingObserver {
    fn on_transition(&mut self, from: &SigningState, to: &SigningState) {
        self.observations.push(Observation::Transition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    fn on_progress(&mut self, progress: Progress) {
        self.observations.push(Observation::Progress(progress));
    }

    fn on_found(&mut self, path: &DerivationPath) {
        self.observations.push(Observation::Found(path.clone()));
    }

    fn on_exhausted(&mut self, search_space: SearchSpace) {
        self.observations.push(Observation::Exhausted(search_space));
    }

    fn on_failure(&mut self, kind: FailureKind) {
        self.observations.push(Observation::Failure(kind));
    }

    fn on_signature(&mut self, signature: &EncodedSignature) {
        self.observations.push(Observation::Signature(signature.clone()));
    }
}
