//! Error types for the orchestrator crate.

use bip322_primitives::errors::PathError;
use bip322_signing_sm::signing::errors::SigningSMError;
use thiserror::Error;

/// Errors returned by the orchestrator.
///
/// Failures of a signing attempt are not errors: they are routed through the state machine and
/// reported to the observer. These are the failures of the orchestrator itself.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The state machine refused the event, for example because the user asked to expand a search
    /// that has not been exhausted.
    #[error("event refused: {0}")]
    StateMachine(#[from] SigningSMError),

    /// The configuration file could not be parsed.
    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration is well formed but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A derivation path could not be constructed.
    #[error("invalid derivation path: {0}")]
    Path(#[from] PathError),
}

/// Result alias for the orchestrator.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
