//! Drives signing sessions against a hardware device.
//!
//! The [`Orchestrator`] owns the device session and the Signing State Machine. It feeds user
//! requests into the machine as events, carries out the duties the machine emits against the
//! device and feeds the outcome of every duty back into the machine until no duties are left.
//! Signals emitted along the way are forwarded to a [`SigningObserver`].

pub mod config;
pub mod driver;
pub mod errors;
pub mod executor;
pub mod observer;

pub use config::SigningConfig;
pub use driver::Orchestrator;
pub use errors::{OrchestratorError, OrchestratorResult};
pub use observer::{Observation, RecordingObserver, SigningObserver, TracingObserver};
