//! The state machine for a single message signing session.
//!
//! This state machine handles the following:
//!
//! - The handshake with the device and the liveness probes that guard each attempt.
//! - The classification of the address the user wants to sign with.
//! - The derivation path search and its expansion when nothing is found.
//! - The construction of the `to_sign` template and the finalization of the device's signature.
//! - The routing of failures back to the state the user has to continue from.

pub mod config;
pub mod context;
pub mod duties;
pub mod errors;
pub mod events;
pub mod machine;
pub mod signals;
pub mod state;
#[cfg(test)]
mod tests;
mod transitions;
