//! The state machine behind a message signing session.
//!
//! A session walks through connecting to the device, collecting the address and message to sign,
//! locating the address's derivation path, and asking the device for its approval. The machine
//! itself never talks to the device: every transition emits duties that an external driver
//! executes and whose outcome is fed back as the next event. Outcomes the user should see are
//! emitted as signals.

pub mod signing;
pub mod state_machine;

#[cfg(test)]
pub(crate) mod testing;
