//! Generic testing utilities for state machines.
//!
//! - [`transition`] - Value-based transition testing helpers
//! - [`proptest`] - Property-based testing macros
//!
//! ```rust,ignore
//! use crate::testing::transition::*;
//!
//! test_transition(
//!     create_sm,
//!     get_state,
//!     cfg(),
//!     Transition {
//!         from_state: SigningState::Connected,
//!         event: SigningEvent::LivenessConfirmed,
//!         expected_state: SigningState::AwaitingInput,
//!         expected_duties: vec![],
//!         expected_signals: vec![],
//!     },
//! );
//! ```

pub(crate) mod proptest;
pub(crate) mod transition;

pub(crate) use transition::{
    test_invalid_transition, test_transition, EventSequence, InvalidTransition, Transition,
};
