//! State transitions of the Signing State Machine, grouped by the step of the session they
//! belong to.

mod common;
mod connection;
mod search;
mod signature;
