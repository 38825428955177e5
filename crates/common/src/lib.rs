//! Process level plumbing shared by the signer binaries and test harnesses, currently the setup of
//! the tracing subscriber.

pub mod logging;
