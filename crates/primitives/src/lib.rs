//! Types and pure functions shared by every signing crate.
//!
//! Address classification, the BIP-44 family of derivation paths and the bounds of the path
//! search live here. The crate sits at the bottom of the workspace and depends on no other
//! workspace crate.

pub mod address;
pub mod constants;
pub mod errors;
pub mod paths;
pub mod types;
