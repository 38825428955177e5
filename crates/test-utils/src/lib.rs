//! This crate provides fixtures and device doubles shared by the tests of the signing crates.
//!
//! The fixtures are all derived from the BIP-39 test mnemonic `abandon abandon ... about`, whose
//! account keys and first addresses are published in BIP-44, BIP-49, BIP-84 and BIP-86.

pub mod device;
pub mod fixtures;
