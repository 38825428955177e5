//! Construction of the virtual transactions behind BIP-322 message signatures.
//!
//! A "simple" BIP-322 signature is the witness of a transaction (`to_sign`) that spends the single
//! output of another transaction (`to_spend`) paying to the signer's address. `to_spend` commits
//! to the message through its unlocking script and can never be mined. This crate builds both
//! transactions, annotates `to_sign` with the metadata a hardware signer needs to authorize it,
//! attaches the signature returned by the device and encodes the final witness.
//!
//! Legacy (P2PKH) addresses are signed with the older signed-message scheme instead and never go
//! through a transaction template.

pub mod encode;
pub mod errors;
pub mod message;
pub mod template;
pub mod verify;

pub use encode::EncodedSignature;
pub use errors::{
    FinalizationError, FinalizationResult, TemplateError, TemplateResult, VerifyError,
    VerifyResult,
};
pub use message::{legacy_message_hash, message_hash};
pub use template::{to_sign_tx, to_spend, Signed, ToSign, UnsignedTemplate, Unsigned};
pub use verify::{verify, verify_legacy, verify_simple};
