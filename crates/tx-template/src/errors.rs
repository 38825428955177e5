//! Error types for template construction, finalization and verification.

use bip322_primitives::{address::AddressType, errors::AddressError};
use bitcoin::{consensus, ecdsa, taproot, ScriptBuf};
use thiserror::Error;

/// Errors raised while building the unsigned template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The script of the signing address does not have the form implied by its type.
    #[error("script {script} is not a valid {address_type} output")]
    UnexpectedScript {
        /// The address type the script was expected to match.
        address_type: AddressType,
        /// The offending script.
        script: ScriptBuf,
    },

    /// Legacy addresses are signed as plain messages and have no template.
    #[error("legacy addresses are not signed through a transaction template")]
    NoTemplateForLegacy,

    /// The PSBT could not be created from the unsigned transaction.
    #[error("could not create psbt: {0}")]
    Psbt(String),
}

/// Result alias for template construction.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while attaching a device signature and finalizing the template.
#[derive(Debug, Error)]
pub enum FinalizationError {
    /// The device signed with a key other than the one the template was built for.
    #[error("device signed with {got}, expected {expected}")]
    UnexpectedPubkey {
        /// Hex encoding of the expected key.
        expected: String,
        /// Hex encoding of the key the device reported.
        got: String,
    },

    /// The device did not return a signature for the template's input.
    #[error("no signature returned for input {0}")]
    MissingSignature(usize),

    /// The ECDSA signature could not be parsed.
    #[error("invalid ecdsa signature: {0}")]
    Ecdsa(#[from] ecdsa::Error),

    /// The Schnorr signature could not be parsed.
    #[error("invalid schnorr signature: {0}")]
    Schnorr(#[from] taproot::SigFromSliceError),

    /// The legacy message signature could not be parsed.
    #[error("invalid message signature: {0}")]
    MessageSignature(String),

    /// The unlocking script could not be built.
    #[error("could not build script sig: {0}")]
    ScriptSig(String),
}

/// Result alias for finalization.
pub type FinalizationResult<T> = Result<T, FinalizationError>;

/// Errors raised while verifying an encoded signature.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The address is not supported.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The signature is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a witness stack.
    #[error("invalid witness encoding: {0}")]
    Witness(#[from] consensus::encode::Error),

    /// The witness has the wrong number of elements for the address type.
    #[error("expected {expected} witness elements, got {got}")]
    WitnessShape {
        /// The number of elements a valid witness has.
        expected: usize,
        /// The number of elements found.
        got: usize,
    },

    /// The key in the witness does not belong to the address.
    #[error("witness key does not match the address")]
    KeyMismatch,

    /// A signature or key could not be parsed or the signature hash could not be computed.
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// The signature does not verify.
    #[error("signature is invalid")]
    Invalid,
}

/// Result alias for verification.
pub type VerifyResult<T> = Result<T, VerifyError>;
