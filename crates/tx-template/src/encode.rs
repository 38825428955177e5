//! The string handed back to the user as the signature.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use bitcoin::{consensus, sign_message::MessageSignature, Witness};
use serde::{Deserialize, Serialize};

use crate::errors::{FinalizationError, FinalizationResult};

/// A base64 encoded signature.
///
/// Either the consensus encoded witness stack of the `to_sign` input (a "simple" BIP-322
/// signature) or a 65-byte compact recoverable signature for legacy addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedSignature(String);

impl EncodedSignature {
    /// Encodes a witness stack as a simple BIP-322 signature.
    pub fn simple(witness: &Witness) -> Self {
        Self(STANDARD.encode(consensus::serialize(witness)))
    }

    /// Wraps a legacy message signature returned by the device after checking that it parses.
    pub fn legacy(signature: &str) -> FinalizationResult<Self> {
        MessageSignature::from_base64(signature)
            .map_err(|e| FinalizationError::MessageSignature(e.to_string()))?;

        Ok(Self(signature.to_string()))
    }

    /// The base64 string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EncodedSignature> for String {
    fn from(signature: EncodedSignature) -> Self {
        signature.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_encoding_of_reference_witness() {
        let witness = Witness::from_slice(&[
            hex::decode("304402206517c8637a7bfc3a154edcba6196d64bbd5b73955cb7da7d1626bcdde466c364022022bf10d19fc0bb69b4596e306b362acaa835293cf693bb176f7324b531f5afec01").unwrap(),
            hex::decode("02c7f12003196442943d8588e01aee840423cc54fc1521526a3b85c2b0cbd58872").unwrap(),
        ]);

        assert_eq!(
            EncodedSignature::simple(&witness).as_str(),
            "AkcwRAIgZRfIY3p7/DoVTty6YZbWS71bc5Vct9p9Fia83eRmw2QCICK/ENGfwLtptFluMGs2KsqoNSk89pO7F29zJLUx9a/sASECx/EgAxlkQpQ9hYjgGu6EBCPMVPwVIVJqO4XCsMvViHI="
        );
    }

    #[test]
    fn test_legacy_must_parse() {
        assert!(matches!(
            EncodedSignature::legacy("not base64"),
            Err(FinalizationError::MessageSignature(_))
        ));
    }
}
