//! Message digests committed to by the two signing schemes.

use bitcoin::{
    hashes::{sha256, sha256d, Hash, HashEngine},
    sign_message::signed_msg_hash,
};

/// BIP-340 style tag of the BIP-322 message hash.
pub const BIP322_TAG: &str = "BIP0322-signed-message";

/// The tagged hash `SHA256(SHA256(tag) || SHA256(tag) || message)` committed to by `to_spend`.
pub fn message_hash(message: &[u8]) -> sha256::Hash {
    let tag = sha256::Hash::hash(BIP322_TAG.as_bytes());

    let mut engine = sha256::Hash::engine();
    engine.input(tag.as_byte_array());
    engine.input(tag.as_byte_array());
    engine.input(message);

    sha256::Hash::from_engine(engine)
}

/// The double SHA256 of `"\x18Bitcoin Signed Message:\n" || varint(len) || message` signed by
/// legacy message signatures.
pub fn legacy_message_hash(message: &str) -> sha256d::Hash {
    signed_msg_hash(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_hash_vectors() {
        assert_eq!(
            message_hash(b"").to_string(),
            "c90c269c4f8fcbe6880f72a721ddfbf1914268a794cbb21cfafee13770ae19f1"
        );
        assert_eq!(
            message_hash(b"Hello World").to_string(),
            "f0eb03b1a75ac6d9847f55c624a99169b5dccba2a31f5b23bea77ba270de0a7a"
        );
    }

    #[test]
    fn test_legacy_hash_differs_from_tagged_hash() {
        assert_ne!(
            legacy_message_hash("Hello World").to_byte_array(),
            message_hash(b"Hello World").to_byte_array()
        );
    }
}
