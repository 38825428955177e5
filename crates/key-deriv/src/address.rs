//! Address generation from derived public keys.
//!
//! Provides one constructor per supported [`AddressType`].

use bip322_primitives::address::AddressType;
use bitcoin::{
    key::TapTweak, secp256k1::PublicKey, Address, CompressedPublicKey, Network, ScriptBuf,
    XOnlyPublicKey,
};
use secp256k1::SECP256K1;

/// Generate a P2TR address from an x-only internal key.
///
/// Uses key-path spending only (no script tree).
#[must_use]
pub fn p2tr_address(internal_key: XOnlyPublicKey, network: Network) -> Address {
    let (tweaked, _) = internal_key.tap_tweak(SECP256K1, None);
    Address::p2tr_tweaked(tweaked, network)
}

/// The P2WPKH script that a P2SH-P2WPKH output commits to.
#[must_use]
pub fn p2wpkh_redeem_script(public_key: &PublicKey) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&CompressedPublicKey(*public_key).wpubkey_hash())
}

/// Generate the address of `address_type` paying to `public_key`.
#[must_use]
pub fn address_for(public_key: &PublicKey, address_type: AddressType, network: Network) -> Address {
    let compressed = CompressedPublicKey(*public_key);

    match address_type {
        AddressType::Legacy => Address::p2pkh(compressed.pubkey_hash(), network),
        AddressType::Segwit => Address::p2shwpkh(&compressed, network),
        AddressType::NativeSegwit => Address::p2wpkh(&compressed, network),
        AddressType::Taproot => p2tr_address(public_key.x_only_public_key().0, network),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn pubkey(hex: &str) -> PublicKey {
        PublicKey::from_str(hex).unwrap()
    }

    #[test]
    fn test_address_for_each_type() {
        let cases = [
            (
                "03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e",
                AddressType::Legacy,
                "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA",
            ),
            (
                "039b3b694b8fc5b5e07fb069c783cac754f5d38c3e08bed1960e31fdb1dda35c24",
                AddressType::Segwit,
                "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf",
            ),
            (
                "0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c",
                AddressType::NativeSegwit,
                "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu",
            ),
        ];

        for (key, address_type, expected) in cases {
            let address = address_for(&pubkey(key), address_type, Network::Bitcoin);
            assert_eq!(address.to_string(), expected);
        }
    }

    #[test]
    fn test_p2tr_uses_internal_key() {
        let internal = XOnlyPublicKey::from_str(
            "cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115",
        )
        .unwrap();

        assert_eq!(
            p2tr_address(internal, Network::Bitcoin).to_string(),
            "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr"
        );
    }

    #[test]
    fn test_redeem_script_hashes_to_p2sh() {
        let key = pubkey("039b3b694b8fc5b5e07fb069c783cac754f5d38c3e08bed1960e31fdb1dda35c24");
        let redeem = p2wpkh_redeem_script(&key);
        let address = address_for(&key, AddressType::Segwit, Network::Bitcoin);

        assert!(redeem.is_p2wpkh());
        assert_eq!(
            ScriptBuf::new_p2sh(&redeem.script_hash()),
            address.script_pubkey()
        );
    }
}
