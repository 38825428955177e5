//! Offline verification of encoded signatures.
//!
//! Only single-key outputs are understood: the witness must be exactly what a P2WPKH,
//! P2SH-P2WPKH or key path P2TR spend looks like.

use base64::{engine::general_purpose::STANDARD, Engine};
use bip322_primitives::address::{classify_address, parse_address, AddressType};
use bitcoin::{
    consensus,
    ecdsa,
    hashes::Hash,
    script::{Builder, PushBytesBuf},
    secp256k1::{Message, PublicKey},
    sighash::{Prevouts, SighashCache},
    sign_message::MessageSignature,
    taproot, Address, CompressedPublicKey, Network, ScriptBuf, TxOut, Witness, XOnlyPublicKey,
};
use secp256k1::SECP256K1;
use tracing::debug;

use crate::{
    errors::{VerifyError, VerifyResult},
    message::legacy_message_hash,
    template::{to_sign_tx, to_spend, SIGNED_INPUT_INDEX},
};

fn malformed(e: impl ToString) -> VerifyError {
    VerifyError::Malformed(e.to_string())
}

fn expect_witness_len(witness: &Witness, expected: usize) -> VerifyResult<()> {
    if witness.len() != expected {
        return Err(VerifyError::WitnessShape {
            expected,
            got: witness.len(),
        });
    }

    Ok(())
}

/// Verifies a signature for `address` in whichever scheme its type is signed with.
pub fn verify(address: &str, message: &str, signature: &str, network: Network) -> VerifyResult<()> {
    let parsed = parse_address(address, network)?;

    match classify_address(&parsed)? {
        AddressType::Legacy => verify_legacy(address, message, signature, network),
        AddressType::Segwit | AddressType::NativeSegwit | AddressType::Taproot => {
            verify_simple(address, message, signature, network)
        }
    }
}

/// Verifies a legacy signed-message signature by recovering the signing key.
pub fn verify_legacy(
    address: &str,
    message: &str,
    signature: &str,
    network: Network,
) -> VerifyResult<()> {
    let address = parse_address(address, network)?;
    let signature = MessageSignature::from_base64(signature).map_err(malformed)?;

    let signed = signature
        .is_signed_by_address(SECP256K1, &address, legacy_message_hash(message))
        .map_err(malformed)?;

    if signed {
        Ok(())
    } else {
        Err(VerifyError::Invalid)
    }
}

/// Verifies a simple BIP-322 signature for a segwit or taproot address.
pub fn verify_simple(
    address: &str,
    message: &str,
    signature: &str,
    network: Network,
) -> VerifyResult<()> {
    let address = parse_address(address, network)?;
    let address_type = classify_address(&address)?;
    let witness: Witness = consensus::deserialize(&STANDARD.decode(signature)?)?;

    debug!(%address, %address_type, elements = witness.len(), "verifying simple signature");

    match address_type {
        AddressType::Legacy => Err(VerifyError::WitnessShape {
            expected: 0,
            got: witness.len(),
        }),
        AddressType::Segwit | AddressType::NativeSegwit => {
            verify_segwit_v0(&address, address_type, message, witness)
        }
        AddressType::Taproot => verify_taproot(&address, message, witness),
    }
}

fn verify_segwit_v0(
    address: &Address,
    address_type: AddressType,
    message: &str,
    witness: Witness,
) -> VerifyResult<()> {
    expect_witness_len(&witness, 2)?;

    let signature = ecdsa::Signature::from_slice(&witness[0]).map_err(malformed)?;
    let public_key = PublicKey::from_slice(&witness[1]).map_err(malformed)?;

    let script_pubkey = address.script_pubkey();
    let p2wpkh = ScriptBuf::new_p2wpkh(&CompressedPublicKey(public_key).wpubkey_hash());
    let committed = match address_type {
        AddressType::Segwit => ScriptBuf::new_p2sh(&p2wpkh.script_hash()),
        AddressType::NativeSegwit => p2wpkh.clone(),
        AddressType::Legacy | AddressType::Taproot => return Err(VerifyError::KeyMismatch),
    };
    if committed != script_pubkey {
        return Err(VerifyError::KeyMismatch);
    }

    let to_spend = to_spend(&script_pubkey, message.as_bytes());
    let mut to_sign = to_sign_tx(&to_spend);
    if address_type == AddressType::Segwit {
        let push = PushBytesBuf::try_from(p2wpkh.to_bytes()).map_err(malformed)?;
        to_sign.input[SIGNED_INPUT_INDEX].script_sig = Builder::new().push_slice(push).into_script();
    }
    to_sign.input[SIGNED_INPUT_INDEX].witness = witness;

    let sighash = SighashCache::new(&to_sign)
        .p2wpkh_signature_hash(
            SIGNED_INPUT_INDEX,
            &p2wpkh,
            to_spend.output[0].value,
            signature.sighash_type,
        )
        .map_err(malformed)?;

    SECP256K1
        .verify_ecdsa(
            &Message::from_digest(sighash.to_byte_array()),
            &signature.signature,
            &public_key,
        )
        .map_err(|_| VerifyError::Invalid)
}

fn verify_taproot(address: &Address, message: &str, witness: Witness) -> VerifyResult<()> {
    expect_witness_len(&witness, 1)?;

    let signature = taproot::Signature::from_slice(&witness[0]).map_err(malformed)?;

    let script_pubkey = address.script_pubkey();
    let output_key = XOnlyPublicKey::from_slice(&script_pubkey.as_bytes()[2..]).map_err(malformed)?;

    let to_spend = to_spend(&script_pubkey, message.as_bytes());
    let mut to_sign = to_sign_tx(&to_spend);
    to_sign.input[SIGNED_INPUT_INDEX].witness = witness;

    let prevouts = [TxOut {
        value: to_spend.output[0].value,
        script_pubkey,
    }];
    let sighash = SighashCache::new(&to_sign)
        .taproot_key_spend_signature_hash(
            SIGNED_INPUT_INDEX,
            &Prevouts::All(&prevouts),
            signature.sighash_type,
        )
        .map_err(malformed)?;

    SECP256K1
        .verify_schnorr(
            &signature.signature,
            &Message::from_digest(sighash.to_byte_array()),
            &output_key,
        )
        .map_err(|_| VerifyError::Invalid)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bip322_device::{DeviceSession, SoftwareDevice, WalletPolicy};
    use bip322_key_deriv::{FoundPath, KeyDeriver};
    use bip322_primitives::paths::{account_path, full_path};
    use bitcoin::bip32::Xpriv;

    use super::*;
    use crate::{encode::EncodedSignature, template::ToSign};

    const MASTER: &str = "xprv9s21ZrQH143K3GJpoapnV8SFfukcVBSfeCficPSGfubmSFDxo1kuHnLisriDvSnRRuL2Qrg5ggqHKNVpxR86QEC8w35uxmGoggxtQTPvfUu";

    async fn sign_with_software_device(
        address_type: AddressType,
        message: &str,
    ) -> (String, EncodedSignature) {
        let mut device = SoftwareDevice::new(Xpriv::from_str(MASTER).unwrap());
        let fingerprint = device.master_fingerprint().await.unwrap();

        let account_path = account_path(address_type, Network::Bitcoin, 0).unwrap();
        let account_xpub = device.export_extended_pubkey(&account_path).await.unwrap();
        let key = KeyDeriver::new(Network::Bitcoin)
            .derive(&account_xpub, 3, address_type)
            .unwrap();
        let found = FoundPath {
            account: 0,
            address_index: 3,
            path: full_path(&account_path, 3).unwrap(),
            account_path,
            account_xpub,
            key,
        };

        if address_type == AddressType::Legacy {
            let signature = device.sign_message(message, &found.path).await.unwrap();
            return (
                found.key.address().to_string(),
                EncodedSignature::legacy(&signature).unwrap(),
            );
        }

        let template = ToSign::new(message, &found, fingerprint).unwrap();
        let policy =
            WalletPolicy::default_for(address_type, template.key_info().clone()).unwrap();
        let signatures = device.sign_psbt(template.psbt(), &policy).await.unwrap();
        let encoded = template.attach(&signatures).unwrap().encode().unwrap();

        (found.key.address().to_string(), encoded)
    }

    #[tokio::test]
    async fn test_software_device_signatures_verify() {
        for address_type in AddressType::ALL {
            let (address, signature) =
                sign_with_software_device(address_type, "Hello World").await;

            verify(&address, "Hello World", signature.as_str(), Network::Bitcoin)
                .unwrap_or_else(|e| panic!("{address_type} signature must verify: {e}"));
            assert!(
                verify(&address, "Goodbye", signature.as_str(), Network::Bitcoin).is_err(),
                "{address_type} signature must not verify another message"
            );
        }
    }

    const P2WPKH_ADDRESS: &str = "bc1q9vza2e8x573nczrlzms0wvx3gsqjx7vavgkx0l";
    const P2WPKH_HELLO_WORLD: &str = "AkcwRAIgZRfIY3p7/DoVTty6YZbWS71bc5Vct9p9Fia83eRmw2QCICK/ENGfwLtptFluMGs2KsqoNSk89pO7F29zJLUx9a/sASECx/EgAxlkQpQ9hYjgGu6EBCPMVPwVIVJqO4XCsMvViHI=";

    const P2TR_ADDRESS: &str = "bc1ppv609nr0vr25u07u95waq5lucwfm6tde4nydujnu8npg4q75mr5sxq8lt3";
    const P2TR_HELLO_WORLD: &str = "AUHd69PrJQEv+oKTfZ8l+WROBHuy9HKrbFCJu7U1iK2iiEy1vMU5EfMtjc+VSHM7aU0SDbak5IUZRVno2P5mjSafAQ==";

    #[test]
    fn test_reference_p2wpkh_signature() {
        verify_simple(P2WPKH_ADDRESS, "Hello World", P2WPKH_HELLO_WORLD, Network::Bitcoin)
            .unwrap();
    }

    #[test]
    fn test_reference_p2tr_signature() {
        verify_simple(P2TR_ADDRESS, "Hello World", P2TR_HELLO_WORLD, Network::Bitcoin).unwrap();
    }

    #[test]
    fn test_wrong_message_is_invalid() {
        assert!(matches!(
            verify_simple(P2WPKH_ADDRESS, "Hello World!", P2WPKH_HELLO_WORLD, Network::Bitcoin),
            Err(VerifyError::Invalid)
        ));
        assert!(matches!(
            verify_simple(P2TR_ADDRESS, "", P2TR_HELLO_WORLD, Network::Bitcoin),
            Err(VerifyError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_address_is_key_mismatch() {
        assert!(matches!(
            verify(
                "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu",
                "Hello World",
                P2WPKH_HELLO_WORLD,
                Network::Bitcoin
            ),
            Err(VerifyError::KeyMismatch)
        ));
    }

    #[test]
    fn test_witness_shape_is_checked() {
        assert!(matches!(
            verify_simple(P2TR_ADDRESS, "Hello World", P2WPKH_HELLO_WORLD, Network::Bitcoin),
            Err(VerifyError::WitnessShape {
                expected: 1,
                got: 2
            })
        ));
        assert!(matches!(
            verify_simple(P2WPKH_ADDRESS, "Hello World", "!!", Network::Bitcoin),
            Err(VerifyError::Base64(_))
        ));
    }
}
