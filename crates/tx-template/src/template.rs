//! The `to_spend` transaction and the `to_sign` PSBT handed to the device.

use std::{collections::BTreeMap, marker::PhantomData};

use bip322_device::{DeviceSignature, KeyInfo};
use bip322_key_deriv::{DerivedKey, FoundPath};
use bip322_primitives::address::AddressType;
use bitcoin::{
    absolute::LockTime,
    bip32::Fingerprint,
    ecdsa,
    hashes::Hash,
    hex::DisplayHex,
    opcodes::{all::OP_RETURN, OP_0},
    script::{Builder, PushBytesBuf},
    taproot,
    transaction::Version,
    Amount, OutPoint, Psbt, PublicKey, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut,
    Witness,
};
use tracing::debug;

use crate::{
    encode::EncodedSignature,
    errors::{FinalizationError, FinalizationResult, TemplateError, TemplateResult},
    message::message_hash,
};

/// The only input of `to_sign`, and the only one the device signs.
pub const SIGNED_INPUT_INDEX: usize = 0;

/// Builds the `to_spend` transaction committing to `message` and paying to `script_pubkey`.
///
/// The result depends on nothing else, so the same inputs always produce the same txid.
pub fn to_spend(script_pubkey: &Script, message: &[u8]) -> Transaction {
    let script_sig = Builder::new()
        .push_opcode(OP_0)
        .push_slice(message_hash(message).to_byte_array())
        .into_script();

    Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig,
            sequence: Sequence::ZERO,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: script_pubkey.to_owned(),
        }],
    }
}

/// Builds the unsigned `to_sign` transaction spending the output of `to_spend`.
pub fn to_sign_tx(to_spend: &Transaction) -> Transaction {
    Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: to_spend.compute_txid(),
                vout: 0,
            },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ZERO,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: Builder::new().push_opcode(OP_RETURN).into_script(),
        }],
    }
}

/// The output kinds that are signed through a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    ShWpkh,
    Wpkh,
    Tr,
}

impl TemplateKind {
    fn of(key: &DerivedKey) -> TemplateResult<Self> {
        let script = key.script_pubkey();
        let (kind, well_formed) = match key.address_type() {
            AddressType::Legacy => return Err(TemplateError::NoTemplateForLegacy),
            AddressType::Segwit => (
                TemplateKind::ShWpkh,
                script.is_p2sh()
                    && key.redeem_script().is_some_and(|redeem| {
                        redeem.is_p2wpkh() && ScriptBuf::new_p2sh(&redeem.script_hash()) == *script
                    }),
            ),
            AddressType::NativeSegwit => (TemplateKind::Wpkh, script.is_p2wpkh()),
            AddressType::Taproot => (TemplateKind::Tr, script.is_p2tr()),
        };

        if !well_formed {
            return Err(TemplateError::UnexpectedScript {
                address_type: key.address_type(),
                script: script.clone(),
            });
        }

        Ok(kind)
    }
}

/// Marker for a template that has not been signed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsigned;

/// Marker for a template carrying the device's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed;

/// The `to_sign` PSBT together with the `to_spend` transaction it spends.
///
/// Built fresh for every signing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToSign<Status = Unsigned> {
    kind: TemplateKind,

    to_spend: Transaction,

    psbt: Psbt,

    signing_key: DerivedKey,

    key_info: KeyInfo,

    status: PhantomData<Status>,
}

/// A template waiting for the device's signature.
pub type UnsignedTemplate = ToSign<Unsigned>;

impl<Status> ToSign<Status> {
    /// The address type being signed for.
    pub const fn address_type(&self) -> AddressType {
        self.signing_key.address_type()
    }

    /// The `to_spend` transaction.
    pub const fn to_spend(&self) -> &Transaction {
        &self.to_spend
    }

    /// The `to_sign` PSBT.
    pub const fn psbt(&self) -> &Psbt {
        &self.psbt
    }

    /// The account key the signing key belongs to.
    pub const fn key_info(&self) -> &KeyInfo {
        &self.key_info
    }

    /// The key expected to sign.
    pub const fn signing_key(&self) -> &DerivedKey {
        &self.signing_key
    }
}

impl ToSign<Unsigned> {
    /// Builds the template for signing `message` with the key at `found`.
    ///
    /// `fingerprint` is the device's master key fingerprint, recorded in every key origin.
    pub fn new(message: &str, found: &FoundPath, fingerprint: Fingerprint) -> TemplateResult<Self> {
        let key = &found.key;
        let kind = TemplateKind::of(key)?;

        let to_spend = to_spend(key.script_pubkey(), message.as_bytes());
        let mut psbt = Psbt::from_unsigned_tx(to_sign_tx(&to_spend))
            .map_err(|e| TemplateError::Psbt(e.to_string()))?;

        psbt.xpub
            .insert(found.account_xpub, (fingerprint, found.account_path.clone()));

        let origin = (fingerprint, found.path.clone());
        let input = &mut psbt.inputs[SIGNED_INPUT_INDEX];
        input.witness_utxo = Some(TxOut {
            value: Amount::ZERO,
            script_pubkey: key.script_pubkey().clone(),
        });

        match kind {
            TemplateKind::ShWpkh => {
                input.non_witness_utxo = Some(to_spend.clone());
                input.redeem_script = key.redeem_script().cloned();
                input.bip32_derivation.insert(*key.public_key(), origin);
            }
            TemplateKind::Wpkh => {
                input.bip32_derivation.insert(*key.public_key(), origin);
            }
            TemplateKind::Tr => {
                let internal_key = key.internal_key();
                input.tap_internal_key = Some(internal_key);
                input
                    .tap_key_origins
                    .insert(internal_key, (Vec::new(), origin));
            }
        }

        debug!(
            address = %key.address(),
            path = %found.path,
            to_spend = %to_spend.compute_txid(),
            "built signing template"
        );

        Ok(Self {
            kind,
            to_spend,
            psbt,
            signing_key: key.clone(),
            key_info: KeyInfo {
                fingerprint,
                account_path: found.account_path.clone(),
                xpub: found.account_xpub,
            },
            status: PhantomData,
        })
    }

    /// Attaches the device's signature for the signed input.
    ///
    /// Fails if no signature was returned for the input, if it was made with another key or if it
    /// cannot be parsed.
    pub fn attach(
        mut self,
        signatures: &[(usize, DeviceSignature)],
    ) -> FinalizationResult<ToSign<Signed>> {
        let signature = signatures
            .iter()
            .find_map(|(index, signature)| (*index == SIGNED_INPUT_INDEX).then_some(signature))
            .ok_or(FinalizationError::MissingSignature(SIGNED_INPUT_INDEX))?;

        let expected = self.signing_key.signing_key_bytes();
        if signature.pubkey != expected {
            return Err(FinalizationError::UnexpectedPubkey {
                expected: expected.to_lower_hex_string(),
                got: signature.pubkey.to_lower_hex_string(),
            });
        }

        let input = &mut self.psbt.inputs[SIGNED_INPUT_INDEX];
        match self.kind {
            TemplateKind::ShWpkh | TemplateKind::Wpkh => {
                let signature = ecdsa::Signature::from_slice(&signature.signature)?;
                input.partial_sigs.insert(
                    PublicKey::new(*self.signing_key.public_key()),
                    signature,
                );
            }
            TemplateKind::Tr => {
                input.tap_key_sig = Some(taproot::Signature::from_slice(&signature.signature)?);
            }
        }

        let Self {
            kind,
            to_spend,
            psbt,
            signing_key,
            key_info,
            status: _,
        } = self;

        Ok(ToSign::<Signed> {
            kind,
            to_spend,
            psbt,
            signing_key,
            key_info,
            status: PhantomData,
        })
    }
}

impl ToSign<Signed> {
    /// Produces the final witness (and, for nested segwit, the unlocking script) of the signed
    /// input and returns the finalized `to_sign` transaction.
    pub fn finalize(mut self) -> FinalizationResult<Transaction> {
        let public_key = PublicKey::new(*self.signing_key.public_key());
        let input = &mut self.psbt.inputs[SIGNED_INPUT_INDEX];

        let witness = match self.kind {
            TemplateKind::ShWpkh | TemplateKind::Wpkh => {
                let signature = input
                    .partial_sigs
                    .get(&public_key)
                    .ok_or(FinalizationError::MissingSignature(SIGNED_INPUT_INDEX))?;

                Witness::from_slice(&[signature.to_vec(), public_key.to_bytes()])
            }
            TemplateKind::Tr => {
                let signature = input
                    .tap_key_sig
                    .ok_or(FinalizationError::MissingSignature(SIGNED_INPUT_INDEX))?;

                Witness::from_slice(&[signature.to_vec()])
            }
        };

        if self.kind == TemplateKind::ShWpkh {
            let redeem_script = input
                .redeem_script
                .as_ref()
                .ok_or_else(|| FinalizationError::ScriptSig("missing redeem script".to_string()))?;
            let push = PushBytesBuf::try_from(redeem_script.to_bytes())
                .map_err(|e| FinalizationError::ScriptSig(e.to_string()))?;

            input.final_script_sig = Some(Builder::new().push_slice(push).into_script());
        }
        input.final_script_witness = Some(witness);

        // finalizers drop everything but the utxo and final fields
        input.partial_sigs = BTreeMap::new();
        input.sighash_type = None;
        input.redeem_script = None;
        input.witness_script = None;
        input.bip32_derivation = BTreeMap::new();
        input.tap_key_sig = None;
        input.tap_key_origins = BTreeMap::new();
        input.tap_internal_key = None;
        input.tap_merkle_root = None;

        Ok(self.psbt.extract_tx_unchecked_fee_rate())
    }

    /// Finalizes the template and encodes the witness of the signed input.
    pub fn encode(self) -> FinalizationResult<EncodedSignature> {
        let tx = self.finalize()?;

        Ok(EncodedSignature::simple(&tx.input[SIGNED_INPUT_INDEX].witness))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bip322_key_deriv::KeyDeriver;
    use bip322_primitives::paths::{account_path, full_path};
    use bitcoin::{
        bip32::{DerivationPath, Xpub},
        consensus, Network,
    };

    use super::*;

    const FINGERPRINT: &str = "73c5da0a";
    const BIP84_XPUB: &str = "xpub6CatWdiZiodmUeTDp8LT5or8nmbKNcuyvz7WyksVFkKB4RHwCD3XyuvPEbvqAQY3rAPshWcMLoP2fMFMKHPJ4ZeZXYVUhLv1VMrjPC7PW6V";
    const BIP49_XPUB: &str = "xpub6C6nQwHaWbSrzs5tZ1q7m5R9cPK9eYpNMFesiXsYrgc1P8bvLLAet9JfHjYXKjToD8cBRswJXXbbFpXgwsswVPAZzKMa1jUp2kVkGVUaJa7";
    const BIP86_XPUB: &str = "xpub6BgBgsespWvERF3LHQu6CnqdvfEvtMcQjYrcRzx53QJjSxarj2afYWcLteoGVky7D3UKDP9QyrLprQ3VCECoY49yfdDEHGCtMMj92pReUsQ";

    // BIP-322 reference address, key hash 2b05d564e6a7a33c087f16e0f730d1440123799d
    const VECTOR_SCRIPT: &str = "00142b05d564e6a7a33c087f16e0f730d1440123799d";

    const STUB_DER_SIGNATURE: &str = "304402206517c8637a7bfc3a154edcba6196d64bbd5b73955cb7da7d1626bcdde466c364022022bf10d19fc0bb69b4596e306b362acaa835293cf693bb176f7324b531f5afec01";

    fn found(xpub: &str, address_type: AddressType) -> FoundPath {
        let account_xpub = Xpub::from_str(xpub).unwrap();
        let account_path = account_path(address_type, Network::Bitcoin, 0).unwrap();
        let key = KeyDeriver::new(Network::Bitcoin)
            .derive(&account_xpub, 0, address_type)
            .unwrap();

        FoundPath {
            account: 0,
            address_index: 0,
            path: full_path(&account_path, 0).unwrap(),
            account_path,
            account_xpub,
            key,
        }
    }

    fn fingerprint() -> Fingerprint {
        Fingerprint::from_str(FINGERPRINT).unwrap()
    }

    fn vector_script() -> ScriptBuf {
        ScriptBuf::from_hex(VECTOR_SCRIPT).unwrap()
    }

    #[test]
    fn test_txid_vectors() {
        let cases = [
            (
                "",
                "c5680aa69bb8d860bf82d4e9cd3504b55dde018de765a91bb566283c545a99a7",
                "1e9654e951a5ba44c8604c4de6c67fd78a27e81dcadcfe1edf638ba3aaebaed6",
            ),
            (
                "Hello World",
                "b79d196740ad5217771c1098fc4a4b51e0535c32236c71f1ea4d61a2d603352b",
                "88737ae86f2077145f93cc4b153ae9a1cb8d56afa511988c149c5c8c9d93bddf",
            ),
        ];

        for (message, to_spend_txid, to_sign_txid) in cases {
            let to_spend = to_spend(&vector_script(), message.as_bytes());
            let to_sign = to_sign_tx(&to_spend);

            assert_eq!(to_spend.compute_txid().to_string(), to_spend_txid);
            assert_eq!(to_sign.compute_txid().to_string(), to_sign_txid);
        }
    }

    #[test]
    fn test_to_spend_depends_only_on_script_and_message() {
        let first = to_spend(&vector_script(), b"Hello World");
        let second = to_spend(&vector_script(), b"Hello World");
        assert_eq!(consensus::serialize(&first), consensus::serialize(&second));

        let other_message = to_spend(&vector_script(), b"Hello World!");
        assert_ne!(first.compute_txid(), other_message.compute_txid());
    }

    #[test]
    fn test_to_sign_shape() {
        let to_spend = to_spend(&vector_script(), b"");
        let to_sign = to_sign_tx(&to_spend);

        assert_eq!(to_sign.version, Version(0));
        assert_eq!(to_sign.input.len(), 1);
        assert_eq!(to_sign.input[0].sequence, Sequence::ZERO);
        assert_eq!(to_sign.output.len(), 1);
        assert_eq!(to_sign.output[0].value, Amount::ZERO);
        assert_eq!(to_sign.output[0].script_pubkey.as_bytes(), &[0x6a]);
    }

    #[test]
    fn test_native_segwit_metadata() {
        let found = found(BIP84_XPUB, AddressType::NativeSegwit);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();
        let input = &template.psbt().inputs[SIGNED_INPUT_INDEX];

        assert_eq!(
            input.witness_utxo.as_ref().unwrap().script_pubkey,
            *found.key.script_pubkey()
        );
        assert!(input.non_witness_utxo.is_none());
        assert!(input.redeem_script.is_none());
        assert_eq!(
            input.bip32_derivation.get(found.key.public_key()),
            Some(&(fingerprint(), DerivationPath::from_str("m/84'/0'/0'/0/0").unwrap()))
        );
        assert_eq!(
            template.psbt().xpub.get(&found.account_xpub),
            Some(&(fingerprint(), DerivationPath::from_str("m/84'/0'/0'").unwrap()))
        );
    }

    #[test]
    fn test_nested_segwit_metadata() {
        let found = found(BIP49_XPUB, AddressType::Segwit);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();
        let input = &template.psbt().inputs[SIGNED_INPUT_INDEX];

        assert_eq!(input.non_witness_utxo.as_ref(), Some(template.to_spend()));
        assert_eq!(input.redeem_script.as_ref(), found.key.redeem_script());
        assert!(input.bip32_derivation.contains_key(found.key.public_key()));
        assert!(input.witness_utxo.is_some());
    }

    #[test]
    fn test_taproot_metadata() {
        let found = found(BIP86_XPUB, AddressType::Taproot);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();
        let input = &template.psbt().inputs[SIGNED_INPUT_INDEX];

        let internal_key = found.key.internal_key();
        assert_eq!(input.tap_internal_key, Some(internal_key));

        let (leaves, origin) = input.tap_key_origins.get(&internal_key).unwrap();
        assert!(leaves.is_empty());
        assert_eq!(origin.0, fingerprint());
        assert_eq!(origin.1, DerivationPath::from_str("m/86'/0'/0'/0/0").unwrap());
        assert!(input.bip32_derivation.is_empty());
    }

    #[test]
    fn test_legacy_has_no_template() {
        let found = found(BIP84_XPUB, AddressType::Legacy);

        assert!(matches!(
            ToSign::new("Hello World", &found, fingerprint()),
            Err(TemplateError::NoTemplateForLegacy)
        ));
    }

    #[test]
    fn test_golden_native_segwit_encoding() {
        let found = found(BIP84_XPUB, AddressType::NativeSegwit);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();

        let signature = DeviceSignature {
            pubkey: found.key.public_key().serialize().to_vec(),
            signature: hex::decode(STUB_DER_SIGNATURE).unwrap(),
        };
        let encoded = template.attach(&[(0, signature)]).unwrap().encode().unwrap();

        assert_eq!(
            encoded.as_str(),
            "AkcwRAIgZRfIY3p7/DoVTty6YZbWS71bc5Vct9p9Fia83eRmw2QCICK/ENGfwLtptFluMGs2KsqoNSk89pO7F29zJLUx9a/sASEDMNVP0N1CCm5fjTYk9fNILK41D3nV8HU79b7vnC2Rrzw="
        );
    }

    #[test]
    fn test_attach_rejects_foreign_key() {
        let found = found(BIP84_XPUB, AddressType::NativeSegwit);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();

        let signature = DeviceSignature {
            pubkey: vec![0x02; 33],
            signature: hex::decode(STUB_DER_SIGNATURE).unwrap(),
        };

        assert!(matches!(
            template.attach(&[(0, signature)]),
            Err(FinalizationError::UnexpectedPubkey { .. })
        ));
    }

    #[test]
    fn test_attach_rejects_missing_and_malformed() {
        let found = found(BIP84_XPUB, AddressType::NativeSegwit);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();

        assert!(matches!(
            template.clone().attach(&[]),
            Err(FinalizationError::MissingSignature(0))
        ));

        let signature = DeviceSignature {
            pubkey: found.key.public_key().serialize().to_vec(),
            signature: vec![0x30, 0x01],
        };
        assert!(matches!(
            template.attach(&[(0, signature)]),
            Err(FinalizationError::Ecdsa(_))
        ));
    }

    #[test]
    fn test_nested_segwit_finalizes_script_sig() {
        let found = found(BIP49_XPUB, AddressType::Segwit);
        let template = ToSign::new("Hello World", &found, fingerprint()).unwrap();

        let signature = DeviceSignature {
            pubkey: found.key.public_key().serialize().to_vec(),
            signature: hex::decode(STUB_DER_SIGNATURE).unwrap(),
        };
        let tx = template.attach(&[(0, signature)]).unwrap().finalize().unwrap();
        let redeem = found.key.redeem_script().unwrap();

        let mut expected_script_sig = vec![redeem.len() as u8];
        expected_script_sig.extend_from_slice(redeem.as_bytes());
        assert_eq!(tx.input[0].script_sig.as_bytes(), expected_script_sig.as_slice());
        assert_eq!(tx.input[0].witness.len(), 2);
    }
}
