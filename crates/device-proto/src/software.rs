//! In-memory device backed by a master extended private key.
//!
//! Behaves like a hardware signer that approves (or, when configured, declines) every request
//! without user interaction. Used for development and tests.

use bip322_primitives::address::AddressType;
use bitcoin::{
    bip32::{DerivationPath, Fingerprint, Xpriv, Xpub},
    ecdsa,
    hashes::Hash,
    key::{Keypair, TapTweak},
    psbt::Input,
    secp256k1::{Message, PublicKey, SecretKey},
    sighash::{EcdsaSighashType, Prevouts, SighashCache, TapSighashType},
    sign_message::{signed_msg_hash, MessageSignature},
    Psbt, TxOut,
};
use secp256k1::SECP256K1;
use tracing::{debug, info, warn};

use crate::{
    errors::{DeviceError, DeviceResult, StatusWord},
    policy::WalletPolicy,
    traits::{DeviceConnector, DeviceSession, DeviceSignature},
};

fn incorrect_data(reason: impl std::fmt::Display) -> DeviceError {
    warn!(%reason, "refusing request");

    DeviceError::Status {
        status: StatusWord::INCORRECT_DATA,
    }
}

/// A device session whose keys live in memory.
#[derive(Debug, Clone)]
pub struct SoftwareDevice {
    master: Xpriv,
    reject_signing: bool,
    open: bool,
}

impl SoftwareDevice {
    /// Creates a new device holding `master`.
    pub const fn new(master: Xpriv) -> Self {
        Self {
            master,
            reject_signing: false,
            open: true,
        }
    }

    /// Makes every signing request fail as if the user declined it on the device.
    pub const fn rejecting(mut self) -> Self {
        self.reject_signing = true;
        self
    }

    /// Whether the session has not been closed yet.
    pub const fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> DeviceResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(DeviceError::Transport("session closed".to_string()))
        }
    }

    fn ensure_approved(&self) -> DeviceResult<()> {
        if self.reject_signing {
            info!("declining signing request");
            return Err(DeviceError::Status {
                status: StatusWord::DENIED_BY_USER,
            });
        }

        Ok(())
    }

    fn fingerprint(&self) -> Fingerprint {
        self.master.fingerprint(SECP256K1)
    }

    fn secret_at(&self, path: &DerivationPath) -> DeviceResult<SecretKey> {
        self.master
            .derive_priv(SECP256K1, path)
            .map(|child| child.private_key)
            .map_err(incorrect_data)
    }

    fn sign_segwit_v0_input(
        &self,
        psbt: &Psbt,
        index: usize,
        input: &Input,
        nested: bool,
    ) -> DeviceResult<Option<DeviceSignature>> {
        let fingerprint = self.fingerprint();
        let Some((pubkey, (_, path))) = input
            .bip32_derivation
            .iter()
            .find(|(_, (origin, _))| *origin == fingerprint)
        else {
            return Ok(None);
        };

        let secret = self.secret_at(path)?;
        if PublicKey::from_secret_key(SECP256K1, &secret) != *pubkey {
            return Err(incorrect_data(format!("key at {path} does not match {pubkey}")));
        }

        let utxo = input
            .witness_utxo
            .as_ref()
            .ok_or_else(|| incorrect_data("missing witness utxo"))?;
        let script_code = if nested {
            input
                .redeem_script
                .as_ref()
                .ok_or_else(|| incorrect_data("missing redeem script"))?
        } else {
            &utxo.script_pubkey
        };

        let mut cache = SighashCache::new(&psbt.unsigned_tx);
        let sighash = cache
            .p2wpkh_signature_hash(index, script_code, utxo.value, EcdsaSighashType::All)
            .map_err(incorrect_data)?;

        let message = Message::from_digest(sighash.to_byte_array());
        let signature = ecdsa::Signature::sighash_all(SECP256K1.sign_ecdsa(&message, &secret));

        Ok(Some(DeviceSignature {
            pubkey: pubkey.serialize().to_vec(),
            signature: signature.to_vec(),
        }))
    }

    fn sign_taproot_input(
        &self,
        psbt: &Psbt,
        index: usize,
        input: &Input,
    ) -> DeviceResult<Option<DeviceSignature>> {
        let fingerprint = self.fingerprint();
        let Some((internal_key, (_, (_, path)))) = input
            .tap_key_origins
            .iter()
            .find(|(_, (leaves, (origin, _)))| leaves.is_empty() && *origin == fingerprint)
        else {
            return Ok(None);
        };

        let keypair = Keypair::from_secret_key(SECP256K1, &self.secret_at(path)?);
        if keypair.x_only_public_key().0 != *internal_key {
            return Err(incorrect_data(format!(
                "key at {path} does not match {internal_key}"
            )));
        }

        let prevouts = psbt
            .inputs
            .iter()
            .map(|input| {
                input
                    .witness_utxo
                    .clone()
                    .ok_or_else(|| incorrect_data("missing witness utxo"))
            })
            .collect::<DeviceResult<Vec<TxOut>>>()?;

        let mut cache = SighashCache::new(&psbt.unsigned_tx);
        let sighash = cache
            .taproot_key_spend_signature_hash(
                index,
                &Prevouts::All(&prevouts),
                TapSighashType::Default,
            )
            .map_err(incorrect_data)?;

        let tweaked = keypair
            .tap_tweak(SECP256K1, input.tap_merkle_root)
            .to_keypair();
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = SECP256K1.sign_schnorr_no_aux_rand(&message, &tweaked);

        Ok(Some(DeviceSignature {
            pubkey: internal_key.serialize().to_vec(),
            signature: signature.serialize().to_vec(),
        }))
    }
}

impl DeviceSession for SoftwareDevice {
    async fn master_fingerprint(&mut self) -> DeviceResult<Fingerprint> {
        self.ensure_open()?;

        Ok(self.fingerprint())
    }

    async fn export_extended_pubkey(&mut self, path: &DerivationPath) -> DeviceResult<Xpub> {
        self.ensure_open()?;

        let child = self
            .master
            .derive_priv(SECP256K1, path)
            .map_err(incorrect_data)?;
        debug!(%path, "exported extended public key");

        Ok(Xpub::from_priv(SECP256K1, &child))
    }

    async fn sign_message(&mut self, message: &str, path: &DerivationPath) -> DeviceResult<String> {
        self.ensure_open()?;
        self.ensure_approved()?;

        let secret = self.secret_at(path)?;
        let digest = signed_msg_hash(message);
        let signature = SECP256K1
            .sign_ecdsa_recoverable(&Message::from_digest(digest.to_byte_array()), &secret);
        debug!(%path, "signed legacy message");

        Ok(MessageSignature::new(signature, true).to_base64())
    }

    async fn sign_psbt(
        &mut self,
        psbt: &Psbt,
        policy: &WalletPolicy,
    ) -> DeviceResult<Vec<(usize, DeviceSignature)>> {
        self.ensure_open()?;

        let address_type = policy
            .address_type()
            .ok_or_else(|| incorrect_data(format!("unknown policy {}", policy.descriptor_template)))?;
        if policy.keys.iter().all(|key| key.fingerprint != self.fingerprint()) {
            return Err(incorrect_data("policy does not contain a key of this device"));
        }

        self.ensure_approved()?;

        let mut signatures = Vec::with_capacity(psbt.inputs.len());
        for (index, input) in psbt.inputs.iter().enumerate() {
            let signature = match address_type {
                AddressType::Segwit => self.sign_segwit_v0_input(psbt, index, input, true)?,
                AddressType::NativeSegwit => {
                    self.sign_segwit_v0_input(psbt, index, input, false)?
                }
                AddressType::Taproot => self.sign_taproot_input(psbt, index, input)?,
                AddressType::Legacy => None,
            };

            if let Some(signature) = signature {
                signatures.push((index, signature));
            }
        }

        debug!(policy = %policy.descriptor_template, signed = signatures.len(), "signed psbt");

        Ok(signatures)
    }

    async fn close(&mut self) {
        self.open = false;
    }
}

/// Hands out fresh [`SoftwareDevice`] sessions for the same master key.
#[derive(Debug, Clone)]
pub struct SoftwareConnector {
    device: SoftwareDevice,
    connections: usize,
}

impl SoftwareConnector {
    /// Creates a connector whose sessions behave like `device`.
    pub const fn new(device: SoftwareDevice) -> Self {
        Self {
            device,
            connections: 0,
        }
    }

    /// The number of sessions opened so far.
    pub const fn connections(&self) -> usize {
        self.connections
    }
}

impl DeviceConnector for SoftwareConnector {
    type Session = SoftwareDevice;

    async fn connect(&mut self) -> DeviceResult<SoftwareDevice> {
        self.connections += 1;

        let mut session = self.device.clone();
        session.open = true;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bip322_key_deriv::KeyDeriver;
    use bitcoin::Network;

    use super::*;

    const MASTER: &str = "xprv9s21ZrQH143K3GJpoapnV8SFfukcVBSfeCficPSGfubmSFDxo1kuHnLisriDvSnRRuL2Qrg5ggqHKNVpxR86QEC8w35uxmGoggxtQTPvfUu";

    fn device() -> SoftwareDevice {
        SoftwareDevice::new(Xpriv::from_str(MASTER).unwrap())
    }

    fn path(path: &str) -> DerivationPath {
        DerivationPath::from_str(path).unwrap()
    }

    #[tokio::test]
    async fn test_fingerprint_and_export() {
        let mut device = device();

        assert_eq!(
            device.master_fingerprint().await.unwrap(),
            Fingerprint::from_str("73c5da0a").unwrap()
        );
        assert_eq!(
            device
                .export_extended_pubkey(&path("m/84'/0'/0'"))
                .await
                .unwrap()
                .to_string(),
            "xpub6CatWdiZiodmUeTDp8LT5or8nmbKNcuyvz7WyksVFkKB4RHwCD3XyuvPEbvqAQY3rAPshWcMLoP2fMFMKHPJ4ZeZXYVUhLv1VMrjPC7PW6V"
        );
    }

    #[tokio::test]
    async fn test_sign_message_recovers_to_address_key() {
        let mut device = device();
        let signature = device
            .sign_message("Hello World", &path("m/44'/0'/0'/0/0"))
            .await
            .unwrap();

        let signature = MessageSignature::from_base64(&signature).unwrap();
        let recovered = signature
            .recover_pubkey(SECP256K1, signed_msg_hash("Hello World"))
            .unwrap();

        let account = device
            .export_extended_pubkey(&path("m/44'/0'/0'"))
            .await
            .unwrap();
        let expected = KeyDeriver::new(Network::Bitcoin)
            .derive(&account, 0, AddressType::Legacy)
            .unwrap();

        assert_eq!(recovered.inner, *expected.public_key());
    }

    #[tokio::test]
    async fn test_rejecting_device() {
        let mut device = device().rejecting();

        let err = device
            .sign_message("Hello World", &path("m/44'/0'/0'/0/0"))
            .await
            .unwrap_err();
        assert!(err.is_user_rejection());

        // exports are never declined
        assert!(device.master_fingerprint().await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_session_fails() {
        let mut connector = SoftwareConnector::new(device());
        let mut session = connector.connect().await.unwrap();

        session.close().await;
        assert!(!session.is_open());
        assert!(session.master_fingerprint().await.unwrap_err().is_connectivity());

        let mut fresh = connector.connect().await.unwrap();
        assert!(fresh.master_fingerprint().await.is_ok());
        assert_eq!(connector.connections(), 2);
    }
}
