//! Traits implemented by device sessions and the connectors that open them.

use std::future::Future;

use bitcoin::{
    bip32::{DerivationPath, Fingerprint, Xpub},
    Psbt,
};

use crate::{errors::DeviceResult, policy::WalletPolicy};

/// A signature over one PSBT input as returned by the device.
///
/// The bytes are exactly what the device sent: a DER encoded ECDSA signature followed by the
/// sighash byte for segwit v0 inputs, or a 64/65-byte Schnorr signature for taproot inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignature {
    /// The public key the signature verifies under: 33 bytes for ECDSA, 32 bytes for taproot.
    pub pubkey: Vec<u8>,

    /// The raw signature.
    pub signature: Vec<u8>,
}

/// An open session with a signing device.
///
/// All methods take `&mut self`: the device serializes requests and a second request sent while
/// one is pending would corrupt its on-screen flow, so only one request may be in flight.
pub trait DeviceSession: Send {
    /// Returns the fingerprint of the device's master key.
    fn master_fingerprint(&mut self) -> impl Future<Output = DeviceResult<Fingerprint>> + Send;

    /// Exports the extended public key at `path`.
    fn export_extended_pubkey(
        &mut self,
        path: &DerivationPath,
    ) -> impl Future<Output = DeviceResult<Xpub>> + Send;

    /// Signs `message` with the legacy signed-message scheme using the key at `path`.
    ///
    /// Returns the base64 encoded compact recoverable signature.
    fn sign_message(
        &mut self,
        message: &str,
        path: &DerivationPath,
    ) -> impl Future<Output = DeviceResult<String>> + Send;

    /// Signs the inputs of `psbt` that belong to `policy`.
    ///
    /// Returns the signatures keyed by input index.
    fn sign_psbt(
        &mut self,
        psbt: &Psbt,
        policy: &WalletPolicy,
    ) -> impl Future<Output = DeviceResult<Vec<(usize, DeviceSignature)>>> + Send;

    /// Releases the session. Requests made afterwards fail with a transport error.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Establishes sessions with a device.
pub trait DeviceConnector: Send {
    /// The session type produced.
    type Session: DeviceSession;

    /// Performs the handshake and opens a new session.
    fn connect(&mut self) -> impl Future<Output = DeviceResult<Self::Session>> + Send;
}
