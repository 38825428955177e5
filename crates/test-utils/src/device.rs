//! A device double with canned answers that records every request it receives.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use bip322_device::{
    DeviceConnector, DeviceError, DeviceResult, DeviceSession, DeviceSignature, SoftwareDevice,
    WalletPolicy,
};
use bitcoin::{
    bip32::{DerivationPath, Fingerprint, Xpub},
    Psbt,
};
use tokio::time::sleep;
use tracing::debug;

use crate::fixtures::software_device;

/// A request received by a [`ScriptedDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    /// `master_fingerprint`.
    MasterFingerprint,
    /// `export_extended_pubkey` at the given path.
    ExportExtendedPubkey(DerivationPath),
    /// `sign_message` with the given message and path.
    SignMessage {
        /// The message.
        message: String,
        /// The key path.
        path: DerivationPath,
    },
    /// `sign_psbt` under the given descriptor template.
    SignPsbt {
        /// The descriptor template of the policy.
        descriptor_template: String,
    },
    /// `close`.
    Close,
}

/// The requests received by every session of a connector, in order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<DeviceCall>>>);

impl CallLog {
    fn record(&self, call: DeviceCall) {
        self.0.lock().expect("call log poisoned").push(call);
    }

    /// Returns a copy of the calls recorded so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.0.lock().expect("call log poisoned").clone()
    }

    /// Returns the number of `sign_message` calls.
    pub fn sign_message_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::SignMessage { .. }))
            .count()
    }

    /// Returns the number of `sign_psbt` calls.
    pub fn sign_psbt_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::SignPsbt { .. }))
            .count()
    }

    /// Returns the number of `export_extended_pubkey` calls.
    pub fn export_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::ExportExtendedPubkey(_)))
            .count()
    }

    /// Returns the number of `close` calls.
    pub fn close_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::Close))
            .count()
    }
}

/// A session that answers like a [`SoftwareDevice`] unless told otherwise.
#[derive(Debug, Clone)]
pub struct ScriptedDevice {
    inner: SoftwareDevice,
    log: CallLog,
    psbt_answer: Option<DeviceResult<Vec<(usize, DeviceSignature)>>>,
    message_answer: Option<DeviceResult<String>>,
    export_failure: Option<DeviceError>,
    export_delay: Option<Duration>,
}

impl Default for ScriptedDevice {
    fn default() -> Self {
        Self::new(software_device())
    }
}

impl ScriptedDevice {
    /// Creates a device that answers every request with `inner`.
    pub fn new(inner: SoftwareDevice) -> Self {
        Self {
            inner,
            log: CallLog::default(),
            psbt_answer: None,
            message_answer: None,
            export_failure: None,
            export_delay: None,
        }
    }

    /// Answers every `sign_psbt` request with `answer`.
    pub fn with_psbt_answer(mut self, answer: DeviceResult<Vec<(usize, DeviceSignature)>>) -> Self {
        self.psbt_answer = Some(answer);
        self
    }

    /// Answers every `sign_message` request with `answer`.
    pub fn with_message_answer(mut self, answer: DeviceResult<String>) -> Self {
        self.message_answer = Some(answer);
        self
    }

    /// Fails every `export_extended_pubkey` request with `err`.
    pub fn failing_exports(mut self, err: DeviceError) -> Self {
        self.export_failure = Some(err);
        self
    }

    /// Delays every `export_extended_pubkey` answer by `delay`.
    pub const fn slow_exports(mut self, delay: Duration) -> Self {
        self.export_delay = Some(delay);
        self
    }

    /// Returns the log shared by every copy of this device.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl DeviceSession for ScriptedDevice {
    async fn master_fingerprint(&mut self) -> DeviceResult<Fingerprint> {
        self.log.record(DeviceCall::MasterFingerprint);

        self.inner.master_fingerprint().await
    }

    async fn export_extended_pubkey(&mut self, path: &DerivationPath) -> DeviceResult<Xpub> {
        self.log
            .record(DeviceCall::ExportExtendedPubkey(path.clone()));

        if let Some(delay) = self.export_delay {
            debug!(?delay, "delaying export");
            sleep(delay).await;
        }
        if let Some(err) = &self.export_failure {
            return Err(err.clone());
        }

        self.inner.export_extended_pubkey(path).await
    }

    async fn sign_message(&mut self, message: &str, path: &DerivationPath) -> DeviceResult<String> {
        self.log.record(DeviceCall::SignMessage {
            message: message.to_string(),
            path: path.clone(),
        });

        match &self.message_answer {
            Some(answer) => answer.clone(),
            None => self.inner.sign_message(message, path).await,
        }
    }

    async fn sign_psbt(
        &mut self,
        psbt: &Psbt,
        policy: &WalletPolicy,
    ) -> DeviceResult<Vec<(usize, DeviceSignature)>> {
        self.log.record(DeviceCall::SignPsbt {
            descriptor_template: policy.descriptor_template.clone(),
        });

        match &self.psbt_answer {
            Some(answer) => answer.clone(),
            None => self.inner.sign_psbt(psbt, policy).await,
        }
    }

    async fn close(&mut self) {
        self.log.record(DeviceCall::Close);

        self.inner.close().await
    }
}

/// Opens [`ScriptedDevice`] sessions, or fails the handshake when told to.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    device: ScriptedDevice,
    handshake_failure: Option<DeviceError>,
    connections: usize,
}

impl ScriptedConnector {
    /// Creates a connector whose sessions are copies of `device`.
    pub fn new(device: ScriptedDevice) -> Self {
        Self {
            device,
            handshake_failure: None,
            connections: 0,
        }
    }

    /// Fails every handshake with `err`.
    pub fn failing_handshake(mut self, err: DeviceError) -> Self {
        self.handshake_failure = Some(err);
        self
    }

    /// Returns the log shared by every session.
    pub fn log(&self) -> CallLog {
        self.device.log()
    }

    /// Returns the number of handshakes attempted.
    pub const fn connections(&self) -> usize {
        self.connections
    }
}

impl DeviceConnector for ScriptedConnector {
    type Session = ScriptedDevice;

    async fn connect(&mut self) -> DeviceResult<ScriptedDevice> {
        self.connections += 1;

        if let Some(err) = &self.handshake_failure {
            return Err(err.clone());
        }

        Ok(self.device.clone())
    }
}
