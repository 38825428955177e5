//! Carries out the device facing duties of the Signing State Machine.
//!
//! Every function performs one duty against an open session and translates the outcome into the
//! event the state machine expects back. Device errors never escape: they become
//! [`SigningEvent::Failed`] (or the duty specific failure event) so that the state machine decides
//! what happens next.

use std::{future::Future, time::Duration};

use bip322_device::{DeviceConnector, DeviceError, DeviceResult, DeviceSession, WalletPolicy};
use bip322_key_deriv::{find_path, Candidate, KeyDeriver, SearchProgress};
use bip322_primitives::{
    address::AddressType,
    paths::DerivationPrefix,
    types::{Progress, SearchSpace},
};
use bip322_signing_sm::signing::{errors::FailureKind, events::SigningEvent};
use bitcoin::{
    bip32::{DerivationPath, Fingerprint},
    Network, Psbt,
};
use tokio::time;
use tracing::{debug, info, warn};

use crate::observer::SigningObserver;

/// Bounds a non-interactive device request by `timeout`.
async fn bounded<T>(
    timeout: Duration,
    request: impl Future<Output = DeviceResult<T>>,
) -> DeviceResult<T> {
    time::timeout(timeout, request)
        .await
        .unwrap_or(Err(DeviceError::Timeout(timeout)))
}

fn failed(err: &DeviceError) -> SigningEvent {
    SigningEvent::Failed {
        kind: err.into(),
        reason: err.to_string(),
    }
}

/// Opens a session and reads the master fingerprint of the device.
///
/// A session whose fingerprint cannot be read is closed before the error is returned.
pub async fn handshake<C: DeviceConnector>(
    connector: &mut C,
    timeout: Duration,
) -> DeviceResult<(C::Session, Fingerprint)> {
    let mut session = bounded(timeout, connector.connect()).await?;

    match bounded(timeout, session.master_fingerprint()).await {
        Ok(fingerprint) => {
            info!(%fingerprint, "connected to device");
            Ok((session, fingerprint))
        }
        Err(err) => {
            session.close().await;
            Err(err)
        }
    }
}

/// Checks that the device still answers by exporting the key at `path`.
pub async fn probe_liveness<S: DeviceSession>(
    session: &mut S,
    path: &DerivationPath,
    timeout: Duration,
) -> DeviceResult<()> {
    bounded(timeout, session.export_extended_pubkey(path)).await?;
    debug!(%path, "device is alive");

    Ok(())
}

/// Exports the account keys within `search_space` and searches them for `address`.
///
/// Reports progress to `observer` after every export and after every scanned account. The
/// reported values never decrease and end at [`Progress::DONE`] when the address is found.
///
/// Fails without exporting anything when the account bound needs more than `max_exports` keys.
pub async fn search_path<S: DeviceSession, O: SigningObserver>(
    session: &mut S,
    observer: &mut O,
    network: Network,
    address: &str,
    address_type: AddressType,
    search_space: SearchSpace,
    max_exports: u64,
    timeout: Duration,
) -> SigningEvent {
    if search_space.account_count() > max_exports {
        warn!(
            account_bound = search_space.account_bound,
            %max_exports,
            "search needs more account exports than allowed"
        );
        return SigningEvent::Failed {
            kind: FailureKind::Unknown,
            reason: format!(
                "searching {} accounts exceeds the limit of {max_exports} exports",
                search_space.account_count()
            ),
        };
    }

    let prefix = DerivationPrefix::new(address_type, network);
    let progress = SearchProgress::new(search_space.account_count());

    info!(
        %address,
        %address_type,
        account_bound = search_space.account_bound,
        address_index_bound = search_space.address_index_bound,
        "searching derivation path"
    );
    observer.on_progress(Progress::ZERO);

    let mut candidates = Vec::new();
    for account in 0..=search_space.account_bound {
        let account_path = match prefix.account(account) {
            Ok(path) => path,
            Err(err) => {
                return SigningEvent::Failed {
                    kind: FailureKind::Unknown,
                    reason: err.to_string(),
                }
            }
        };

        let xpub = match bounded(timeout, session.export_extended_pubkey(&account_path)).await {
            Ok(xpub) => xpub,
            Err(err) => {
                warn!(%account_path, %err, "could not export account key");
                return failed(&err);
            }
        };

        candidates.push(Candidate {
            account,
            account_path,
            xpub,
        });
        observer.on_progress(progress.account_fetched(candidates.len() as u64));
    }

    let deriver = KeyDeriver::new(network);
    match find_path(
        &deriver,
        address,
        &candidates,
        search_space.address_index_bound,
        |progress| observer.on_progress(progress),
    ) {
        Ok(found) => SigningEvent::SearchCompleted {
            found: found.map(Box::new),
        },
        Err(err) => SigningEvent::Failed {
            kind: FailureKind::Unknown,
            reason: err.to_string(),
        },
    }
}

/// Asks the device to sign the `to_sign` PSBT.
///
/// Not bounded by a timeout: the user has to approve the request on the device.
pub async fn sign_psbt<S: DeviceSession>(
    session: &mut S,
    psbt: &Psbt,
    policy: &WalletPolicy,
) -> SigningEvent {
    info!(policy = %policy.descriptor_template, "requesting psbt signature");

    match session.sign_psbt(psbt, policy).await {
        Ok(signatures) => SigningEvent::PsbtSigned { signatures },
        Err(err) => {
            warn!(%err, "device did not sign psbt");
            failed(&err)
        }
    }
}

/// Asks the device for a legacy signed-message signature.
///
/// Not bounded by a timeout: the user has to approve the request on the device.
pub async fn sign_message<S: DeviceSession>(
    session: &mut S,
    message: &str,
    path: &DerivationPath,
) -> SigningEvent {
    info!(%path, "requesting message signature");

    match session.sign_message(message, path).await {
        Ok(signature) => SigningEvent::MessageSigned { signature },
        Err(err) => {
            warn!(%err, "device did not sign message");
            failed(&err)
        }
    }
}
