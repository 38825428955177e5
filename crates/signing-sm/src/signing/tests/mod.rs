//! Testing utilities specific to the Signing State Machine.

mod connection;

use std::sync::Arc;

use bip322_device::WalletPolicy;
use bip322_primitives::{address::AddressType, types::SearchSpace};
use bip322_test_utils::fixtures::{
    fingerprint, found_path, stub_device_signature, LEGACY_ADDRESS, NATIVE_SEGWIT_ADDRESS,
    NESTED_SEGWIT_ADDRESS, TAPROOT_ADDRESS,
};
use bip322_tx_template::{EncodedSignature, ToSign};

use crate::signing::{
    config::SigningSMCfg,
    context::SigningSMCtx,
    duties::SigningDuty,
    machine::SigningSM,
    state::{PendingSignature, SigningRequest, SigningState},
};

// ===== Test Constants =====

/// Message signed in tests.
pub(super) const TEST_MESSAGE: &str = "Hello World";

// ===== Helpers =====

/// Returns the configuration used by all tests.
pub(super) fn cfg() -> Arc<SigningSMCfg> {
    Arc::new(SigningSMCfg::default())
}

/// Creates a machine in `state` whose context matches it.
pub(super) fn create_sm(state: SigningState) -> SigningSM {
    SigningSM {
        context: SigningSMCtx {
            fingerprint: state.is_connected().then(fingerprint),
            last_failure: None,
        },
        state,
    }
}

/// Returns the state of `sm`.
pub(super) const fn get_state(sm: &SigningSM) -> &SigningState {
    sm.state()
}

/// Returns the first receive address of account 0 for `address_type`.
pub(super) const fn address_of(address_type: AddressType) -> &'static str {
    match address_type {
        AddressType::Legacy => LEGACY_ADDRESS,
        AddressType::Segwit => NESTED_SEGWIT_ADDRESS,
        AddressType::NativeSegwit => NATIVE_SEGWIT_ADDRESS,
        AddressType::Taproot => TAPROOT_ADDRESS,
    }
}

/// Returns a request to sign [`TEST_MESSAGE`] with the first address of `address_type`.
pub(super) fn request(address_type: AddressType) -> SigningRequest {
    SigningRequest {
        address: address_of(address_type).to_string(),
        message: TEST_MESSAGE.to_string(),
        address_type,
    }
}

/// Returns the state of a search for the first address of `address_type`.
pub(super) fn searching(address_type: AddressType) -> SigningState {
    SigningState::Searching {
        request: request(address_type),
        search_space: SearchSpace::default(),
    }
}

/// Returns the state after an unsuccessful search for the first address of `address_type`.
pub(super) fn exhausted(address_type: AddressType, search_space: SearchSpace) -> SigningState {
    SigningState::SearchExhausted {
        request: request(address_type),
        search_space,
    }
}

/// Returns the state and duty after the first address of `address_type` has been found.
pub(super) fn awaiting_approval(address_type: AddressType) -> (SigningState, SigningDuty) {
    let request = request(address_type);
    let found = found_path(address_type, 0);

    let (pending, duty) = if address_type == AddressType::Legacy {
        let duty = SigningDuty::SignMessage {
            message: TEST_MESSAGE.to_string(),
            path: found.path.clone(),
        };

        (PendingSignature::Message, duty)
    } else {
        let template = ToSign::new(TEST_MESSAGE, &found, fingerprint()).unwrap();
        let duty = SigningDuty::SignPsbt {
            psbt: Box::new(template.psbt().clone()),
            policy: WalletPolicy::default_for(address_type, template.key_info().clone()).unwrap(),
        };

        (PendingSignature::Template(Box::new(template)), duty)
    };

    let state = SigningState::AwaitingDeviceApproval {
        request,
        search_space: SearchSpace::default(),
        found: Box::new(found),
        pending,
    };

    (state, duty)
}

/// Returns the signature of [`TEST_MESSAGE`] made with the stub device signature.
pub(super) fn stub_signature() -> EncodedSignature {
    let found = found_path(AddressType::NativeSegwit, 0);

    ToSign::new(TEST_MESSAGE, &found, fingerprint())
        .unwrap()
        .attach(&[(0, stub_device_signature())])
        .unwrap()
        .encode()
        .unwrap()
}

/// Returns the state after the first native segwit address signed [`TEST_MESSAGE`].
pub(super) fn signed() -> SigningState {
    SigningState::Signed {
        request: request(AddressType::NativeSegwit),
        signature: stub_signature(),
    }
}
