//! Tests for the handshake and liveness transitions.

use bip322_primitives::address::AddressType;
use bip322_test_utils::fixtures::fingerprint;

use super::*;
use crate::{
    signing::{
        errors::{FailureKind, SigningSMError},
        events::SigningEvent,
        signals::SigningSignal,
    },
    state_machine::StateMachine,
    testing::{test_invalid_transition, test_transition, InvalidTransition, Transition},
};

#[test]
fn test_handshake_succeeded() {
    test_transition(
        create_sm,
        get_state,
        cfg(),
        Transition {
            from_state: SigningState::Disconnected,
            event: SigningEvent::HandshakeSucceeded {
                fingerprint: fingerprint(),
            },
            expected_state: SigningState::Connected,
            expected_duties: vec![SigningDuty::ProbeLiveness],
            expected_signals: vec![],
        },
    );
}

#[test]
fn test_handshake_records_fingerprint() {
    let mut sm = SigningSM::new();
    assert_eq!(sm.context().fingerprint(), None);

    sm.process_event(
        cfg(),
        SigningEvent::HandshakeSucceeded {
            fingerprint: fingerprint(),
        },
    )
    .unwrap();

    assert_eq!(sm.context().fingerprint(), Some(fingerprint()));
}

#[test]
fn test_handshake_failed() {
    test_transition(
        create_sm,
        get_state,
        cfg(),
        Transition {
            from_state: SigningState::Disconnected,
            event: SigningEvent::HandshakeFailed {
                reason: "no device found".to_string(),
            },
            expected_state: SigningState::Disconnected,
            expected_duties: vec![],
            expected_signals: vec![SigningSignal::Failed(FailureKind::Connectivity)],
        },
    );
}

#[test]
fn test_liveness_confirmed() {
    test_transition(
        create_sm,
        get_state,
        cfg(),
        Transition {
            from_state: SigningState::Connected,
            event: SigningEvent::LivenessConfirmed,
            expected_state: SigningState::AwaitingInput,
            expected_duties: vec![],
            expected_signals: vec![],
        },
    );
}

#[test]
fn test_liveness_lost_after_handshake() {
    test_transition(
        create_sm,
        get_state,
        cfg(),
        Transition {
            from_state: SigningState::Connected,
            event: SigningEvent::LivenessLost {
                reason: "timed out".to_string(),
            },
            expected_state: SigningState::Disconnected,
            expected_duties: vec![SigningDuty::CloseSession],
            expected_signals: vec![SigningSignal::Failed(FailureKind::Connectivity)],
        },
    );
}

#[test]
fn test_liveness_lost_before_search_drops_request() {
    let mut sm = create_sm(searching(AddressType::NativeSegwit));

    let output = sm
        .process_event(
            cfg(),
            SigningEvent::LivenessLost {
                reason: "timed out".to_string(),
            },
        )
        .unwrap();

    assert_eq!(sm.state(), &SigningState::Disconnected);
    assert_eq!(sm.state().request(), None);
    assert_eq!(sm.context().fingerprint(), None);
    assert_eq!(sm.context().last_failure(), Some(FailureKind::Connectivity));
    assert_eq!(output.duties, vec![SigningDuty::CloseSession]);
}

#[test]
fn test_connect_requested_from_any_state() {
    let (approval, _) = awaiting_approval(AddressType::Taproot);
    let states = [
        SigningState::Disconnected,
        SigningState::Connected,
        SigningState::AwaitingInput,
        searching(AddressType::Legacy),
        exhausted(AddressType::Segwit, Default::default()),
        approval,
        signed(),
    ];

    for state in states {
        let mut sm = create_sm(state.clone());
        let output = sm
            .process_event(cfg(), SigningEvent::ConnectRequested)
            .unwrap_or_else(|e| panic!("{state} must accept a reconnect: {e}"));

        assert_eq!(sm.state(), &SigningState::Disconnected);
        assert_eq!(sm.context().fingerprint(), None);
        assert_eq!(output.duties, vec![SigningDuty::Connect]);
        assert!(output.signals.is_empty());
    }
}

#[test]
fn test_invalid_connection_events() {
    let is_invalid_event = |e: &SigningSMError| matches!(e, SigningSMError::InvalidEvent { .. });

    let cases = [
        (
            SigningState::AwaitingInput,
            SigningEvent::HandshakeSucceeded {
                fingerprint: fingerprint(),
            },
        ),
        (
            SigningState::Connected,
            SigningEvent::HandshakeFailed {
                reason: "late".to_string(),
            },
        ),
        (SigningState::AwaitingInput, SigningEvent::LivenessConfirmed),
        (
            SigningState::Disconnected,
            SigningEvent::LivenessLost {
                reason: "late".to_string(),
            },
        ),
        (signed(), SigningEvent::LivenessConfirmed),
    ];

    for (from_state, event) in cases {
        test_invalid_transition(
            create_sm,
            get_state,
            cfg(),
            InvalidTransition {
                from_state,
                event,
                expected_error: is_invalid_event,
            },
        );
    }
}
