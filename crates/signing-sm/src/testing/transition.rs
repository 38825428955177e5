//! Value-based transition testing helpers.

use std::fmt::Debug;

use crate::state_machine::{SMOutput, StateMachine};

/// Describes a valid state transition.
#[derive(Debug)]
pub(crate) struct Transition<S, E, D, Sig> {
    /// The initial state before the transition
    pub(crate) from_state: S,
    /// The event that triggers the transition
    pub(crate) event: E,
    /// The expected state after the transition
    pub(crate) expected_state: S,
    /// The expected duties emitted during the transition
    pub(crate) expected_duties: Vec<D>,
    /// The expected signals emitted during the transition
    pub(crate) expected_signals: Vec<Sig>,
}

/// Runs a single transition from `transition.from_state` and checks the resulting state, duties
/// and signals.
pub(crate) fn test_transition<SM, S, E, D, Sig, Err, CreateFn, GetStateFn>(
    create_sm: CreateFn,
    get_state: GetStateFn,
    config: SM::Config,
    transition: Transition<S, E, D, Sig>,
) where
    SM: StateMachine<Event = E, Duty = D, OutgoingSignal = Sig, Error = Err>,
    S: PartialEq + Debug,
    D: PartialEq + Debug,
    Sig: PartialEq + Debug,
    Err: Debug,
    CreateFn: Fn(S) -> SM,
    GetStateFn: Fn(&SM) -> &S,
{
    let mut sm = create_sm(transition.from_state);

    let output = match sm.process_event(config, transition.event) {
        Ok(output) => output,
        Err(err) => panic!("transition must be accepted, got {err:?}"),
    };

    assert_eq!(get_state(&sm), &transition.expected_state, "unexpected state");
    assert_eq!(output.duties, transition.expected_duties, "unexpected duties");
    assert_eq!(output.signals, transition.expected_signals, "unexpected signals");
}

/// Describes an invalid state-event pair that should produce an error.
#[derive(Debug)]
pub(crate) struct InvalidTransition<S, E, Err> {
    /// The initial state
    pub(crate) from_state: S,
    /// The event that should be rejected
    pub(crate) event: E,
    /// A function to verify the error type
    pub(crate) expected_error: fn(&Err) -> bool,
}

/// Checks that an invalid transition produces the expected error and leaves the state alone.
pub(crate) fn test_invalid_transition<SM, S, E, D, Sig, Err, CreateFn, GetStateFn>(
    create_sm: CreateFn,
    get_state: GetStateFn,
    config: SM::Config,
    invalid: InvalidTransition<S, E, Err>,
) where
    SM: StateMachine<Event = E, Duty = D, OutgoingSignal = Sig, Error = Err>,
    S: Clone + PartialEq + Debug,
    Err: Debug,
    CreateFn: Fn(S) -> SM,
    GetStateFn: Fn(&SM) -> &S,
{
    let before = invalid.from_state.clone();
    let mut sm = create_sm(invalid.from_state);

    match sm.process_event(config, invalid.event) {
        Ok(_) => panic!("event must be rejected in {before:?}"),
        Err(err) => assert!((invalid.expected_error)(&err), "unexpected error {err:?}"),
    }

    assert_eq!(get_state(&sm), &before, "rejected event changed the state");
}

/// Runs a sequence of events through a state machine and collects the outputs.
#[derive(Debug)]
pub(crate) struct EventSequence<SM, S, GetStateFn>
where
    SM: StateMachine,
    GetStateFn: Fn(&SM) -> &S,
{
    sm: SM,
    get_state: GetStateFn,
    outputs: Vec<SMOutput<SM::Duty, SM::OutgoingSignal>>,
    errors: Vec<(usize, SM::Error)>, // index instead of event to avoid a Clone bound
}

impl<SM, S, GetStateFn> EventSequence<SM, S, GetStateFn>
where
    SM: StateMachine,
    SM::Config: Clone,
    GetStateFn: Fn(&SM) -> &S,
{
    /// Creates a new event sequence tester.
    pub(crate) const fn new(sm: SM, get_state: GetStateFn) -> Self {
        Self {
            sm,
            get_state,
            outputs: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Processes an event and records the result.
    pub(crate) fn process(&mut self, config: &SM::Config, event: SM::Event) -> &mut Self {
        let event_idx = self.outputs.len() + self.errors.len();
        match self.sm.process_event(config.clone(), event) {
            Ok(output) => self.outputs.push(output),
            Err(e) => self.errors.push((event_idx, e)),
        }
        self
    }

    /// Returns the current state.
    pub(crate) fn state(&self) -> &S {
        (self.get_state)(&self.sm)
    }

    /// Asserts that all events succeeded.
    pub(crate) fn assert_no_errors(&self) -> &Self
    where
        SM::Error: Debug,
    {
        if let Some((idx, err)) = self.errors.first() {
            panic!("event #{idx} was rejected: {err:?}");
        }

        self
    }

    /// Asserts that the final state matches `expected`.
    pub(crate) fn assert_final_state(&self, expected: &S) -> &Self
    where
        S: PartialEq + Debug,
    {
        assert_eq!(self.state(), expected, "unexpected final state");

        self
    }

    /// Returns all duties emitted during the sequence.
    pub(crate) fn all_duties(&self) -> Vec<&SM::Duty> {
        self.outputs.iter().flat_map(|o| &o.duties).collect()
    }

    /// Returns all signals emitted during the sequence.
    pub(crate) fn all_signals(&self) -> Vec<&SM::OutgoingSignal> {
        self.outputs.iter().flat_map(|o| &o.signals).collect()
    }

    /// Returns all errors raised during the sequence.
    pub(crate) fn all_errors(&self) -> Vec<&SM::Error> {
        self.errors.iter().map(|(_, e)| e).collect()
    }
}
