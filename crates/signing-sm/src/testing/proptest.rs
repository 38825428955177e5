//! Property macros shared by the state machine tests.
//!
//! Both macros take the same arguments:
//! * `$create_fn`: builds the machine from a state, `Fn(State) -> SM`
//! * `$get_state_fn`: reads the state back, `Fn(&SM) -> &State`
//! * `$config`: the config handed to `process_event`
//! * `$state_strategy` and `$event_strategy`: proptest strategies for the inputs

/// Replaying an event against two copies of the same state yields the same outcome.
#[macro_export]
macro_rules! prop_replays_identically {
    ($create_fn:expr, $get_state_fn:expr, $config:expr, $state_strategy:expr, $event_strategy:expr) => {
        proptest::proptest! {
            #[test]
            fn replaying_an_event_is_deterministic(
                state in $state_strategy,
                event in $event_strategy,
            ) {
                use $crate::state_machine::StateMachine;

                let mut first = $create_fn(state.clone());
                let mut second = $create_fn(state);

                let first_output = first.process_event($config, event.clone()).ok();
                let second_output = second.process_event($config, event).ok();

                proptest::prop_assert_eq!(first_output, second_output);
                proptest::prop_assert_eq!($get_state_fn(&first), $get_state_fn(&second));
            }
        }
    };
}

/// Every event is either consumed or rejected.
///
/// A consumed event changes the state or produces output. A rejected event leaves the state as it
/// was.
#[macro_export]
macro_rules! prop_consumes_or_rejects {
    ($create_fn:expr, $get_state_fn:expr, $config:expr, $state_strategy:expr, $event_strategy:expr) => {
        proptest::proptest! {
            #[test]
            fn events_are_consumed_or_rejected(
                state in $state_strategy,
                event in $event_strategy,
            ) {
                use $crate::state_machine::StateMachine;

                let before = state.clone();
                let mut sm = $create_fn(state);
                let result = sm.process_event($config, event);
                let after = $get_state_fn(&sm);

                if let Ok(output) = result {
                    let produced = !output.duties.is_empty() || !output.signals.is_empty();
                    proptest::prop_assert!(
                        produced || &before != after,
                        "event {} accepted without effect",
                        before
                    );
                } else {
                    proptest::prop_assert_eq!(&before, after, "rejected event changed the state");
                }
            }
        }
    };
}
