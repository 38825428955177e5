//! Generic state machine infrastructure.
//!
//! This module provides the output type and the trait implemented by the signing state machine
//! so that drivers and test helpers can be written against the abstraction.

/// Generic output from a state machine after processing an event.
///
/// It contains:
/// - `duties`: Actions that need to be executed externally
/// - `signals`: Notices for whoever presents the session to the user
///
/// # Type Parameters
///
/// - `D`: The duty type specific to the state machine
/// - `S`: The signal type specific to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SMOutput<D, S> {
    /// The duties that need to be performed by external executors.
    pub duties: Vec<D>,
    /// The signals that need to be surfaced.
    pub signals: Vec<S>,
}

impl<D, S> Default for SMOutput<D, S> {
    fn default() -> Self {
        Self {
            duties: Vec::new(),
            signals: Vec::new(),
        }
    }
}

impl<D, S> SMOutput<D, S> {
    /// Creates a new empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an output with only duties.
    pub const fn with_duties(duties: Vec<D>) -> Self {
        Self {
            duties,
            signals: Vec::new(),
        }
    }

    /// Creates an output with only signals.
    pub const fn with_signals(signals: Vec<S>) -> Self {
        Self {
            duties: Vec::new(),
            signals,
        }
    }

    /// Creates an output with both duties and signals.
    pub const fn with_duties_and_signals(duties: Vec<D>, signals: Vec<S>) -> Self {
        Self { duties, signals }
    }
}

/// Trait for state machines driven by external events.
///
/// Each implementation specifies its own configuration, duty, signal and event types through
/// associated types.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for SigningSM {
///     type Config = Arc<SigningSMCfg>;
///     type Duty = SigningDuty;
///     type OutgoingSignal = SigningSignal;
///     type Event = SigningEvent;
///     type Error = SigningSMError;
///
///     fn process_event(&mut self, cfg: Self::Config, event: Self::Event)
///         -> Result<SMOutput<Self::Duty, Self::OutgoingSignal>, Self::Error>
///     {
///         // Implementation
///     }
/// }
/// ```
pub trait StateMachine {
    /// Static configuration shared by every instance.
    type Config;

    /// The type of duties this state machine can emit.
    type Duty;

    /// The type of signals this state machine can emit.
    type OutgoingSignal;

    /// The type of events this state machine can process.
    type Event;

    /// The error type returned when event processing fails.
    type Error;

    /// Processes an event and returns the output (duties and signals) or an error.
    ///
    /// This is the main entry point for advancing the state machine. On error the state is left
    /// untouched.
    fn process_event(
        &mut self,
        cfg: Self::Config,
        event: Self::Event,
    ) -> Result<SMOutput<Self::Duty, Self::OutgoingSignal>, Self::Error>;
}
