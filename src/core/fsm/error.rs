//=========================================================================
// State Machine Errors
//=========================================================================

//=== Internal Dependencies ===============================================

use super::StateId;

//=== TransitionError =====================================================

/// Rejected state machine transitions.
///
/// The machine's current state is left untouched whenever one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The target state was composed into a different machine.
    ForeignState {
        /// Name of the machine that rejected the transition.
        machine: String,

        /// The rejected target.
        state: StateId,
    },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForeignState { machine, state } => write!(
                f,
                "{}: not allowed to change to state {:?}, it doesn't belong to this state machine",
                machine, state
            ),
        }
    }
}

impl std::error::Error for TransitionError {}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fsm::{State, StateMachine};

    struct Quiet;

    impl State for Quiet {}

    #[test]
    fn transition_error_is_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<TransitionError>();
    }

    #[test]
    fn display_names_the_machine() {
        let mut other = StateMachine::new("other");
        let state = other.add_state(Quiet);

        let err = TransitionError::ForeignState {
            machine: "door".to_string(),
            state,
        };

        let message = err.to_string();
        assert!(message.starts_with("door: not allowed to change to state"));
        assert!(message.contains("doesn't belong to this state machine"));
    }
}
