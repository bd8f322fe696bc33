use std::time::Duration;

use thiserror::Error;

/// Errors produced while building world states, registering operators or planning.
///
/// # Examples
///
/// ```
/// use transition_planner::PlannerError;
///
/// let error = PlannerError::MissingState("DeadState".to_string());
/// assert_eq!(format!("{}", error), "State variable not found: DeadState");
/// ```
#[derive(Error, Debug)]
pub enum PlannerError {
    /// No state variable is registered under the key
    #[error("State variable not found: {0}")]
    MissingState(String),

    /// The key holds a variable of a different kind than the one requested
    #[error("State variable {key} holds a {found}, expected a {expected}")]
    StateKindMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// An operator with the same name is already registered
    #[error("Operator already registered: {0}")]
    DuplicateOperator(String),

    /// No operator is registered under the name
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Operators must carry a strictly positive cost
    #[error("Operator cost must be positive")]
    InvalidOperatorCost,

    /// The search ran out of states or time without reaching a desired state
    #[error("No valid plan found within {elapsed:?}")]
    NoPlanFound { elapsed: Duration },

    /// The animation player has no animation registered under the name
    #[error("Animation not registered: {0}")]
    AnimationNotRegistered(String),
}

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, PlannerError>;
