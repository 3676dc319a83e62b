//! Error types for enjambre operations.
//!
//! Fatal preconditions (invalid configuration, free-pool exhaustion, slot
//! bookkeeping bugs) surface here; recoverable numeric conditions (boundary
//! overshoot, zero-width dimensions) are handled locally and never reach
//! this type. Budget exhaustion is a terminal condition, not an error —
//! see [`crate::StepOutcome`].

use thiserror::Error;

/// Main error type for enjambre operations.
///
/// # Examples
///
/// ```
/// use enjambre::EnjambreError;
///
/// let err = EnjambreError::InvalidParameter {
///     param: "tol".to_string(),
///     value: "-0.5".to_string(),
///     constraint: ">= 0".to_string(),
/// };
/// assert!(err.to_string().contains("tol"));
/// ```
#[derive(Debug, Error)]
pub enum EnjambreError {
    /// Configuration parameter outside its documented domain.
    #[error("invalid parameter: {param} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A creation or increment operation needed a free slot and none was left.
    #[error("free pool exhausted during {operation}: population too small for this run")]
    FreePoolExhausted {
        /// Operation that required the slot
        operation: &'static str,
    },

    /// A particle's recorded slot index disagrees with its arena position.
    ///
    /// Caller bug, not recoverable.
    #[error("slot bookkeeping corrupted: particle records slot {slot}, found at index {index}")]
    SlotMismatch {
        /// Slot index recorded in the particle
        slot: usize,
        /// Actual arena position
        index: usize,
    },

    /// Population too small to form even one sub-swarm.
    #[error("population size {got} too small, need at least {min}")]
    PopulationTooSmall {
        /// Provided population size
        got: usize,
        /// Minimum supported
        min: usize,
    },

    /// Per-dimension bounds are inverted or missing.
    #[error("invalid bounds for dimension {dim}: [{lower}, {upper}]")]
    InvalidBounds {
        /// Offending dimension
        dim: usize,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// The evaluation budget was exhausted before a single evaluation ran.
    #[error("budget exhausted before initialization: need at least {needed} evaluations, {available} available")]
    InsufficientBudget {
        /// Evaluations required to produce any result
        needed: u64,
        /// Evaluations available
        available: u64,
    },

    /// The external fitness oracle reported a failure.
    ///
    /// Never retried internally; surfaces straight to the caller.
    #[error("fitness oracle failed: {message}")]
    Oracle {
        /// Failure description from the oracle
        message: String,
    },
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, EnjambreError>;

impl EnjambreError {
    /// Create an invalid-parameter error with descriptive context.
    #[must_use]
    pub fn invalid_parameter(param: &str, value: f64, constraint: &str) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value: format!("{value}"),
            constraint: constraint.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = EnjambreError::invalid_parameter("rho", -1.0, ">= 0");
        let msg = err.to_string();
        assert!(msg.contains("rho"));
        assert!(msg.contains("-1"));
        assert!(msg.contains(">= 0"));
    }

    #[test]
    fn test_free_pool_exhausted_display() {
        let err = EnjambreError::FreePoolExhausted {
            operation: "increment",
        };
        assert!(err.to_string().contains("increment"));
        assert!(err.to_string().contains("free pool"));
    }

    #[test]
    fn test_slot_mismatch_display() {
        let err = EnjambreError::SlotMismatch { slot: 3, index: 7 };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_oracle_failure_display() {
        let err = EnjambreError::Oracle {
            message: "simulation crashed".to_string(),
        };
        assert!(err.to_string().contains("simulation crashed"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EnjambreError>();
    }
}
