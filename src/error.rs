//! Error types for network construction and training.

use std::error::Error;
use std::fmt;

/// Error type for all network and optimizer operations.
#[derive(Debug, Clone)]
pub enum DbnError {
    /// A parameter or argument failed validation (unknown unit-type string,
    /// malformed momentum vector, mismatched shapes, ...).
    InvalidArgument(String),
    /// An operation was requested in a phase that does not allow it, such as
    /// backpropagation on a network that was never unrolled.
    InvalidState(String),
    /// A non-recoverable numerical condition, such as a non-finite objective
    /// at the optimizer's starting point.
    NumericFailure(String),
    /// Checked arena access beyond the view's window.
    OutOfRange(String),
    /// A cooperative interrupt was observed at a loop's cancellation point.
    Cancelled,
}

impl fmt::Display for DbnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbnError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            DbnError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            DbnError::NumericFailure(msg) => write!(f, "numeric failure: {}", msg),
            DbnError::OutOfRange(msg) => write!(f, "out of range: {}", msg),
            DbnError::Cancelled => write!(f, "operation cancelled by user"),
        }
    }
}

impl Error for DbnError {}

pub type DbnResult<T> = Result<T, DbnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = DbnError::InvalidArgument("momentums of wrong size".to_string());
        assert!(err.to_string().contains("invalid argument"));
        assert!(err.to_string().contains("momentums of wrong size"));
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(DbnError::Cancelled.to_string(), "operation cancelled by user");
    }
}
