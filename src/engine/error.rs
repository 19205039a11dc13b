//! Engine error types.

use thiserror::Error;

/// Every way the engine can refuse a result or an action.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The result left the representable range. Division by zero lands
    /// here too, since it produces a non-finite value.
    #[error("overflow: result exceeds the representable range")]
    Overflow,
    /// The result collapsed below the smallest trustworthy magnitude.
    #[error("underflow: result fell below the representable range")]
    Underflow,
    /// Repeated arithmetic stopped making real progress; the digits shown
    /// would no longer be meaningful.
    #[error("precision limit reached")]
    PrecisionLimit,
    /// The pending expression does not parse.
    #[error("invalid expression")]
    InvalidExpression,
    /// The synthesized repeat expression does not parse.
    #[error("cannot repeat the last operation")]
    InvalidRepeat,
}

/// Visual severity of an error, for the shell to style with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The result drained away (underflow).
    Warning,
    /// Everything else.
    Error,
}

impl EngineError {
    /// Whether this failure halts the session until it is cleared.
    ///
    /// Guardrail failures are terminal; parse failures leave the session
    /// editable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Overflow | Self::Underflow | Self::PrecisionLimit)
    }

    /// Severity classification for display styling.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Underflow => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guardrail_failures_are_terminal() {
        assert!(EngineError::Overflow.is_terminal());
        assert!(EngineError::Underflow.is_terminal());
        assert!(EngineError::PrecisionLimit.is_terminal());
        assert!(!EngineError::InvalidExpression.is_terminal());
        assert!(!EngineError::InvalidRepeat.is_terminal());
    }

    #[test]
    fn test_underflow_is_a_warning() {
        assert_eq!(EngineError::Underflow.severity(), Severity::Warning);
        assert_eq!(EngineError::Overflow.severity(), Severity::Error);
        assert_eq!(EngineError::InvalidExpression.severity(), Severity::Error);
    }
}
