//! Repeat-operation memory.
//!
//! A calculator repeats its last operation when `=` is pressed again:
//! `2 + 3 =` shows 5, the next `=` shows 8. The engine keeps the trailing
//! operator/operand pair of the last evaluated expression for this.

use super::eval::{Operator, TrailingOp};

/// The operator/operand pair an evaluate-on-empty-input re-applies.
#[derive(Clone, Debug, PartialEq)]
pub struct RepeatOp {
    pub op: Operator,
    pub operand: f64,
    /// Literal text of the operand, used to rebuild the repeat expression.
    pub operand_text: String,
}

impl From<TrailingOp> for RepeatOp {
    fn from(trailing: TrailingOp) -> Self {
        Self {
            op: trailing.op,
            operand: trailing.operand,
            operand_text: trailing.operand_text,
        }
    }
}

impl RepeatOp {
    /// The magnitude trend this operation promises when repeated.
    ///
    /// Dividing by anything above one, or multiplying by a proper fraction,
    /// must keep shrinking the result; every other operation promises
    /// nothing.
    pub fn expected_trend(&self) -> Trend {
        match self.op {
            Operator::Div if self.operand > 1.0 => Trend::ExpectDecreasing,
            Operator::Mul if self.operand > 0.0 && self.operand < 1.0 => Trend::ExpectDecreasing,
            _ => Trend::None,
        }
    }
}

/// Expected direction of the result magnitude under repeated application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Trend {
    #[default]
    None,
    /// Each accepted result must have a strictly smaller magnitude than the
    /// one before it.
    ExpectDecreasing,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(op: Operator, operand: f64) -> RepeatOp {
        RepeatOp {
            op,
            operand,
            operand_text: operand.to_string(),
        }
    }

    #[test]
    fn test_shrinking_operations_expect_decrease() {
        assert_eq!(
            repeat(Operator::Div, 2.0).expected_trend(),
            Trend::ExpectDecreasing
        );
        assert_eq!(
            repeat(Operator::Mul, 0.5).expected_trend(),
            Trend::ExpectDecreasing
        );
    }

    #[test]
    fn test_other_operations_promise_nothing() {
        assert_eq!(repeat(Operator::Div, 1.0).expected_trend(), Trend::None);
        assert_eq!(repeat(Operator::Div, 0.5).expected_trend(), Trend::None);
        assert_eq!(repeat(Operator::Mul, 2.0).expected_trend(), Trend::None);
        assert_eq!(repeat(Operator::Mul, 0.0).expected_trend(), Trend::None);
        assert_eq!(repeat(Operator::Add, 0.5).expected_trend(), Trend::None);
        assert_eq!(repeat(Operator::Sub, 3.0).expected_trend(), Trend::None);
    }
}
