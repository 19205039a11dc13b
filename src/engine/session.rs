//! The calculator session state machine.
//!
//! One [`Session`] owns everything a running calculator needs: the pending
//! expression, the last accepted result, the repeat memory and the
//! guardrail state. Every user action is a single synchronous method call
//! that runs to completion.
//!
//! Once a guardrail trips, the session halts and stays halted; only
//! [`Session::clear`] brings it back. The halt is an explicit phase, not a
//! flag, so "only clear is accepted while halted" is visible in the type.

use tracing::debug;

use super::config::GuardrailConfig;
use super::error::EngineError;
use super::eval::{self, Evaluation, IntFold, Operator, TrailingOp};
use super::format::format_value;
use super::limits::{INT_EXACT_CEILING, LimitBreach, UNDERFLOW_FLOOR, check_float_limits};
use super::repeat::{RepeatOp, Trend};

/// Whether the session is accepting input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Active,
    /// A guardrail tripped; only [`Session::clear`] is accepted.
    Halted,
}

/// A single interactive calculator session.
///
/// Not safe for concurrent callers: use one instance per session, or
/// serialize access externally.
#[derive(Debug)]
pub struct Session {
    config: GuardrailConfig,
    phase: Phase,
    pending: String,
    last_result: Option<f64>,
    result_text: String,
    repeat: Option<RepeatOp>,
    trend: Trend,
    division_chain: u32,
    error: Option<EngineError>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(GuardrailConfig::default())
    }

    pub fn with_config(config: GuardrailConfig) -> Self {
        Self {
            config,
            phase: Phase::Active,
            pending: String::new(),
            last_result: None,
            result_text: String::new(),
            repeat: None,
            trend: Trend::None,
            division_chain: 0,
            error: None,
        }
    }

    /// The pending (not yet evaluated) expression text.
    pub fn expression(&self) -> &str {
        &self.pending
    }

    /// The last accepted result as display text, empty if none.
    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    /// The current error, if the last action failed.
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// Whether a guardrail has halted the session.
    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Append a digit or decimal point to the pending expression.
    ///
    /// Typing over a shown result starts a fresh expression: the result,
    /// the repeat memory and the trend/chain state are dropped. Ignored
    /// while halted; characters other than digits and `.` are ignored.
    pub fn push_digit(&mut self, c: char) {
        if self.phase == Phase::Halted {
            debug!(input = %c, "ignoring digit while halted");
            return;
        }
        if !c.is_ascii_digit() && c != '.' {
            debug!(input = %c, "ignoring non-digit input");
            return;
        }
        self.error = None;
        if self.pending.is_empty() && self.last_result.is_some() {
            self.last_result = None;
            self.result_text.clear();
            self.repeat = None;
            self.trend = Trend::None;
            self.division_chain = 0;
        }
        self.pending.push(c);
    }

    /// Append an operator, replacing a trailing operator if one is there.
    ///
    /// With an empty expression the operator continues from the last result
    /// (a shown `5` followed by `÷` yields the expression `5÷`); with
    /// neither expression nor result it is ignored. Ignored while halted.
    pub fn push_operator(&mut self, op: Operator) {
        if self.phase == Phase::Halted {
            debug!(op = %op.symbol(), "ignoring operator while halted");
            return;
        }
        self.error = None;
        if self.pending.is_empty() {
            if self.last_result.is_some() {
                self.pending.push_str(&self.result_text);
                self.pending.push(op.symbol());
            }
            return;
        }
        if let Some(last) = self.pending.chars().last()
            && Operator::from_symbol(last).is_some()
        {
            self.pending.pop();
        }
        self.pending.push(op.symbol());
    }

    /// Evaluate the pending expression, or repeat the last operation when
    /// the expression is empty. Ignored while halted.
    pub fn evaluate(&mut self) {
        if self.phase == Phase::Halted {
            debug!("ignoring evaluate while halted");
            return;
        }
        self.error = None;
        if self.pending.is_empty() {
            self.repeat_last();
            return;
        }
        match eval::evaluate(&self.pending) {
            Ok(evaluation) => {
                let int_mode = is_integer_expression(&self.pending);
                self.accept(evaluation, int_mode);
            }
            Err(err) => {
                debug!(error = %err, expr = %self.pending, "expression failed to parse");
                self.error = Some(EngineError::InvalidExpression);
            }
        }
    }

    /// Reset every field to its initial state. Always accepted, halted or
    /// not.
    pub fn clear(&mut self) {
        self.phase = Phase::Active;
        self.pending.clear();
        self.last_result = None;
        self.result_text.clear();
        self.repeat = None;
        self.trend = Trend::None;
        self.division_chain = 0;
        self.error = None;
    }

    /// Re-apply the stored operator/operand pair to the last result.
    fn repeat_last(&mut self) {
        let (Some(_), Some(rep)) = (self.last_result, self.repeat.clone()) else {
            debug!("nothing to repeat");
            return;
        };
        let expr = format!("{}{}{}", self.result_text, rep.op.symbol(), rep.operand_text);
        debug!(expr = %expr, "repeating last operation");
        match eval::evaluate(&expr) {
            Ok(evaluation) => {
                let int_mode = is_integer_expression(&expr);
                self.accept(evaluation, int_mode);
            }
            Err(err) => {
                debug!(error = %err, expr = %expr, "repeat expression failed to parse");
                self.error = Some(EngineError::InvalidRepeat);
            }
        }
    }

    /// Run a freshly evaluated value through the guardrails; on success
    /// store and display it and refresh the repeat memory.
    fn accept(&mut self, evaluation: Evaluation, int_mode: bool) {
        let op = evaluation.trailing.as_ref().map(|t| t.op);
        match self.finalize(evaluation.value, int_mode, evaluation.exact, op) {
            Ok(()) => {
                self.capture_repeat(evaluation.trailing);
                self.pending.clear();
            }
            Err(err) => {
                debug!(error = %err, "guardrail rejected result");
                self.error = Some(err);
                self.phase = Phase::Halted;
            }
        }
    }

    /// The guardrail sequence. First failure wins.
    fn finalize(
        &mut self,
        value: f64,
        int_mode: bool,
        exact: IntFold,
        op: Option<Operator>,
    ) -> Result<(), EngineError> {
        // 1. Hard float limits.
        check_float_limits(value).map_err(|breach| match breach {
            LimitBreach::Overflow => EngineError::Overflow,
            LimitBreach::Underflow => EngineError::Underflow,
        })?;

        let prev = self.last_result;
        let scaling = matches!(op, Some(Operator::Mul | Operator::Div));

        // 2. A product or quotient that flushed all the way to zero is an
        //    underflow, not a legitimate zero.
        if scaling
            && value == 0.0
            && let Some(prev) = prev
            && prev != 0.0
        {
            return Err(EngineError::Underflow);
        }

        // 3. An operation expected to keep shrinking the magnitude must
        //    actually shrink it, by at least the relative tolerance.
        if scaling
            && self.trend == Trend::ExpectDecreasing
            && let Some(prev) = prev
            && value.abs() >= prev.abs() * (1.0 - self.config.trend_tolerance)
        {
            return Err(EngineError::PrecisionLimit);
        }

        // 4. Division-chain guards.
        if op == Some(Operator::Div) {
            self.division_chain += 1;
            if value != 0.0 && value.abs() < UNDERFLOW_FLOOR {
                return Err(EngineError::Underflow);
            }
            if let Some(prev) = prev
                && prev != 0.0
                && (value == prev || ((value - prev) / prev).abs() < self.config.stall_tolerance)
            {
                return Err(EngineError::PrecisionLimit);
            }
            if self.division_chain > self.config.division_chain_cap {
                return Err(EngineError::PrecisionLimit);
            }
        } else {
            self.division_chain = 0;
        }

        // 5. Integers beyond 2^53 lose exactness in f64. Judged on the
        //    exact fold where one exists; a fold that overflowed i64 has
        //    certainly left exact range.
        if int_mode {
            let exceeded = match exact {
                IntFold::Exact(n) => n.unsigned_abs() > INT_EXACT_CEILING,
                IntFold::Overflowed => true,
                IntFold::NotInteger => value.abs() > INT_EXACT_CEILING as f64,
            };
            if exceeded {
                return Err(EngineError::PrecisionLimit);
            }
        }

        self.result_text = format_value(value, int_mode);
        self.last_result = Some(value);
        Ok(())
    }

    /// Store the trailing pair of an accepted evaluation and recompute the
    /// trend it implies. A trailing-less expression (a lone number) clears
    /// both.
    fn capture_repeat(&mut self, trailing: Option<TrailingOp>) {
        match trailing {
            Some(trailing) => {
                let rep = RepeatOp::from(trailing);
                self.trend = rep.expected_trend();
                self.repeat = Some(rep);
            }
            None => {
                self.repeat = None;
                self.trend = Trend::None;
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the expression is an all-integer add/subtract/multiply chain,
/// where exact integer semantics are expected and enforced.
fn is_integer_expression(expr: &str) -> bool {
    !expr.is_empty()
        && expr
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '×'))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Type a whole expression, one key at a time.
    fn type_keys(session: &mut Session, keys: &str) {
        for c in keys.chars() {
            match Operator::from_symbol(c) {
                Some(op) => session.push_operator(op),
                None => session.push_digit(c),
            }
        }
    }

    fn session_after(keys: &str) -> Session {
        let mut session = Session::new();
        type_keys(&mut session, keys);
        session.evaluate();
        session
    }

    #[test]
    fn test_simple_addition() {
        let session = session_after("2+3");
        assert_eq!(session.result_text(), "5");
        assert_eq!(session.expression(), "");
        assert!(session.error().is_none());
        assert!(!session.is_halted());
    }

    #[test]
    fn test_precedence_end_to_end() {
        assert_eq!(session_after("2+3×4").result_text(), "14");
        assert_eq!(session_after("5÷2").result_text(), "2.5");
    }

    #[test]
    fn test_repeat_applies_last_operation() {
        let mut session = session_after("2+3");
        session.evaluate();
        assert_eq!(session.result_text(), "8");
        session.evaluate();
        assert_eq!(session.result_text(), "11");
        assert!(session.error().is_none());
    }

    #[test]
    fn test_repeat_without_history_is_a_no_op() {
        let mut session = Session::new();
        session.evaluate();
        assert!(session.error().is_none());
        assert_eq!(session.result_text(), "");

        // A lone number clears the repeat memory, so evaluate does nothing.
        let mut session = session_after("7");
        session.evaluate();
        assert_eq!(session.result_text(), "7");
    }

    #[test]
    fn test_division_by_zero_overflows_and_halts() {
        let mut session = session_after("1÷0");
        assert_eq!(session.error(), Some(&EngineError::Overflow));
        assert!(session.is_halted());

        // Everything except clear is ignored now.
        session.push_digit('5');
        session.push_operator(Operator::Add);
        session.evaluate();
        assert_eq!(session.expression(), "1÷0");
        assert_eq!(session.error(), Some(&EngineError::Overflow));

        session.clear();
        assert!(!session.is_halted());
        assert_eq!(session.expression(), "");
        assert_eq!(session.result_text(), "");
        assert!(session.error().is_none());
    }

    #[test]
    fn test_operator_replaces_trailing_operator() {
        let mut session = Session::new();
        type_keys(&mut session, "2+");
        session.push_operator(Operator::Mul);
        assert_eq!(session.expression(), "2×");
    }

    #[test]
    fn test_leading_operator_without_result_ignored() {
        let mut session = Session::new();
        session.push_operator(Operator::Add);
        assert_eq!(session.expression(), "");
    }

    #[test]
    fn test_operator_continues_from_result() {
        let mut session = session_after("2+3");
        session.push_operator(Operator::Div);
        assert_eq!(session.expression(), "5÷");
        session.push_digit('2');
        session.evaluate();
        assert_eq!(session.result_text(), "2.5");
    }

    #[test]
    fn test_digit_after_result_starts_fresh() {
        let mut session = session_after("2+3");
        session.push_digit('7');
        assert_eq!(session.expression(), "7");
        assert_eq!(session.result_text(), "");
        session.evaluate();
        assert_eq!(session.result_text(), "7");

        // The old repeat memory is gone with the result.
        session.evaluate();
        assert_eq!(session.result_text(), "7");
        assert!(session.error().is_none());
    }

    #[test]
    fn test_invalid_expression_is_not_terminal() {
        let mut session = session_after("1.2.3");
        assert_eq!(session.error(), Some(&EngineError::InvalidExpression));
        assert!(!session.is_halted());

        // The next action clears the error.
        session.push_digit('4');
        assert!(session.error().is_none());
    }

    #[test]
    fn test_integer_ceiling() {
        let session = session_after("9007199254740992+1");
        assert_eq!(session.error(), Some(&EngineError::PrecisionLimit));
        assert!(session.is_halted());

        let session = session_after("9007199254740991+1");
        assert!(session.error().is_none());
        assert_eq!(session.result_text(), "9007199254740992");
    }

    #[test]
    fn test_decimal_expressions_skip_integer_ceiling() {
        // Same magnitude, but not an all-integer chain.
        let session = session_after("9007199254740992.0+2");
        assert!(session.error().is_none());
    }

    #[test]
    fn test_division_chain_cap() {
        let mut session = session_after("100000÷1.0000001");
        assert!(session.error().is_none());

        let mut repeats = 0;
        for _ in 0..600 {
            session.evaluate();
            repeats += 1;
            if session.error().is_some() {
                break;
            }
        }
        assert_eq!(session.error(), Some(&EngineError::PrecisionLimit));
        assert!(session.is_halted());
        // The typed division was chain link 1; the cap of 512 trips on the
        // 512th repeat.
        assert_eq!(repeats, 512);
    }

    #[test]
    fn test_trend_guard_rejects_non_shrinking_repeat() {
        let mut session = session_after("10÷2");
        assert_eq!(session.result_text(), "5");
        assert_eq!(session.trend, Trend::ExpectDecreasing);

        // Force an operand that cannot shrink the magnitude.
        session.repeat = Some(RepeatOp {
            op: Operator::Div,
            operand: 1.0,
            operand_text: "1".to_string(),
        });
        session.evaluate();
        assert_eq!(session.error(), Some(&EngineError::PrecisionLimit));
        assert!(session.is_halted());
    }

    #[test]
    fn test_shrinking_repeat_passes_trend_guard() {
        let mut session = session_after("10÷2");
        session.evaluate();
        assert_eq!(session.result_text(), "2.5");
        session.evaluate();
        assert_eq!(session.result_text(), "1.25");
        assert!(session.error().is_none());
    }

    #[test]
    fn test_division_stall_detected() {
        let mut session = session_after("8÷1");
        assert_eq!(session.result_text(), "8");

        // 8 ÷ 1 again: bit-identical result, precision exhausted.
        session.evaluate();
        assert_eq!(session.error(), Some(&EngineError::PrecisionLimit));
        assert!(session.is_halted());
    }

    #[test]
    fn test_quiet_underflow_to_zero() {
        let mut session = Session::new();
        session.last_result = Some(1e-300);
        assert_eq!(
            session.finalize(0.0, false, IntFold::NotInteger, Some(Operator::Mul)),
            Err(EngineError::Underflow)
        );
    }

    #[test]
    fn test_legitimate_zero_results_accepted() {
        // Additive zero is fine.
        let session = session_after("5-5");
        assert!(session.error().is_none());
        assert_eq!(session.result_text(), "0");

        // Multiplying an actual zero is fine too.
        let mut session = Session::new();
        session.last_result = Some(0.0);
        assert_eq!(
            session.finalize(0.0, false, IntFold::NotInteger, Some(Operator::Mul)),
            Ok(())
        );
    }

    #[test]
    fn test_non_division_resets_the_chain() {
        let mut session = session_after("100÷2");
        assert_eq!(session.division_chain, 1);
        session.push_operator(Operator::Add);
        session.push_digit('1');
        session.evaluate();
        assert_eq!(session.division_chain, 0);
    }

    #[test]
    fn test_custom_chain_cap() {
        let config = GuardrailConfig {
            division_chain_cap: 2,
            ..GuardrailConfig::default()
        };
        let mut session = Session::with_config(config);
        type_keys(&mut session, "8÷2");
        session.evaluate();
        assert!(session.error().is_none());
        session.evaluate();
        assert!(session.error().is_none());
        session.evaluate();
        assert_eq!(session.error(), Some(&EngineError::PrecisionLimit));
    }

    #[test]
    fn test_non_digit_input_ignored() {
        let mut session = Session::new();
        session.push_digit('x');
        session.push_digit('2');
        assert_eq!(session.expression(), "2");
    }
}
