//! The calculator engine.
//!
//! This module is the whole core: it parses a running infix expression,
//! evaluates it, and runs every fresh value through a stack of
//! numeric-safety guardrails (overflow, underflow, precision exhaustion,
//! monotonic-trend violation, integer-exactness ceiling, division-chain
//! fatigue) before accepting it as a result. A tripped guardrail halts the
//! session until it is cleared.
//!
//! The UI shell around it only feeds keystrokes into a [`Session`] and
//! renders its observable state.

mod config;
mod error;
mod eval;
mod format;
mod limits;
mod repeat;
mod session;

pub use config::GuardrailConfig;
pub use error::{EngineError, Severity};
pub use eval::{Evaluation, IntFold, Operator, ParseError, TrailingOp, evaluate};
pub use format::format_value;
pub use limits::{LimitBreach, MAX_MAGNITUDE, UNDERFLOW_FLOOR, check_float_limits};
pub use repeat::{RepeatOp, Trend};
pub use session::Session;
