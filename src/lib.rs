//! Core engine for a guarded calculator.
//!
//! The engine evaluates running infix expressions (digits, `.`, and the
//! four operators `+ - × ÷`) and refuses any result that numeric-safety
//! guardrails cannot vouch for, rather than silently displaying digits
//! that double-precision arithmetic can no longer back up.
//!
//! ```
//! use railcalc::{Operator, Session};
//!
//! let mut session = Session::new();
//! session.push_digit('2');
//! session.push_operator(Operator::Add);
//! session.push_digit('3');
//! session.evaluate();
//! assert_eq!(session.result_text(), "5");
//!
//! // Pressing evaluate again repeats the last operation.
//! session.evaluate();
//! assert_eq!(session.result_text(), "8");
//! ```

pub mod engine;

pub use engine::{EngineError, GuardrailConfig, Operator, Session, Severity};
