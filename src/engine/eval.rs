//! Infix expression evaluation.
//!
//! The grammar is deliberately tiny: number literals and the four operator
//! symbols, with `×` and `÷` binding tighter than `+` and `-`, left to
//! right. Results re-enter expressions when an operation is repeated, so
//! literals accept an exponent marker and a leading minus (a negative or
//! scientifically formatted previous result).
//!
//! Division by zero and overflow are not parse errors: the raw f64
//! (±infinity, NaN) is returned and classifying it is the caller's job.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Every character that may appear in a well-formed expression.
    /// A cheap reject before real tokenizing.
    static ref EXPRESSION_CHARS: Regex = Regex::new(r"^[\d\.eE\+\-×÷]+$").unwrap();
}

/// The four operators the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// Map a display symbol to an operator. Exactly `+ - × ÷`, nothing else.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '×' => Some(Self::Mul),
            '÷' => Some(Self::Div),
            _ => None,
        }
    }

    /// The display symbol for this operator.
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '×',
            Self::Div => '÷',
        }
    }

    /// Apply the operator to two operands.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }
}

/// A successfully evaluated expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// The raw result. May be non-finite.
    pub value: f64,
    /// The final operator/operand pair, if the expression had one.
    pub trailing: Option<TrailingOp>,
    /// Checked-integer fold of all-integer `+ - ×` chains.
    pub exact: IntFold,
}

/// The trailing operator/operand pair of an expression, carried out of the
/// parse so a repeated evaluation never has to re-scan the string.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailingOp {
    pub op: Operator,
    pub operand: f64,
    /// Literal text of the operand, used to rebuild a repeat expression.
    pub operand_text: String,
}

/// Exact integer value of an expression, tracked alongside the f64 result.
///
/// The integer-exactness ceiling has to be judged on the true integer
/// value: `9007199254740992+1` and `9007199254740991+1` round to the same
/// f64, yet only the first has left exactly-representable range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntFold {
    /// All-integer add/subtract/multiply chain with this exact value.
    Exact(i64),
    /// All-integer chain whose exact value left i64 range.
    Overflowed,
    /// Not an all-integer chain.
    NotInteger,
}

/// Why an expression failed to parse.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("operator without an operand")]
    MissingOperand,
    #[error("expression ends with an operator")]
    TrailingOperator,
    #[error("malformed number {0:?}")]
    MalformedNumber(String),
}

/// A scanned number literal.
#[derive(Clone, Debug)]
struct Literal {
    text: String,
    value: f64,
    int_value: Option<i64>,
}

/// Evaluate an infix expression.
pub fn evaluate(expr: &str) -> Result<Evaluation, ParseError> {
    if expr.is_empty() {
        return Err(ParseError::Empty);
    }
    if !EXPRESSION_CHARS.is_match(expr) {
        let bad = expr
            .chars()
            .find(|&c| !is_expression_char(c))
            .unwrap_or('?');
        return Err(ParseError::UnexpectedChar(bad));
    }

    let (first, tail) = tokenize(expr)?;

    // f64 fold with precedence: × and ÷ extend the open product term,
    // + and - settle it into the accumulator.
    let mut acc = 0.0;
    let mut pending = Operator::Add;
    let mut term = first.value;
    for (op, lit) in &tail {
        match op {
            Operator::Mul | Operator::Div => term = op.apply(term, lit.value),
            Operator::Add | Operator::Sub => {
                acc = pending.apply(acc, term);
                pending = *op;
                term = lit.value;
            }
        }
    }
    let value = pending.apply(acc, term);

    let exact = fold_exact(&first, &tail);
    let trailing = tail.last().map(|(op, lit)| TrailingOp {
        op: *op,
        operand: lit.value,
        operand_text: lit.text.clone(),
    });

    Ok(Evaluation {
        value,
        trailing,
        exact,
    })
}

fn is_expression_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-' | '×' | '÷')
}

/// Split the expression into a leading literal and `(operator, literal)`
/// pairs.
fn tokenize(expr: &str) -> Result<(Literal, Vec<(Operator, Literal)>), ParseError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut pos = 0;

    let first = scan_literal(&chars, &mut pos, true)?;
    let mut tail = Vec::new();
    while pos < chars.len() {
        let op =
            Operator::from_symbol(chars[pos]).ok_or(ParseError::UnexpectedChar(chars[pos]))?;
        pos += 1;
        if pos >= chars.len() {
            return Err(ParseError::TrailingOperator);
        }
        let literal = scan_literal(&chars, &mut pos, false)?;
        tail.push((op, literal));
    }
    Ok((first, tail))
}

/// Scan one number literal starting at `pos`. A leading minus is only legal
/// on the first literal of the expression.
fn scan_literal(chars: &[char], pos: &mut usize, allow_sign: bool) -> Result<Literal, ParseError> {
    let start = *pos;
    if allow_sign && chars.get(*pos) == Some(&'-') {
        *pos += 1;
    }
    let mut seen_exponent = false;
    while let Some(&c) = chars.get(*pos) {
        if c.is_ascii_digit() || c == '.' {
            *pos += 1;
        } else if (c == 'e' || c == 'E') && !seen_exponent {
            seen_exponent = true;
            *pos += 1;
            if matches!(chars.get(*pos), Some('+') | Some('-')) {
                *pos += 1;
            }
        } else {
            break;
        }
    }

    let text: String = chars[start..*pos].iter().collect();
    if text.is_empty() || text == "-" {
        return Err(ParseError::MissingOperand);
    }
    let value = text
        .parse::<f64>()
        .map_err(|_| ParseError::MalformedNumber(text.clone()))?;
    let int_value = text.parse::<i64>().ok();
    Ok(Literal {
        text,
        value,
        int_value,
    })
}

/// Mirror the evaluation in checked i64 arithmetic while the expression
/// stays an all-integer `+ - ×` chain.
fn fold_exact(first: &Literal, tail: &[(Operator, Literal)]) -> IntFold {
    let Some(mut term) = first.int_value else {
        return IntFold::NotInteger;
    };
    let mut acc: i64 = 0;
    let mut pending = Operator::Add;
    for (op, lit) in tail {
        let Some(rhs) = lit.int_value else {
            return IntFold::NotInteger;
        };
        match op {
            Operator::Div => return IntFold::NotInteger,
            Operator::Mul => match term.checked_mul(rhs) {
                Some(t) => term = t,
                None => return IntFold::Overflowed,
            },
            Operator::Add | Operator::Sub => {
                match apply_checked(pending, acc, term) {
                    Some(a) => acc = a,
                    None => return IntFold::Overflowed,
                }
                pending = *op;
                term = rhs;
            }
        }
    }
    match apply_checked(pending, acc, term) {
        Some(v) => IntFold::Exact(v),
        None => IntFold::Overflowed,
    }
}

fn apply_checked(op: Operator, lhs: i64, rhs: i64) -> Option<i64> {
    match op {
        Operator::Add => lhs.checked_add(rhs),
        Operator::Sub => lhs.checked_sub(rhs),
        Operator::Mul => lhs.checked_mul(rhs),
        Operator::Div => None,
    }
}
