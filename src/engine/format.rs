//! Result rendering.
//!
//! Chooses between integer, scientific and plain decimal form for a value
//! that passed the guardrails.

/// Distance from an integer that still renders as one.
const INT_SNAP: f64 = 1e-9;

/// Integer rendering bound outside integer mode.
const INT_DISPLAY_MAX: f64 = 1e15;

const SCI_UPPER: f64 = 1e12;
const SCI_LOWER: f64 = 1e-6;

/// Render a finite value for display.
///
/// In integer mode anything within [`INT_SNAP`] of an integer renders as
/// that integer. Outside integer mode the same applies below
/// [`INT_DISPLAY_MAX`]; very large or very small magnitudes switch to
/// scientific notation, everything else uses the default decimal form.
pub fn format_value(value: f64, int_mode: bool) -> String {
    let nearest = value.round();
    let near_integer = (value - nearest).abs() < INT_SNAP;

    if int_mode && near_integer {
        return format!("{}", nearest as i64);
    }
    if !int_mode && near_integer && value.abs() < INT_DISPLAY_MAX {
        return format!("{}", nearest as i64);
    }
    if value.abs() >= SCI_UPPER || (value != 0.0 && value.abs() < SCI_LOWER) {
        return format_scientific(value);
    }
    value.to_string()
}

/// Scientific notation with up to 10 fractional mantissa digits, trailing
/// zeros and a bare trailing `.` stripped.
fn format_scientific(value: f64) -> String {
    let raw = format!("{:.10e}", value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
            format!("{mantissa}e{exponent}")
        }
        None => raw,
    }
}
