//! Guardrail tunables.

use serde::Deserialize;

/// Tunable thresholds for the session guardrails.
///
/// The two tolerances guard different failure modes (trend reversal versus
/// numeric stall) and stay separate. Defaults match the engine's shipped
/// behavior; a shell may override them from a TOML file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GuardrailConfig {
    /// Minimum relative shrink a decreasing-trend operation must achieve.
    pub trend_tolerance: f64,
    /// Relative change below which a division chain counts as stalled.
    pub stall_tolerance: f64,
    /// Consecutive divisions accepted before the chain is cut off.
    pub division_chain_cap: u32,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            trend_tolerance: 1e-12,
            stall_tolerance: 1e-15,
            division_chain_cap: 512,
        }
    }
}
