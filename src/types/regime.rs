use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a macro regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeDirection {
    Bull,
    Bear,
}

impl fmt::Display for RegimeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimeDirection::Bull => write!(f, "bull"),
            RegimeDirection::Bear => write!(f, "bear"),
        }
    }
}

/// An active multi-tick bullish or bearish drift.
///
/// `ticks_remaining` is always positive while the event exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroEvent {
    /// Signed per-tick drift as a fraction of price.
    pub drift: f64,
    pub ticks_remaining: u32,
}

impl MacroEvent {
    pub fn direction(&self) -> RegimeDirection {
        if self.drift >= 0.0 {
            RegimeDirection::Bull
        } else {
            RegimeDirection::Bear
        }
    }
}

/// Outcome of advancing the regime tracker by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegimeStep {
    /// Drift contribution for this tick.
    pub drift: f64,
    /// Event created during this call, as created.
    pub started: Option<MacroEvent>,
    /// Event cleared during this call.
    pub ended: Option<MacroEvent>,
}
