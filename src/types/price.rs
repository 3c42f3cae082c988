use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted current price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub symbol: String,
    pub current_price: f64,
    pub last_updated: DateTime<Utc>,
}

/// Result of one application of the price update function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMove {
    /// New price, already floored.
    pub price: f64,
    /// Fractional move applied to the previous price (after any jump).
    pub pct: f64,
    /// Whether the fat-tail jump fired.
    pub jumped: bool,
}

/// One instrument's outcome within a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub symbol: String,
    pub previous: f64,
    pub price: f64,
    pub pct_move: f64,
    pub jumped: bool,
    /// No prior record existed and the fallback price was used.
    pub bootstrapped: bool,
}

/// Summary of a committed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Sequence number of committed ticks, starting at 1.
    pub tick: u64,
    pub started_at: DateTime<Utc>,
    pub global_sentiment: f64,
    pub macro_drift: f64,
    pub updates: Vec<PriceUpdate>,
}

impl TickReport {
    /// Find the update for a symbol.
    pub fn update_for(&self, symbol: &str) -> Option<&PriceUpdate> {
        self.updates.iter().find(|u| u.symbol == symbol)
    }
}
