//! Sentiment and seasonality signals.
//!
//! Random generators take one or more fresh draws per call and keep no
//! state. Seasonality is a pure function of the market-local calendar.
//! Every value is a fraction of price.

use crate::services::random::RandomSource;
use crate::types::{Instrument, Sector};
use chrono::Weekday;

/// One row of the global sentiment table.
///
/// Bands are checked in order; the first whose cumulative `upper` bound
/// exceeds the draw supplies `bias`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentBand {
    pub upper: f64,
    pub bias: f64,
}

/// Default global table: rare strong moves, more frequent small ones.
pub const DEFAULT_GLOBAL_BANDS: [SentimentBand; 4] = [
    SentimentBand { upper: 0.01, bias: 0.02 },
    SentimentBand { upper: 0.02, bias: -0.02 },
    SentimentBand { upper: 0.08, bias: 0.008 },
    SentimentBand { upper: 0.15, bias: -0.008 },
];

/// Sector-conditional bias.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRule {
    pub sector: Sector,
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorParams {
    /// Per-instrument probability that a sector rule fires this tick.
    pub probability: f64,
    /// Rules in priority order; the first matching tag wins.
    pub rules: Vec<SectorRule>,
}

impl Default for SectorParams {
    fn default() -> Self {
        Self {
            probability: 0.02,
            rules: vec![
                SectorRule { sector: Sector::Tech, bias: 0.015 },
                SectorRule { sector: Sector::Bank, bias: -0.015 },
                SectorRule { sector: Sector::Auto, bias: -0.015 },
                SectorRule { sector: Sector::Energy, bias: 0.02 },
                SectorRule { sector: Sector::Chip, bias: 0.02 },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsParams {
    pub positive_probability: f64,
    pub positive_shock: f64,
    pub negative_probability: f64,
    pub negative_shock: f64,
}

impl Default for NewsParams {
    fn default() -> Self {
        Self {
            positive_probability: 0.01,
            positive_shock: 0.03,
            negative_probability: 0.005,
            negative_shock: -0.04,
        }
    }
}

/// Day-of-week drift and hour-of-day volatility multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalityParams {
    pub monday_drift: f64,
    pub friday_drift: f64,
    /// Hours `[open_start, midday_start)`.
    pub open_start: u32,
    pub midday_start: u32,
    /// Hours `[close_start, close_end)`.
    pub close_start: u32,
    pub close_end: u32,
    pub open_multiplier: f64,
    pub midday_multiplier: f64,
    pub close_multiplier: f64,
    pub after_hours_multiplier: f64,
}

impl Default for SeasonalityParams {
    fn default() -> Self {
        Self {
            monday_drift: 0.001,
            friday_drift: -0.001,
            open_start: 9,
            midday_start: 11,
            close_start: 15,
            close_end: 16,
            open_multiplier: 1.5,
            midday_multiplier: 1.0,
            close_multiplier: 1.3,
            after_hours_multiplier: 0.5,
        }
    }
}

/// Market-wide sentiment, drawn once per tick.
pub fn global_sentiment(rng: &mut dyn RandomSource, bands: &[SentimentBand]) -> f64 {
    let r = rng.next_unit();
    bands
        .iter()
        .find(|band| r < band.upper)
        .map(|band| band.bias)
        .unwrap_or(0.0)
}

/// Sector sentiment for one instrument. Always takes exactly one draw.
pub fn sector_sentiment(
    rng: &mut dyn RandomSource,
    instrument: &Instrument,
    params: &SectorParams,
) -> f64 {
    let r = rng.next_unit();
    if r >= params.probability {
        return 0.0;
    }
    params
        .rules
        .iter()
        .find(|rule| instrument.in_sector(&rule.sector))
        .map(|rule| rule.bias)
        .unwrap_or(0.0)
}

/// Company-specific news shock. Takes two independent draws; both shocks
/// may land on the same tick.
pub fn company_news(rng: &mut dyn RandomSource, params: &NewsParams) -> f64 {
    let mut shock = 0.0;
    if rng.chance(params.positive_probability) {
        shock += params.positive_shock;
    }
    if rng.chance(params.negative_probability) {
        shock += params.negative_shock;
    }
    shock
}

pub fn weekly_drift(weekday: Weekday, params: &SeasonalityParams) -> f64 {
    match weekday {
        Weekday::Mon => params.monday_drift,
        Weekday::Fri => params.friday_drift,
        _ => 0.0,
    }
}

pub fn intraday_multiplier(hour: u32, params: &SeasonalityParams) -> f64 {
    if (params.open_start..params.midday_start).contains(&hour) {
        params.open_multiplier
    } else if (params.midday_start..params.close_start).contains(&hour) {
        params.midday_multiplier
    } else if (params.close_start..params.close_end).contains(&hour) {
        params.close_multiplier
    } else {
        params.after_hours_multiplier
    }
}
