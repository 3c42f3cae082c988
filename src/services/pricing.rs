//! Price update function.
//!
//! All contributions compose as fractions of the previous price:
//!
//! 1. idiosyncratic noise `vol * (U - 0.5)`
//! 2. plus global, macro, sector and company sentiment
//! 3. plus weekly drift, times the intraday multiplier
//! 4. clamped to `±max_move`
//! 5. rarely amplified by a jump in `[jump_min, jump_max]`, past the clamp
//! 6. applied to the previous price and floored

use crate::error::ConfigError;
use crate::services::random::RandomSource;
use crate::types::PriceMove;

/// Signals shared by every instrument in a tick plus the per-instrument ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub global: f64,
    pub macro_drift: f64,
    pub sector: f64,
    pub company: f64,
    pub weekly: f64,
    pub intraday: f64,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            global: 0.0,
            macro_drift: 0.0,
            sector: 0.0,
            company: 0.0,
            weekly: 0.0,
            intraday: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingParams {
    /// Largest fractional move before a jump.
    pub max_move: f64,
    pub jump_probability: f64,
    pub jump_min: f64,
    pub jump_max: f64,
    /// Lowest price an instrument can reach.
    pub floor: f64,
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            max_move: 0.12,
            jump_probability: 0.02,
            jump_min: 2.0,
            jump_max: 5.0,
            floor: 1.0,
        }
    }
}

impl PricingParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_move.is_finite() && self.max_move > 0.0 && self.max_move < 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_move",
                reason: format!("must be in (0, 1), got {}", self.max_move),
            });
        }
        if !(0.0..=1.0).contains(&self.jump_probability) {
            return Err(ConfigError::InvalidParameter {
                name: "jump_probability",
                reason: format!("must be in [0, 1], got {}", self.jump_probability),
            });
        }
        if !(self.jump_min.is_finite() && self.jump_min >= 1.0 && self.jump_max >= self.jump_min)
            || !self.jump_max.is_finite()
        {
            return Err(ConfigError::InvalidParameter {
                name: "jump_range",
                reason: format!("need 1 <= min <= max, got [{}, {}]", self.jump_min, self.jump_max),
            });
        }
        if !(self.floor.is_finite() && self.floor > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "floor",
                reason: format!("must be positive, got {}", self.floor),
            });
        }
        Ok(())
    }

    /// Largest fractional move a single tick can produce.
    pub fn max_tick_move(&self) -> f64 {
        self.max_move * self.jump_max
    }
}

/// Compute the next price for one instrument.
///
/// Takes two draws (noise, jump check) and a third when the jump fires.
/// For finite `prev > 0` the result is finite and at least `params.floor`.
pub fn next_price(
    prev: f64,
    volatility: f64,
    signals: &Signals,
    params: &PricingParams,
    rng: &mut dyn RandomSource,
) -> PriceMove {
    let noise = volatility * (rng.next_unit() - 0.5);

    let mut pct = noise + signals.global + signals.macro_drift + signals.sector + signals.company;
    pct = (pct + signals.weekly) * signals.intraday;
    pct = pct.clamp(-params.max_move, params.max_move);

    let jumped = rng.chance(params.jump_probability);
    if jumped {
        pct *= rng.uniform(params.jump_min, params.jump_max);
    }

    let candidate = prev + prev * pct;
    let price = if candidate.is_finite() {
        candidate.max(params.floor)
    } else {
        prev.max(params.floor)
    };

    PriceMove { price, pct, jumped }
}
