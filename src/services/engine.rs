//! Tick orchestrator.
//!
//! One tick reads, reprices and upserts every instrument of the universe
//! inside a single store transaction. A failed read or write rolls the
//! whole tick back. Ticks are serialized by the engine's state lock.

use crate::error::{ConfigError, EngineError, Result};
use crate::services::macro_regime::{MacroParams, MacroRegime};
use crate::services::observer::TickObserver;
use crate::services::pricing::{next_price, PricingParams, Signals};
use crate::services::random::RandomSource;
use crate::services::sentiment::{
    company_news, global_sentiment, intraday_multiplier, sector_sentiment, weekly_drift,
    NewsParams, SectorParams, SeasonalityParams, SentimentBand, DEFAULT_GLOBAL_BANDS,
};
use crate::services::store::PriceStore;
use crate::types::{MacroEvent, PriceUpdate, RegimeStep, TickReport, Universe};
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Every tunable of the price process.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    /// Previous price assumed for a symbol with no stored record.
    pub fallback_price: f64,
    pub global_bands: Vec<SentimentBand>,
    pub sector: SectorParams,
    pub news: NewsParams,
    pub seasonality: SeasonalityParams,
    pub pricing: PricingParams,
    pub macro_regime: MacroParams,
    /// Offset of the simulated exchange's local time from UTC.
    pub market_offset: FixedOffset,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            fallback_price: 100.0,
            global_bands: DEFAULT_GLOBAL_BANDS.to_vec(),
            sector: SectorParams::default(),
            news: NewsParams::default(),
            seasonality: SeasonalityParams::default(),
            pricing: PricingParams::default(),
            macro_regime: MacroParams::default(),
            market_offset: Utc.fix(),
        }
    }
}

fn check_probability(name: &'static str, p: f64) -> std::result::Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("probability must be in [0, 1], got {}", p),
        })
    }
}

impl EngineParams {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.pricing.validate()?;

        if !(self.fallback_price.is_finite() && self.fallback_price > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "fallback_price",
                reason: format!("must be positive, got {}", self.fallback_price),
            });
        }

        let mut previous = 0.0;
        for band in &self.global_bands {
            if band.upper < previous || band.upper > 1.0 || !band.bias.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "global_bands",
                    reason: "bounds must be ascending within [0, 1]".to_string(),
                });
            }
            previous = band.upper;
        }

        check_probability("sector_probability", self.sector.probability)?;
        check_probability("news_positive_probability", self.news.positive_probability)?;
        check_probability("news_negative_probability", self.news.negative_probability)?;
        check_probability("macro_start_probability", self.macro_regime.start_probability)?;

        if self.macro_regime.min_ticks == 0 || self.macro_regime.max_ticks < self.macro_regime.min_ticks {
            return Err(ConfigError::InvalidParameter {
                name: "macro_ticks",
                reason: format!(
                    "need 1 <= min <= max, got [{}, {}]",
                    self.macro_regime.min_ticks, self.macro_regime.max_ticks
                ),
            });
        }

        let s = &self.seasonality;
        let multipliers = [
            s.open_multiplier,
            s.midday_multiplier,
            s.close_multiplier,
            s.after_hours_multiplier,
        ];
        if multipliers.iter().any(|m| !(m.is_finite() && *m > 0.0)) {
            return Err(ConfigError::InvalidParameter {
                name: "intraday_multiplier",
                reason: "multipliers must be positive".to_string(),
            });
        }

        Ok(())
    }
}

/// Mutable state carried between ticks.
struct TickState<R> {
    regime: MacroRegime,
    rng: R,
    ticks: u64,
}

/// The price simulation engine.
pub struct PriceEngine<S, R = StdRng> {
    store: Arc<S>,
    universe: Universe,
    params: EngineParams,
    state: Mutex<TickState<R>>,
    observer: Option<Arc<dyn TickObserver>>,
}

impl<S, R> PriceEngine<S, R>
where
    S: PriceStore,
    R: RandomSource + Send,
{
    /// Create an engine. Invalid parameters are rejected here so a bad
    /// configuration never reaches a tick.
    pub fn new(
        store: Arc<S>,
        universe: Universe,
        params: EngineParams,
        rng: R,
    ) -> std::result::Result<Self, ConfigError> {
        params.validate()?;
        if universe.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }

        Ok(Self {
            store,
            universe,
            state: Mutex::new(TickState {
                regime: MacroRegime::new(params.macro_regime.clone()),
                rng,
                ticks: 0,
            }),
            params,
            observer: None,
        })
    }

    /// Attach an observer for lifecycle signals.
    pub fn with_observer(mut self, observer: Arc<dyn TickObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Number of committed ticks.
    pub fn ticks(&self) -> Result<u64> {
        Ok(self.lock_state()?.ticks)
    }

    /// Active macro event, if any.
    pub fn regime(&self) -> Result<Option<MacroEvent>> {
        Ok(self.lock_state()?.regime.current().copied())
    }

    /// Replace the macro regime state.
    pub fn set_regime(&self, event: Option<MacroEvent>) -> Result<()> {
        self.lock_state()?.regime.set_event(event);
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, TickState<R>>> {
        self.state.lock().map_err(|_| EngineError::Poisoned)
    }

    /// Run one tick against the wall clock.
    pub fn run_tick(&self) -> Result<TickReport> {
        self.run_tick_at(Utc::now())
    }

    /// Run one tick as if the current time were `now`.
    ///
    /// On error no price changes and the macro regime keeps its pre-tick
    /// state.
    pub fn run_tick_at(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let mut guard = self.lock_state()?;
        let state = &mut *guard;
        let tick = state.ticks + 1;

        let local = now.with_timezone(&self.params.market_offset);
        let weekly = weekly_drift(local.weekday(), &self.params.seasonality);
        let intraday = intraday_multiplier(local.hour(), &self.params.seasonality);

        let mut regime = state.regime.clone();
        let rng = &mut state.rng;

        let result = self.store.with_transaction(|tx| -> Result<(RegimeStep, TickReport)> {
            let step = regime.advance(rng);
            let global = global_sentiment(rng, &self.params.global_bands);
            if let Some(observer) = &self.observer {
                observer.on_tick_start(tick, global);
            }

            let mut updates = Vec::with_capacity(self.universe.len());
            for instrument in self.universe.iter() {
                let (previous, bootstrapped) = match tx.read_price(&instrument.symbol)? {
                    Some(price) if price.is_finite() && price > 0.0 => (price, false),
                    Some(price) => {
                        warn!(
                            "Stored price {} for {} is unusable, using fallback",
                            price, instrument.symbol
                        );
                        (self.params.fallback_price, true)
                    }
                    None => (self.params.fallback_price, true),
                };

                let signals = Signals {
                    global,
                    macro_drift: step.drift,
                    sector: sector_sentiment(rng, instrument, &self.params.sector),
                    company: company_news(rng, &self.params.news),
                    weekly,
                    intraday,
                };
                let mv = next_price(
                    previous,
                    instrument.volatility,
                    &signals,
                    &self.params.pricing,
                    rng,
                );

                tx.upsert_price(&instrument.symbol, mv.price, now)?;

                updates.push(PriceUpdate {
                    symbol: instrument.symbol.clone(),
                    previous,
                    price: mv.price,
                    pct_move: mv.pct,
                    jumped: mv.jumped,
                    bootstrapped,
                });
            }

            Ok((
                step,
                TickReport {
                    tick,
                    started_at: now,
                    global_sentiment: global,
                    macro_drift: step.drift,
                    updates,
                },
            ))
        });

        match result {
            Ok((step, report)) => {
                state.regime = regime;
                state.ticks = tick;
                debug!("Tick {} committed {} prices", tick, report.updates.len());
                self.notify_committed(&step, &report);
                Ok(report)
            }
            Err(e) => {
                if let Some(observer) = &self.observer {
                    observer.on_tick_failed(tick, &e);
                }
                Err(e)
            }
        }
    }

    fn notify_committed(&self, step: &RegimeStep, report: &TickReport) {
        let Some(observer) = &self.observer else {
            return;
        };
        if let Some(event) = &step.started {
            observer.on_regime_start(event);
        }
        for update in &report.updates {
            observer.on_price(update);
        }
        if let Some(event) = &step.ended {
            observer.on_regime_end(event);
        }
        observer.on_tick_end(report);
    }
}
