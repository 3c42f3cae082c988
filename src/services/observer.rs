//! Observability hooks for the price engine.

use crate::error::EngineError;
use crate::types::{MacroEvent, PriceUpdate, TickReport};
use tracing::{debug, error, info, warn};

/// Receives lifecycle signals from the engine. All methods default to
/// no-ops; none of them influence pricing.
pub trait TickObserver: Send + Sync {
    fn on_tick_start(&self, _tick: u64, _global_sentiment: f64) {}

    fn on_price(&self, _update: &PriceUpdate) {}

    fn on_tick_end(&self, _report: &TickReport) {}

    fn on_tick_failed(&self, _tick: u64, _error: &EngineError) {}

    fn on_regime_start(&self, _event: &MacroEvent) {}

    fn on_regime_end(&self, _event: &MacroEvent) {}
}

/// Logs engine activity through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TickObserver for TracingObserver {
    fn on_tick_start(&self, tick: u64, global_sentiment: f64) {
        if global_sentiment > 0.0 {
            info!("Tick {}: market pump +{:.2}%", tick, global_sentiment * 100.0);
        } else if global_sentiment < 0.0 {
            warn!("Tick {}: market drop {:.2}%", tick, global_sentiment * 100.0);
        } else {
            info!("Tick {}: normal market", tick);
        }
    }

    fn on_price(&self, update: &PriceUpdate) {
        if update.jumped {
            info!(
                "{} -> {:.2} ({:+.2}%, jump)",
                update.symbol,
                update.price,
                update.pct_move * 100.0
            );
        } else {
            debug!(
                "{} -> {:.2} ({:+.2}%)",
                update.symbol,
                update.price,
                update.pct_move * 100.0
            );
        }
    }

    fn on_tick_end(&self, report: &TickReport) {
        match serde_json::to_string(report) {
            Ok(json) => debug!("Tick {} committed: {}", report.tick, json),
            Err(e) => debug!(
                "Tick {} committed with {} prices ({})",
                report.tick,
                report.updates.len(),
                e
            ),
        }
    }

    fn on_tick_failed(&self, tick: u64, err: &EngineError) {
        error!("Price engine error on tick {}: {}", tick, err);
    }

    fn on_regime_start(&self, event: &MacroEvent) {
        info!(
            "Macro {} regime: {:+.2}% per tick for {} ticks",
            event.direction(),
            event.drift * 100.0,
            event.ticks_remaining
        );
    }

    fn on_regime_end(&self, event: &MacroEvent) {
        info!("Macro {} regime over", event.direction());
    }
}
