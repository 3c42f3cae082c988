//! Macro regime tracker.
//!
//! Holds the optional bull/bear regime that biases every instrument for a
//! bounded number of ticks. The state is owned by the engine and advanced
//! exactly once per tick.

use crate::services::random::RandomSource;
use crate::types::{MacroEvent, RegimeStep};
use tracing::debug;

/// Tunables for regime creation.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroParams {
    /// Per-tick probability of starting a regime when none is active.
    pub start_probability: f64,
    /// Absolute drift per tick; sign comes from the direction draw.
    pub drift: f64,
    pub min_ticks: u32,
    pub max_ticks: u32,
}

impl Default for MacroParams {
    fn default() -> Self {
        Self {
            start_probability: 0.01,
            drift: 0.01,
            min_ticks: 40,
            max_ticks: 120,
        }
    }
}

/// Process-wide regime state.
#[derive(Debug, Clone, Default)]
pub struct MacroRegime {
    params: MacroParams,
    event: Option<MacroEvent>,
}

impl MacroRegime {
    pub fn new(params: MacroParams) -> Self {
        Self {
            params,
            event: None,
        }
    }

    /// Currently active event, if any.
    pub fn current(&self) -> Option<&MacroEvent> {
        self.event.as_ref()
    }

    /// Replace the active event. Events with zero remaining ticks are
    /// treated as cleared.
    pub fn set_event(&mut self, event: Option<MacroEvent>) {
        self.event = event.filter(|e| e.ticks_remaining > 0);
    }

    /// Advance one tick and return this tick's drift.
    ///
    /// A newly started event is counted down in the same call, so an event
    /// of duration `n` contributes drift on `n - 1` ticks.
    pub fn advance(&mut self, rng: &mut dyn RandomSource) -> RegimeStep {
        let mut step = RegimeStep::default();

        if self.event.is_none() && rng.chance(self.params.start_probability) {
            let bull = rng.chance(0.5);
            let drift = if bull {
                self.params.drift
            } else {
                -self.params.drift
            };
            let ticks = rng
                .int_inclusive(self.params.min_ticks, self.params.max_ticks)
                .max(1);
            let event = MacroEvent {
                drift,
                ticks_remaining: ticks,
            };
            debug!(
                "Macro {} regime started: drift {:+.2}% for {} ticks",
                event.direction(),
                drift * 100.0,
                ticks
            );
            self.event = Some(event);
            step.started = Some(event);
        }

        let Some(event) = self.event.as_mut() else {
            return step;
        };

        event.ticks_remaining = event.ticks_remaining.saturating_sub(1);
        if event.ticks_remaining == 0 {
            let ended = *event;
            self.event = None;
            debug!("Macro {} regime ended", ended.direction());
            step.ended = Some(ended);
            return step;
        }

        step.drift = event.drift;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::random::ScriptedRandom;
    use crate::types::RegimeDirection;

    #[test]
    fn test_no_event_without_start_draw() {
        let mut regime = MacroRegime::default();
        let mut rng = ScriptedRandom::new([0.5]);
        let step = regime.advance(&mut rng);
        assert_eq!(step.drift, 0.0);
        assert!(step.started.is_none());
        assert!(regime.current().is_none());
        assert_eq!(rng.consumed(), 1);
    }

    #[test]
    fn test_start_bull_regime() {
        let mut regime = MacroRegime::default();
        // start, bull, duration draw -> 40
        let mut rng = ScriptedRandom::new([0.001, 0.2, 0.0]);
        let step = regime.advance(&mut rng);

        let started = step.started.unwrap();
        assert_eq!(started.direction(), RegimeDirection::Bull);
        assert_eq!(started.ticks_remaining, 40);
        assert_eq!(step.drift, 0.01);
        assert_eq!(regime.current().unwrap().ticks_remaining, 39);
    }

    #[test]
    fn test_start_bear_regime() {
        let mut regime = MacroRegime::default();
        let mut rng = ScriptedRandom::new([0.001, 0.7, 0.999]);
        let step = regime.advance(&mut rng);
        assert_eq!(step.started.unwrap().ticks_remaining, 120);
        assert_eq!(step.drift, -0.01);
    }

    #[test]
    fn test_countdown_and_clear() {
        let mut regime = MacroRegime::default();
        regime.set_event(Some(MacroEvent {
            drift: -0.01,
            ticks_remaining: 3,
        }));
        let mut rng = ScriptedRandom::new([]);

        let step = regime.advance(&mut rng);
        assert_eq!(step.drift, -0.01);
        assert_eq!(regime.current().unwrap().ticks_remaining, 2);

        let step = regime.advance(&mut rng);
        assert_eq!(step.drift, -0.01);
        assert_eq!(regime.current().unwrap().ticks_remaining, 1);

        let step = regime.advance(&mut rng);
        assert_eq!(step.drift, 0.0);
        assert!(step.ended.is_some());
        assert!(regime.current().is_none());

        // active events never consume draws
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn test_single_tick_event_starts_and_ends() {
        let mut regime = MacroRegime::new(MacroParams {
            min_ticks: 1,
            max_ticks: 1,
            ..MacroParams::default()
        });
        let mut rng = ScriptedRandom::new([0.0, 0.0, 0.0]);
        let step = regime.advance(&mut rng);
        assert!(step.started.is_some());
        assert!(step.ended.is_some());
        assert_eq!(step.drift, 0.0);
        assert!(regime.current().is_none());
    }

    #[test]
    fn test_set_event_ignores_exhausted() {
        let mut regime = MacroRegime::default();
        regime.set_event(Some(MacroEvent {
            drift: 0.01,
            ticks_remaining: 0,
        }));
        assert!(regime.current().is_none());
    }
}
