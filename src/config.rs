use crate::error::ConfigError;
use crate::services::engine::EngineParams;
use crate::types::Universe;
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Tick scheduling configuration.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Whether the scheduler runs at all.
    pub enabled: bool,
    /// Interval between ticks (ms).
    pub interval_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file holding `live_prices`.
    pub database_path: String,
    /// How long a statement waits on a locked database (ms).
    pub busy_timeout_ms: u64,
    /// Tick scheduling.
    pub tick: TickConfig,
    /// Seed for reproducible runs; entropy when unset.
    pub rng_seed: Option<u64>,
    /// Universe override in `SYM|SECTOR|vol,...` form.
    pub universe: Option<String>,
    /// Previous price for never-seen symbols.
    pub fallback_price: f64,
    /// Minimum price.
    pub price_floor: f64,
    /// Largest non-jump move per tick (fraction).
    pub max_tick_move: f64,
    /// Per-instrument jump probability.
    pub jump_probability: f64,
    /// Per-tick macro regime start probability.
    pub macro_start_probability: f64,
    /// Market local time offset from UTC (hours).
    pub market_utc_offset_hours: i32,
    /// Keys whose values were set but did not parse.
    invalid: Vec<(&'static str, String)>,
}

/// Reads keys through a lookup, remembering values that failed to parse.
struct EnvReader<F> {
    lookup: F,
    invalid: Vec<(&'static str, String)>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// A set, non-blank value for `key`.
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn reject(&mut self, key: &'static str, value: String) {
        warn!("Ignoring unparseable {}={:?}", key, value);
        self.invalid.push((key, value));
    }

    fn parse<T: FromStr>(&mut self, key: &'static str) -> Option<T> {
        let value = self.raw(key)?;
        match value.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.reject(key, value);
                None
            }
        }
    }

    fn parse_or<T: FromStr>(&mut self, key: &'static str, default: T) -> T {
        self.parse(key).unwrap_or(default)
    }

    fn flag_or(&mut self, key: &'static str, default: bool) -> bool {
        let Some(value) = self.raw(key) else {
            return default;
        };
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                self.reject(key, value);
                default
            }
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineParams::default();
        let mut reader = EnvReader {
            lookup,
            invalid: Vec::new(),
        };

        Self {
            database_path: reader
                .raw("DATABASE_PATH")
                .unwrap_or_else(|| "synthmarket.db".to_string()),
            busy_timeout_ms: reader.parse_or("STORE_BUSY_TIMEOUT_MS", 5_000),
            tick: TickConfig {
                enabled: reader.flag_or("ENABLE_PRICE_TICK", true),
                interval_ms: reader.parse_or("PRICE_TICK_INTERVAL_MS", 10_000),
            },
            rng_seed: reader.parse("RNG_SEED"),
            universe: reader.raw("MARKET_UNIVERSE"),
            fallback_price: reader.parse_or("PRICE_FALLBACK", defaults.fallback_price),
            price_floor: reader.parse_or("PRICE_FLOOR", defaults.pricing.floor),
            max_tick_move: reader.parse_or("MAX_TICK_MOVE", defaults.pricing.max_move),
            jump_probability: reader.parse_or(
                "JUMP_PROBABILITY",
                defaults.pricing.jump_probability,
            ),
            macro_start_probability: reader.parse_or(
                "MACRO_START_PROBABILITY",
                defaults.macro_regime.start_probability,
            ),
            market_utc_offset_hours: reader.parse_or("MARKET_UTC_OFFSET_HOURS", 0),
            invalid: reader.invalid,
        }
    }

    /// Build the instrument universe, falling back to the default market.
    pub fn universe(&self) -> Result<Universe, ConfigError> {
        match &self.universe {
            Some(entries) => Universe::parse(entries),
            None => Ok(Universe::default()),
        }
    }

    /// Build validated engine parameters.
    pub fn engine_params(&self) -> Result<EngineParams, ConfigError> {
        let mut params = EngineParams::default();
        params.fallback_price = self.fallback_price;
        params.pricing.floor = self.price_floor;
        params.pricing.max_move = self.max_tick_move;
        params.pricing.jump_probability = self.jump_probability;
        params.macro_regime.start_probability = self.macro_start_probability;
        params.market_offset = self
            .market_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::InvalidParameter {
                name: "market_utc_offset_hours",
                reason: format!("out of range: {}", self.market_utc_offset_hours),
            })?;
        params.validate()?;
        Ok(params)
    }

    /// Check everything that must hold before the first tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((name, value)) = self.invalid.first() {
            return Err(ConfigError::InvalidParameter {
                name: *name,
                reason: format!("cannot parse {:?}", value),
            });
        }
        if self.tick.enabled && self.tick.interval_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "interval_ms",
                reason: "tick interval must be positive".to_string(),
            });
        }
        self.universe()?;
        self.engine_params()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database_path, "synthmarket.db");
        assert!(config.tick.enabled);
        assert_eq!(config.tick.interval_ms, 10_000);
        assert_eq!(config.fallback_price, 100.0);
        assert_eq!(config.max_tick_move, 0.12);
        assert!(config.rng_seed.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(config.universe().unwrap().len(), 10);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ENABLE_PRICE_TICK", "0"),
            ("PRICE_TICK_INTERVAL_MS", "2500"),
            ("RNG_SEED", "42"),
            ("MARKET_UNIVERSE", "HDFC|IN_BANK|0.003"),
            ("PRICE_FALLBACK", "50"),
            ("MARKET_UTC_OFFSET_HOURS", "-5"),
        ]);
        assert!(!config.tick.enabled);
        assert_eq!(config.tick.interval_ms, 2500);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.universe().unwrap().len(), 1);

        let params = config.engine_params().unwrap();
        assert_eq!(params.fallback_price, 50.0);
        assert_eq!(params.market_offset.local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_unparseable_values_fail_validation() {
        let config = config_from(&[("PRICE_TICK_INTERVAL_MS", "soon"), ("RNG_SEED", "x")]);
        assert_eq!(config.tick.interval_ms, 10_000);
        assert!(config.rng_seed.is_none());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "PRICE_TICK_INTERVAL_MS", .. })
        ));

        for key in ["PRICE_FLOOR", "MAX_TICK_MOVE", "ENABLE_PRICE_TICK"] {
            let config = config_from(&[(key, "abc")]);
            match config.validate() {
                Err(ConfigError::InvalidParameter { name, .. }) => assert_eq!(name, key),
                other => panic!("{} accepted: {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("PRICE_FLOOR", "  "), ("MARKET_UNIVERSE", "")]);
        assert_eq!(config.price_floor, 1.0);
        assert!(config.universe.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = config_from(&[("MARKET_UNIVERSE", "AAPL|TECH|-0.1")]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVolatility { .. })
        ));

        let config = config_from(&[("PRICE_FLOOR", "0")]);
        assert!(config.validate().is_err());

        let config = config_from(&[("MARKET_UTC_OFFSET_HOURS", "30")]);
        assert!(config.validate().is_err());

        let config = config_from(&[("PRICE_TICK_INTERVAL_MS", "0")]);
        assert!(config.validate().is_err());
    }
}
