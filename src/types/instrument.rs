use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;

/// Industry category an instrument belongs to.
///
/// Instruments carry a list of sectors so composite labels such as
/// `IN_BANK` keep their `Bank` membership without string matching at
/// tick time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Tech,
    Bank,
    Auto,
    Energy,
    Chip,
    Retail,
    Media,
    Other(String),
}

impl Sector {
    /// Map a single label token to a sector.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "TECH" => Sector::Tech,
            "BANK" | "BANKING" => Sector::Bank,
            "AUTO" => Sector::Auto,
            "ENERGY" => Sector::Energy,
            "CHIP" | "SEMI" => Sector::Chip,
            "RETAIL" => Sector::Retail,
            "MEDIA" => Sector::Media,
            other => Sector::Other(other.to_string()),
        }
    }

    /// Parse a sector label into its tags.
    ///
    /// The label is split on `_` and `+`, so `IN_BANK` yields
    /// `[Other("IN"), Bank]`. Empty tokens are skipped.
    pub fn parse_tags(label: &str) -> Vec<Sector> {
        let mut tags = Vec::new();
        for token in label.split(['_', '+']) {
            if token.trim().is_empty() {
                continue;
            }
            let sector = Sector::from_token(token);
            if !tags.contains(&sector) {
                tags.push(sector);
            }
        }
        tags
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sector::Tech => write!(f, "TECH"),
            Sector::Bank => write!(f, "BANK"),
            Sector::Auto => write!(f, "AUTO"),
            Sector::Energy => write!(f, "ENERGY"),
            Sector::Chip => write!(f, "CHIP"),
            Sector::Retail => write!(f, "RETAIL"),
            Sector::Media => write!(f, "MEDIA"),
            Sector::Other(label) => write!(f, "{}", label),
        }
    }
}

/// A tradable instrument with its static simulation attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Unique ticker symbol.
    pub symbol: String,
    /// Sector tags used by sector sentiment.
    pub sectors: Vec<Sector>,
    /// Idiosyncratic volatility as a fraction of price.
    pub volatility: f64,
}

impl Instrument {
    /// Create an instrument from a sector label such as `TECH` or `IN_BANK`.
    pub fn new(symbol: impl Into<String>, sector_label: &str, volatility: f64) -> Self {
        Self {
            symbol: symbol.into(),
            sectors: Sector::parse_tags(sector_label),
            volatility,
        }
    }

    /// Check whether the instrument carries a sector tag.
    pub fn in_sector(&self, sector: &Sector) -> bool {
        self.sectors.contains(sector)
    }
}

/// The fixed, validated list of instruments priced on every tick.
///
/// Iteration order is the configured order and never changes for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    instruments: Vec<Instrument>,
}

impl Universe {
    /// Build a universe, rejecting empty lists, duplicate symbols and
    /// non-positive volatility.
    pub fn new(instruments: Vec<Instrument>) -> Result<Self, ConfigError> {
        if instruments.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }

        let mut seen = HashSet::new();
        for instrument in &instruments {
            if instrument.symbol.trim().is_empty() {
                return Err(ConfigError::InvalidUniverseEntry(
                    "empty symbol".to_string(),
                ));
            }
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(instrument.symbol.clone()));
            }
            if !instrument.volatility.is_finite() || instrument.volatility <= 0.0 {
                return Err(ConfigError::InvalidVolatility {
                    symbol: instrument.symbol.clone(),
                    volatility: instrument.volatility,
                });
            }
        }

        Ok(Self { instruments })
    }

    /// Parse a universe from `SYM|SECTOR|vol` entries separated by commas.
    ///
    /// Example: `AAPL|TECH|0.004,HDFC|IN_BANK|0.003`.
    pub fn parse(entries: &str) -> Result<Self, ConfigError> {
        let mut instruments = Vec::new();
        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(ConfigError::InvalidUniverseEntry(entry.to_string()));
            }
            let volatility: f64 = parts[2]
                .parse()
                .map_err(|_| ConfigError::InvalidUniverseEntry(entry.to_string()))?;
            instruments.push(Instrument::new(parts[0].to_uppercase(), parts[1], volatility));
        }
        Self::new(instruments)
    }

    /// Iterate instruments in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    /// Look up an instrument by symbol.
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl Default for Universe {
    /// The ten-stock demo market.
    fn default() -> Self {
        Self {
            instruments: vec![
                Instrument::new("AAPL", "TECH", 0.004),
                Instrument::new("MSFT", "TECH", 0.0035),
                Instrument::new("GOOGL", "TECH", 0.0045),
                Instrument::new("NVDA", "TECH", 0.007),
                Instrument::new("TSLA", "AUTO", 0.009),
                Instrument::new("AMZN", "RETAIL", 0.0045),
                Instrument::new("META", "TECH", 0.0038),
                Instrument::new("NFLX", "MEDIA", 0.006),
                Instrument::new("INTC", "CHIP", 0.002),
                Instrument::new("AMD", "CHIP", 0.0055),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_label_keeps_bank_tag() {
        let tags = Sector::parse_tags("IN_BANK");
        assert!(tags.contains(&Sector::Bank));
        assert!(tags.contains(&Sector::Other("IN".to_string())));
    }

    #[test]
    fn test_tag_parsing_is_token_based() {
        // "BANKRUPTCY" is not the bank sector
        let tags = Sector::parse_tags("BANKRUPTCY");
        assert_eq!(tags, vec![Sector::Other("BANKRUPTCY".to_string())]);
    }

    #[test]
    fn test_parse_tags_dedupes() {
        assert_eq!(Sector::parse_tags("tech+TECH"), vec![Sector::Tech]);
    }

    #[test]
    fn test_comma_is_not_a_tag_separator() {
        assert_eq!(
            Sector::parse_tags("TECH,BANK"),
            vec![Sector::Other("TECH,BANK".to_string())]
        );
        assert_eq!(
            Sector::parse_tags("IN_BANK+CHIP"),
            vec![Sector::Other("IN".to_string()), Sector::Bank, Sector::Chip]
        );
    }

    #[test]
    fn test_universe_rejects_empty() {
        assert!(matches!(Universe::new(vec![]), Err(ConfigError::EmptyUniverse)));
    }

    #[test]
    fn test_universe_rejects_bad_volatility() {
        let err = Universe::new(vec![Instrument::new("AAPL", "TECH", 0.0)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVolatility { .. }));

        let err = Universe::new(vec![Instrument::new("AAPL", "TECH", f64::NAN)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVolatility { .. }));
    }

    #[test]
    fn test_universe_rejects_duplicates() {
        let err = Universe::new(vec![
            Instrument::new("AAPL", "TECH", 0.004),
            Instrument::new("AAPL", "TECH", 0.005),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSymbol(s) if s == "AAPL"));
    }

    #[test]
    fn test_universe_parse() {
        let universe = Universe::parse("aapl|TECH|0.004, HDFC|IN_BANK|0.003").unwrap();
        assert_eq!(universe.len(), 2);
        let hdfc = universe.get("HDFC").unwrap();
        assert!(hdfc.in_sector(&Sector::Bank));
        assert_eq!(universe.iter().next().unwrap().symbol, "AAPL");
    }

    #[test]
    fn test_universe_parse_rejects_malformed() {
        assert!(Universe::parse("AAPL|TECH").is_err());
        assert!(Universe::parse("AAPL|TECH|fast").is_err());
        assert!(matches!(Universe::parse(""), Err(ConfigError::EmptyUniverse)));
    }

    #[test]
    fn test_default_universe_is_valid() {
        let universe = Universe::default();
        assert_eq!(universe.len(), 10);
        assert!(Universe::new(universe.iter().cloned().collect()).is_ok());
    }
}
