pub mod engine;
pub mod macro_regime;
pub mod observer;
pub mod pricing;
pub mod random;
pub mod scheduler;
pub mod sentiment;
pub mod sqlite_store;
pub mod store;

pub use engine::{EngineParams, PriceEngine};
pub use macro_regime::{MacroParams, MacroRegime};
pub use observer::{TickObserver, TracingObserver};
pub use pricing::{next_price, PricingParams, Signals};
pub use random::{std_rng, RandomSource, ScriptedRandom};
pub use scheduler::{PriceTicker, TickerStats};
pub use sentiment::{NewsParams, SectorParams, SectorRule, SeasonalityParams, SentimentBand};
pub use sqlite_store::SqliteStore;
pub use store::{PriceStore, PriceTransaction};
