use thiserror::Error;

/// Price store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store connection lock poisoned")]
    Poisoned,

    #[error("Invalid timestamp for {symbol}: {millis}")]
    InvalidTimestamp { symbol: String, millis: i64 },
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Instrument universe is empty")]
    EmptyUniverse,

    #[error("Duplicate symbol in universe: {0}")]
    DuplicateSymbol(String),

    #[error("Invalid volatility for {symbol}: {volatility}")]
    InvalidVolatility { symbol: String, volatility: f64 },

    #[error("Malformed universe entry: {0}")]
    InvalidUniverseEntry(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Price engine errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Tick aborted: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tick state lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, EngineError>;
