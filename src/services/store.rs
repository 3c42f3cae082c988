//! Storage boundary used by the price engine.

use crate::error::StoreError;
use chrono::{DateTime, Utc};

/// Reads and writes that participate in one tick's transaction.
pub trait PriceTransaction {
    /// Current price for a symbol, or `None` if it has never been priced.
    fn read_price(&mut self, symbol: &str) -> Result<Option<f64>, StoreError>;

    /// Insert or overwrite the price for a symbol, refreshing its timestamp.
    fn upsert_price(
        &mut self,
        symbol: &str,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// A store that can run a closure inside one atomic transaction.
pub trait PriceStore: Send + Sync {
    /// Run `f` in a transaction. Commits when `f` returns `Ok`, rolls back
    /// every write made through the transaction when it returns `Err`.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn PriceTransaction) -> Result<T, E>,
        E: From<StoreError>;
}
