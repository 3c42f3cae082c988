//! SQLite persistence for live prices.
//!
//! Owns the single `live_prices` table. Every tick runs inside one
//! `IMMEDIATE` transaction so concurrent writers wait on the busy timeout
//! instead of interleaving with a half-written tick.

use crate::error::StoreError;
use crate::services::store::{PriceStore, PriceTransaction};
use crate::types::PriceRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// SQLite store for the live price table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS live_prices (
                symbol TEXT PRIMARY KEY,
                current_price REAL NOT NULL,
                last_updated INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Get the stored record for a symbol.
    pub fn get_price(&self, symbol: &str) -> Result<Option<PriceRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT symbol, current_price, last_updated FROM live_prices WHERE symbol = ?1",
                params![symbol],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(symbol, price, millis)| to_record(symbol, price, millis))
            .transpose()
    }

    /// All stored prices, ordered by symbol.
    pub fn list_prices(&self) -> Result<Vec<PriceRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, current_price, last_updated FROM live_prices ORDER BY symbol",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(symbol, price, millis)| to_record(symbol, price, millis))
            .collect()
    }
}

fn to_record(symbol: String, current_price: f64, millis: i64) -> Result<PriceRecord, StoreError> {
    let last_updated = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::InvalidTimestamp {
            symbol: symbol.clone(),
            millis,
        })?;
    Ok(PriceRecord {
        symbol,
        current_price,
        last_updated,
    })
}

impl PriceStore for SqliteStore {
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn PriceTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        let mut handle = SqliteTransaction { tx: &tx };
        match f(&mut handle) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                warn!("Rolling back price transaction");
                if let Err(rollback) = tx.rollback() {
                    error!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

/// Transaction handle over an open SQLite transaction.
struct SqliteTransaction<'a> {
    tx: &'a Transaction<'a>,
}

impl PriceTransaction for SqliteTransaction<'_> {
    fn read_price(&mut self, symbol: &str) -> Result<Option<f64>, StoreError> {
        let price = self
            .tx
            .query_row(
                "SELECT current_price FROM live_prices WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;
        Ok(price)
    }

    fn upsert_price(
        &mut self,
        symbol: &str,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.tx.execute(
            "INSERT INTO live_prices (symbol, current_price, last_updated)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(symbol) DO UPDATE SET
                current_price = excluded.current_price,
                last_updated = excluded.last_updated",
            params![symbol, price, timestamp.timestamp_millis()],
        )?;
        Ok(())
    }
}
