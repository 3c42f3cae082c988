//! Tests for the fixed-interval tick scheduler

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use synthmarket::services::{
    std_rng, EngineParams, PriceEngine, PriceStore, PriceTicker, PriceTransaction, SqliteStore,
};
use synthmarket::{Instrument, StoreError, Universe};

fn universe() -> Universe {
    Universe::new(vec![
        Instrument::new("AAPL", "TECH", 0.004),
        Instrument::new("INTC", "CHIP", 0.002),
    ])
    .unwrap()
}

fn engine() -> Arc<PriceEngine<SqliteStore>> {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    Arc::new(
        PriceEngine::new(store, universe(), EngineParams::default(), std_rng(Some(11))).unwrap(),
    )
}

/// A store whose transactions can never be opened.
struct UnavailableStore;

impl PriceStore for UnavailableStore {
    fn with_transaction<T, E, F>(&self, _f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn PriceTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        Err(StoreError::Database(rusqlite::Error::InvalidQuery).into())
    }
}

/// A store whose every transaction takes a fixed extra time.
struct SlowStore {
    inner: SqliteStore,
    delay: Duration,
}

impl PriceStore for SlowStore {
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn PriceTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        std::thread::sleep(self.delay);
        self.inner.with_transaction(f)
    }
}

#[tokio::test]
async fn test_first_tick_runs_immediately() {
    let engine = engine();
    // Interval far longer than the test: only the immediate tick can run
    let ticker = PriceTicker::start(engine.clone(), Duration::from_secs(3600));

    tokio::time::sleep(Duration::from_millis(200)).await;
    ticker.stop().await;

    assert_eq!(engine.ticks().unwrap(), 1);
    assert_eq!(engine.store().list_prices().unwrap().len(), 2);
}

#[tokio::test]
async fn test_ticks_repeat_on_interval() {
    let engine = engine();
    let ticker = PriceTicker::start(engine.clone(), Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let committed = ticker.stats().committed.load(Ordering::Relaxed);
    let failed = ticker.stats().failed.load(Ordering::Relaxed);
    ticker.stop().await;

    assert!(committed >= 2, "only {} ticks committed", committed);
    assert_eq!(failed, 0);
    assert!(engine.ticks().unwrap() >= committed);
}

#[tokio::test]
async fn test_failed_ticks_do_not_stop_the_loop() {
    let engine = Arc::new(
        PriceEngine::new(
            Arc::new(UnavailableStore),
            universe(),
            EngineParams::default(),
            std_rng(Some(12)),
        )
        .unwrap(),
    );
    let ticker = PriceTicker::start(engine.clone(), Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let failed = ticker.stats().failed.load(Ordering::Relaxed);
    let committed = ticker.stats().committed.load(Ordering::Relaxed);
    ticker.stop().await;

    assert!(failed >= 2, "only {} failures recorded", failed);
    assert_eq!(committed, 0);
    assert_eq!(engine.ticks().unwrap(), 0);
}

#[tokio::test]
async fn test_stop_interrupts_sleep() {
    let ticker = PriceTicker::start(engine(), Duration::from_secs(3600));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Must return well before the hour-long interval elapses
    tokio::time::timeout(Duration::from_secs(5), ticker.stop())
        .await
        .expect("ticker did not stop");
}

#[tokio::test]
async fn test_interval_is_measured_from_tick_start() {
    let store = Arc::new(SlowStore {
        inner: SqliteStore::new_in_memory().unwrap(),
        delay: Duration::from_millis(60),
    });
    let engine = Arc::new(
        PriceEngine::new(store, universe(), EngineParams::default(), std_rng(Some(13))).unwrap(),
    );
    let ticker = PriceTicker::start(engine.clone(), Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(1050)).await;
    ticker.stop().await;

    // Ticks start every 100ms (about 11 in the window). Sleeping a full
    // interval after each 60ms tick would only fit about 7.
    let ticks = engine.ticks().unwrap();
    assert!(ticks >= 9, "only {} ticks in 1050ms", ticks);
}
