//! Fixed-interval tick scheduler.
//!
//! Runs the first tick immediately, then one tick per interval measured
//! from tick start. A failed tick is logged and the loop carries on; there
//! is no retry within an interval.

use crate::services::engine::PriceEngine;
use crate::services::random::RandomSource;
use crate::services::store::PriceStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Counters kept by a running ticker.
#[derive(Debug, Default)]
pub struct TickerStats {
    pub committed: AtomicU64,
    pub failed: AtomicU64,
}

/// Handle to a running tick loop.
pub struct PriceTicker {
    handle: JoinHandle<()>,
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    stats: Arc<TickerStats>,
}

impl PriceTicker {
    /// Spawn the tick loop on the current tokio runtime.
    pub fn start<S, R>(engine: Arc<PriceEngine<S, R>>, interval: Duration) -> Self
    where
        S: PriceStore + 'static,
        R: RandomSource + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let stats = Arc::new(TickerStats::default());

        let handle = tokio::spawn(tick_loop(
            engine,
            interval,
            cancel.clone(),
            wake.clone(),
            stats.clone(),
        ));

        info!("Price ticker started (interval {:?})", interval);
        Self {
            handle,
            cancel,
            wake,
            stats,
        }
    }

    pub fn stats(&self) -> &TickerStats {
        &self.stats
    }

    /// Signal the loop to stop and wait for the in-flight tick to finish.
    pub async fn stop(self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        if let Err(e) = self.handle.await {
            error!("Price ticker task failed: {}", e);
        }
        info!("Price ticker stopped");
    }
}

async fn tick_loop<S, R>(
    engine: Arc<PriceEngine<S, R>>,
    interval: Duration,
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    stats: Arc<TickerStats>,
) where
    S: PriceStore + 'static,
    R: RandomSource + Send + 'static,
{
    // Fixed rate; the first tick completes immediately
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => {}
        }
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        let engine = engine.clone();
        let outcome = tokio::task::spawn_blocking(move || engine.run_tick()).await;

        match outcome {
            Ok(Ok(_)) => {
                stats.committed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Price tick failed, waiting for next interval: {}", e);
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!("Price tick task panicked: {}", e);
            }
        }
    }
}
