// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heartbeat-driven persistence.
//!
//! The store is flushed on a fixed timer and whenever the server pings us.
//! Each flush is bounded by the storage I/O timeout; a timed-out or failed
//! flush leaves the store dirty so the next heartbeat retries it.

use std::time::Duration;

use loudbot_core::LoudbotError;
use loudbot_store::MessageStore;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Timer for periodic flushes. The first tick fires one `period` from now.
pub fn interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Flushes `store`, giving up after `limit`.
///
/// Returns whether anything was written.
pub async fn flush_with_timeout(
    store: &mut MessageStore,
    limit: Duration,
) -> Result<bool, LoudbotError> {
    match tokio::time::timeout(limit, store.flush()).await {
        Ok(result) => result,
        Err(_) => Err(LoudbotError::Timeout { duration: limit }),
    }
}

/// Heartbeat flush: failures are logged, never propagated.
pub async fn beat(store: &mut MessageStore, limit: Duration) {
    match flush_with_timeout(store, limit).await {
        Ok(true) => debug!(stats = ?store.stats(), "heartbeat flush"),
        Ok(false) => {}
        Err(e) => warn!(
            error = %e,
            retryable = e.is_retryable(),
            "flush failed, will retry on next heartbeat"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loudbot_store::StoreOptions;
    use loudbot_test_utils::MockBackend;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tracing_test::traced_test;

    async fn store(backend: &MockBackend) -> MessageStore {
        MessageStore::load(
            Box::new(backend.clone()),
            StoreOptions::default(),
            StdRng::seed_from_u64(7),
        )
        .await
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn slow_write_times_out_and_stays_dirty() {
        let backend = MockBackend::whole_set();
        let mut store = store(&backend).await;
        store.add("SLOW DISKS ARE THE WORST", "nick").await.unwrap();

        backend.set_write_delay(Duration::from_secs(30)).await;
        let err = flush_with_timeout(&mut store, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LoudbotError::Timeout { .. }));
        assert!(err.is_retryable());
        assert!(store.is_dirty());

        backend.set_write_delay(Duration::ZERO).await;
        assert!(flush_with_timeout(&mut store, Duration::from_secs(1)).await.unwrap());
        assert!(!store.is_dirty());
        assert_eq!(backend.records().await.len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn beat_swallows_backend_failures() {
        let backend = MockBackend::whole_set();
        let mut store = store(&backend).await;
        store.add("FAILING WRITES HERE", "nick").await.unwrap();

        backend.fail_next_writes(1).await;
        beat(&mut store, Duration::from_secs(5)).await;
        assert!(store.is_dirty());
        assert!(logs_contain("flush failed, will retry on next heartbeat"));

        beat(&mut store, Duration::from_secs(5)).await;
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn clean_store_is_not_written() {
        let backend = MockBackend::whole_set();
        let mut store = store(&backend).await;
        assert!(!flush_with_timeout(&mut store, Duration::from_secs(1)).await.unwrap());
        assert_eq!(backend.write_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_skips_the_immediate_tick() {
        let start = Instant::now();
        let mut ticker = interval(Duration::from_secs(60));
        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
