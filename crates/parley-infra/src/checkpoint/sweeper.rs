//! Background eviction of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use parley_core::session::checkpoint::Checkpointer;
use parley_core::session::store::SessionStore;

/// Periodically clear sessions idle for longer than `ttl`.
///
/// Runs every `interval` until `cancel` fires. The first sweep happens one
/// interval after start.
pub fn spawn_session_sweeper<C>(
    store: Arc<SessionStore<C>>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    C: Checkpointer + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(ttl_secs = ttl.as_secs(), interval_secs = interval.as_secs(), "session sweeper started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = store.evict_idle(ttl).await;
                    if evicted > 0 {
                        info!(evicted, "evicted idle sessions");
                    } else {
                        debug!("no idle sessions to evict");
                    }
                }
            }
        }
        info!("session sweeper stopped");
    })
}
