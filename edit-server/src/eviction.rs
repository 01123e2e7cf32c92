//! Background eviction of idle, unfocused sessions.

use crate::config::EvictionConfig;
use crate::registry::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn the periodic eviction sweep.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_eviction_task(
    registry: Arc<SessionRegistry>,
    config: EvictionConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Eviction task disabled");
            return;
        }

        let idle_timeout = Duration::from_secs(config.idle_timeout_secs);
        tracing::info!(
            "Eviction task started (interval: {}s, idle timeout: {}s)",
            config.interval_secs,
            config.idle_timeout_secs
        );

        // interval() panics on a zero period
        let mut timer = interval(Duration::from_secs(config.interval_secs.max(1)));

        loop {
            timer.tick().await;

            let evicted = registry.evict_idle(idle_timeout).await;
            if evicted > 0 {
                tracing::info!("Eviction: closed {} idle sessions", evicted);
            } else {
                tracing::debug!("Eviction: no idle sessions");
            }
        }
    })
}
