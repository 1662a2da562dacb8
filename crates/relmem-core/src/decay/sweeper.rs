//! Background decay sweep.
//!
//! Runs [`MemoryGraph::prune_decayed`] once per period until cancelled.
//! The first sweep happens one full period after spawning.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::graph::MemoryGraph;
use crate::storage::kv_store::KvStore;

/// Handle to a running sweep task.
pub struct DecaySweeper {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl DecaySweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    pub fn spawn<K>(graph: Arc<MemoryGraph<K>>, period: Duration) -> Self
    where
        K: KvStore + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(period_secs = period.as_secs(), "Decay sweeper started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = graph.prune_decayed().await;
                        tracing::debug!(removed, "Decay sweep finished");
                    }
                }
            }

            tracing::info!("Decay sweeper stopped");
        });

        Self { handle, cancel }
    }

    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the loop and wait for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Decay sweeper task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use relmem_types::attr::Attributes;
    use relmem_types::config::MemoryConfig;
    use relmem_types::entity::EntityType;

    use super::*;
    use crate::graph::test_support::graph_with_config;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_prunes_on_tick_and_stops() {
        let config = MemoryConfig {
            prune_threshold: 0.2,
            ..MemoryConfig::default()
        };
        let (graph, clock) = graph_with_config(config).await;
        let graph = Arc::new(graph);
        let me = graph.ensure_self_entity().await;
        let cafe = graph
            .add_entity(EntityType::Location, "Blue Bottle", Attributes::new())
            .await
            .unwrap();
        graph
            .add_relationship(&me, &cafe.id, "recently_visited", Attributes::new())
            .await
            .unwrap();

        // 0.8 * exp(-0.2 * 30) is well under 0.2 once floored to 0.1.
        clock.advance(ChronoDuration::days(30));

        let sweeper = DecaySweeper::spawn(graph.clone(), Duration::from_secs(60));
        tokio::task::yield_now().await;
        assert_eq!(graph.all_relationships().await.len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(graph.all_relationships().await.is_empty());

        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_token_stops_loop() {
        let (graph, _clock) = graph_with_config(MemoryConfig::default()).await;
        let sweeper = DecaySweeper::spawn(Arc::new(graph), Duration::from_secs(3600));
        let token = sweeper.cancellation_token();
        token.cancel();
        sweeper.shutdown().await;
        assert!(token.is_cancelled());
    }
}
