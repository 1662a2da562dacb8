//! Confidence decay for remembered knowledge.
//!
//! Decay runs alongside the absolute-age staleness of relationships; the two
//! are independent and neither one implies the other:
//!
//! - [`formula`] computes decayed confidence from age and category rate.
//! - [`MemoryGraph::prune_decayed`] hard-deletes relationships whose decayed
//!   confidence falls below the configured prune threshold.
//! - [`sweeper::DecaySweeper`] runs that prune on a fixed interval.
//! - The `confirm_*` operations push confidence back up when information is
//!   observed again.

pub mod formula;
pub mod sweeper;

use uuid::Uuid;

use relmem_types::entity::EntityId;
use relmem_types::fact::Fact;
use relmem_types::relationship::Relationship;

pub use formula::{DECAY_FLOOR, Decayable, age_in_days, decayed_confidence};

use crate::graph::MemoryGraph;
use crate::storage::kv_store::KvStore;

impl<K: KvStore> MemoryGraph<K> {
    /// Decayed confidence of any decayable record, as of now.
    pub fn decayed_confidence_of<T: Decayable>(&self, item: &T) -> f64 {
        item.decayed_confidence_at(self.clock().now())
    }

    /// True iff the record's decayed confidence is below the configured
    /// `decay_stale_threshold` (0.3 by default).
    pub fn is_stale_by_decay<T: Decayable>(&self, item: &T) -> bool {
        item.is_stale_by_decay(self.clock().now(), self.config().decay_stale_threshold)
    }

    /// Delete every relationship whose decayed confidence is below the
    /// configured prune threshold. Returns the number removed.
    ///
    /// With the default threshold equal to [`DECAY_FLOOR`] nothing is ever
    /// removed, because decay cannot go below its own floor.
    #[tracing::instrument(name = "prune_decayed", skip(self))]
    pub async fn prune_decayed(&self) -> usize {
        let mut state = self.lock().await;
        let now = self.clock().now();
        let threshold = self.config().prune_threshold;

        let doomed: Vec<Uuid> = state
            .relationships
            .iter()
            .filter(|r| r.decayed_confidence_at(now) < threshold)
            .map(|r| r.id)
            .collect();

        let removed = doomed
            .iter()
            .filter(|id| state.remove_relationship(id))
            .count();

        if removed > 0 {
            tracing::info!(removed, threshold, "Pruned decayed relationships");
            self.persist(&state).await;
        } else {
            tracing::debug!(threshold, "Decay sweep found nothing to prune");
        }
        removed
    }

    /// Re-observe a relationship: confidence up by `confirm_boost`, capped at 1.0.
    pub async fn confirm_relationship(&self, id: &Uuid) -> Option<Relationship> {
        let mut state = self.lock().await;
        let now = self.clock().now();
        let boost = self.config().confirm_boost;
        let rel = state.relationships.iter_mut().find(|r| &r.id == id)?;
        rel.confirm(boost, now);
        let rel = rel.clone();
        self.persist(&state).await;
        Some(rel)
    }

    /// Re-observe the `(subject, predicate)` fact.
    pub async fn confirm_fact(&self, subject: &EntityId, predicate: &str) -> Option<Fact> {
        let mut state = self.lock().await;
        let now = self.clock().now();
        let boost = self.config().confirm_boost;
        let fact = state
            .facts
            .iter_mut()
            .find(|f| &f.subject == subject && f.predicate == predicate)?;
        fact.confirm(boost, now);
        let fact = fact.clone();
        self.persist(&state).await;
        Some(fact)
    }
}
