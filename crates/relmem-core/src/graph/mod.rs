//! The memory graph: entity, relationship and fact stores.
//!
//! `MemoryGraph` owns the three collections behind a single async mutex, so
//! every operation (including its check-then-act dedup logic and the
//! write-through flush that follows it) runs as one critical section.
//! Construct one instance at startup and share it by reference or `Arc`.
//!
//! Persistence is write-through: after each mutating operation all three
//! collections are rewritten to the [`KvStore`]. Flush failures are logged
//! and swallowed; the in-memory state stays authoritative.

pub mod entities;
pub mod facts;
pub mod relationships;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use relmem_types::config::MemoryConfig;
use relmem_types::entity::{Entity, EntityId};
use relmem_types::error::MemoryError;
use relmem_types::fact::Fact;
use relmem_types::relationship::Relationship;
use relmem_types::stats::MemoryStats;

use crate::clock::{Clock, SystemClock};
use crate::extract::{Extractor, default_extractors};
use crate::storage::kv_store::KvStore;

/// Key of the entity map in the key-value store.
pub const ENTITIES_KEY: &str = "entities";
/// Key of the relationship list in the key-value store.
pub const RELATIONSHIPS_KEY: &str = "relationships";
/// Key of the fact list in the key-value store.
pub const FACTS_KEY: &str = "facts";

/// The three collections, without any I/O.
#[derive(Debug, Clone, Default)]
pub(crate) struct GraphState {
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub(crate) relationships: Vec<Relationship>,
    pub(crate) facts: Vec<Fact>,
}

/// Embedded single-writer store of what the assistant knows about the user.
pub struct MemoryGraph<K: KvStore> {
    kv: K,
    clock: Arc<dyn Clock>,
    config: MemoryConfig,
    extractors: Vec<Box<dyn Extractor>>,
    state: Mutex<GraphState>,
}

impl<K: KvStore> MemoryGraph<K> {
    /// Load the graph from `kv` using wall-clock time.
    pub async fn load(kv: K, config: MemoryConfig) -> Self {
        Self::load_with_clock(kv, config, Arc::new(SystemClock)).await
    }

    /// Load the graph from `kv`, reading time from `clock`.
    ///
    /// Absent collections start empty. A collection that fails to read or
    /// decode is logged and also starts empty.
    #[tracing::instrument(name = "load_memory_graph", skip_all)]
    pub async fn load_with_clock(kv: K, config: MemoryConfig, clock: Arc<dyn Clock>) -> Self {
        let entities: BTreeMap<EntityId, Entity> = load_collection(&kv, ENTITIES_KEY).await;
        let relationships: Vec<Relationship> = load_collection(&kv, RELATIONSHIPS_KEY).await;
        let facts: Vec<Fact> = load_collection(&kv, FACTS_KEY).await;

        tracing::debug!(
            entities = entities.len(),
            relationships = relationships.len(),
            facts = facts.len(),
            "Loaded memory graph"
        );

        Self {
            kv,
            clock,
            config,
            extractors: default_extractors(),
            state: Mutex::new(GraphState {
                entities,
                relationships,
                facts,
            }),
        }
    }

    /// Replace the extraction strategies run by `extract_from_text`.
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn Extractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn extractors(&self) -> &[Box<dyn Extractor>] {
        &self.extractors
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, GraphState> {
        self.state.lock().await
    }

    /// Aggregate counts, including relationships past their absolute-age cutoff.
    pub async fn stats(&self) -> MemoryStats {
        let state = self.lock().await;
        let now = self.clock.now();
        MemoryStats {
            entity_count: state.entities.len(),
            relationship_count: state.relationships.len(),
            fact_count: state.facts.len(),
            stale_relationship_count: state
                .relationships
                .iter()
                .filter(|r| r.is_stale_at(now))
                .count(),
        }
    }

    /// Wipe all three collections and persist the empty state.
    pub async fn clear(&self) {
        let mut state = self.lock().await;
        *state = GraphState::default();
        tracing::info!("Cleared memory graph");
        self.persist(&state).await;
    }

    /// Flush all collections. Failures are logged, never returned.
    pub(crate) async fn persist(&self, state: &GraphState) {
        if let Err(e) = self.write_through(state).await {
            tracing::warn!(
                error = %e,
                "Failed to persist memory graph; keeping in-memory state"
            );
        }
    }

    async fn write_through(&self, state: &GraphState) -> Result<(), MemoryError> {
        let entities = serde_json::to_value(&state.entities)?;
        let relationships = serde_json::to_value(&state.relationships)?;
        let facts = serde_json::to_value(&state.facts)?;

        self.kv.set(ENTITIES_KEY, &entities).await?;
        self.kv.set(RELATIONSHIPS_KEY, &relationships).await?;
        self.kv.set(FACTS_KEY, &facts).await?;
        Ok(())
    }
}

async fn load_collection<K: KvStore, T: DeserializeOwned + Default>(kv: &K, key: &str) -> T {
    match kv.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to decode persisted collection; starting empty");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted collection; starting empty");
            T::default()
        }
    }
}
