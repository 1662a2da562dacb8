//! Fact store operations.
//!
//! One fact per `(subject, predicate)`: the latest write replaces object and
//! confidence while id and `created` survive. Writing the same object again
//! without a `confidence` override keeps the current confidence, so a
//! confirmed fact is not knocked back when it is observed again.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use relmem_types::attr::Attributes;
use relmem_types::entity::EntityId;
use relmem_types::fact::{DEFAULT_SOURCE, Fact, SOURCE_ATTR};

use super::relationships::{confidence_override, explicit_confidence};
use super::{GraphState, MemoryGraph};
use crate::storage::kv_store::KvStore;

impl GraphState {
    pub(crate) fn upsert_fact(
        &mut self,
        subject: &EntityId,
        predicate: &str,
        object: &str,
        attributes: &Attributes,
        default_confidence: f64,
        now: DateTime<Utc>,
    ) -> Fact {
        let source = attributes
            .get(SOURCE_ATTR)
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_SOURCE)
            .to_string();

        if let Some(existing) = self
            .facts
            .iter_mut()
            .find(|f| &f.subject == subject && f.predicate == predicate)
        {
            if let Some(confidence) = explicit_confidence(attributes) {
                existing.confidence = confidence;
            } else if existing.object != object {
                existing.confidence = default_confidence;
            }
            existing.object = object.to_string();
            existing.source = source;
            existing.updated = now;
            return existing.clone();
        }

        let fact = Fact {
            id: Uuid::now_v7(),
            subject: subject.clone(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            confidence: confidence_override(attributes, default_confidence),
            source,
            created: now,
            updated: now,
            last_confirmed: None,
        };
        self.facts.push(fact.clone());
        fact
    }

    pub(crate) fn facts_of(&self, subject: &EntityId, predicate: Option<&str>) -> Vec<Fact> {
        self.facts
            .iter()
            .filter(|f| &f.subject == subject)
            .filter(|f| predicate.is_none_or(|p| f.predicate == p))
            .cloned()
            .collect()
    }
}

impl<K: KvStore> MemoryGraph<K> {
    /// Create a fact, or replace the object of the existing
    /// `(subject, predicate)` fact.
    ///
    /// `attributes` may carry a numeric `confidence` and a text `source`.
    pub async fn add_fact(
        &self,
        subject: &EntityId,
        predicate: &str,
        object: &str,
        attributes: Attributes,
    ) -> Fact {
        let mut state = self.lock().await;
        let fact = state.upsert_fact(
            subject,
            predicate,
            object,
            &attributes,
            self.config().default_confidence,
            self.clock().now(),
        );
        self.persist(&state).await;
        fact
    }

    /// Facts about `subject`, optionally narrowed to one predicate.
    pub async fn get_facts(&self, subject: &EntityId, predicate: Option<&str>) -> Vec<Fact> {
        self.lock().await.facts_of(subject, predicate)
    }

    /// Remove a fact by id. Unknown ids are a no-op returning false.
    pub async fn remove_fact(&self, id: &Uuid) -> bool {
        let mut state = self.lock().await;
        let before = state.facts.len();
        state.facts.retain(|f| &f.id != id);
        let removed = state.facts.len() != before;
        if removed {
            self.persist(&state).await;
        }
        removed
    }
}
