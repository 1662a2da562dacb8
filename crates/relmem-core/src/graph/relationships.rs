//! Relationship store operations.
//!
//! At most one relationship exists per `(from, to, type)`. Re-adding the
//! triple merges attributes in place and keeps the original id and
//! `created`, so re-confirmation never resets staleness. Confidence changes
//! on re-add only when the new attributes carry a `confidence` override.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use relmem_types::attr::{Attributes, merge_attributes, non_finite_key};
use relmem_types::entity::EntityId;
use relmem_types::relationship::{CONFIDENCE_ATTR, Relationship, RelationshipQuery, StalePolicy};

use super::{GraphState, MemoryGraph};
use crate::storage::kv_store::KvStore;

/// A finite numeric `confidence` attribute, clamped to [0, 1].
pub(crate) fn explicit_confidence(attributes: &Attributes) -> Option<f64> {
    attributes
        .get(CONFIDENCE_ATTR)
        .and_then(|v| v.as_f64())
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
}

/// Confidence from the `confidence` attribute if present, else `default`.
pub(crate) fn confidence_override(attributes: &Attributes, default: f64) -> f64 {
    explicit_confidence(attributes).unwrap_or(default)
}

impl GraphState {
    /// Create-or-merge by `(from, to, type)`. `None` if an endpoint is missing.
    pub(crate) fn upsert_relationship(
        &mut self,
        from: &EntityId,
        to: &EntityId,
        rel_type: &str,
        attributes: Attributes,
        default_confidence: f64,
        now: DateTime<Utc>,
    ) -> Option<Relationship> {
        if !self.entities.contains_key(from) || !self.entities.contains_key(to) {
            tracing::warn!(
                from = %from,
                to = %to,
                relationship_type = rel_type,
                "Cannot add relationship: endpoint entity does not exist"
            );
            return None;
        }
        if let Some(key) = non_finite_key(&attributes) {
            tracing::warn!(
                relationship_type = rel_type,
                attribute = key,
                "Cannot add relationship: attribute is not a finite number"
            );
            return None;
        }

        if let Some(existing) = self
            .relationships
            .iter_mut()
            .find(|r| &r.from == from && &r.to == to && r.rel_type == rel_type)
        {
            // Only an explicit override moves confidence, so confirmations survive.
            if let Some(confidence) = explicit_confidence(&attributes) {
                existing.confidence = confidence;
            }
            merge_attributes(&mut existing.attributes, attributes);
            existing.updated = now;
            tracing::debug!(relationship_id = %existing.id, relationship_type = rel_type, "Merged relationship");
            return Some(existing.clone());
        }

        let relationship = Relationship {
            id: Uuid::now_v7(),
            from: from.clone(),
            to: to.clone(),
            rel_type: rel_type.to_string(),
            confidence: confidence_override(&attributes, default_confidence),
            attributes,
            stale_after: StalePolicy::for_type(rel_type),
            created: now,
            updated: now,
            last_confirmed: None,
        };
        tracing::debug!(relationship_id = %relationship.id, relationship_type = rel_type, "Created relationship");
        self.relationships.push(relationship.clone());
        Some(relationship)
    }

    pub(crate) fn remove_relationship(&mut self, id: &Uuid) -> bool {
        let before = self.relationships.len();
        self.relationships.retain(|r| &r.id != id);
        self.relationships.len() != before
    }

    pub(crate) fn relationships_of(
        &self,
        entity: &EntityId,
        query: &RelationshipQuery,
        now: DateTime<Utc>,
    ) -> Vec<Relationship> {
        self.relationships
            .iter()
            .filter(|r| query.direction.matches(r, entity))
            .filter(|r| query.rel_type.as_deref().is_none_or(|t| r.rel_type == t))
            .filter(|r| query.include_stale || !r.is_stale_at(now))
            .cloned()
            .collect()
    }
}

impl<K: KvStore> MemoryGraph<K> {
    /// Create a relationship, or merge into the existing one for the same
    /// `(from, to, type)`.
    ///
    /// Returns `None` (logged as a warning) when either endpoint is missing
    /// or an attribute holds a NaN or infinite number. A numeric
    /// `confidence` attribute overrides the default confidence.
    pub async fn add_relationship(
        &self,
        from: &EntityId,
        to: &EntityId,
        rel_type: &str,
        attributes: Attributes,
    ) -> Option<Relationship> {
        let mut state = self.lock().await;
        let relationship = state.upsert_relationship(
            from,
            to,
            rel_type,
            attributes,
            self.config().default_confidence,
            self.clock().now(),
        )?;
        self.persist(&state).await;
        Some(relationship)
    }

    /// Relationships touching `entity`, filtered by type, direction and
    /// (unless `include_stale`) absolute-age staleness. Insertion order.
    pub async fn get_relationships(
        &self,
        entity: &EntityId,
        query: &RelationshipQuery,
    ) -> Vec<Relationship> {
        let state = self.lock().await;
        state.relationships_of(entity, query, self.clock().now())
    }

    /// Exact lookup by endpoints, optionally narrowed to one type.
    pub async fn get_relationship(
        &self,
        from: &EntityId,
        to: &EntityId,
        rel_type: Option<&str>,
    ) -> Option<Relationship> {
        let state = self.lock().await;
        state
            .relationships
            .iter()
            .find(|r| {
                &r.from == from && &r.to == to && rel_type.is_none_or(|t| r.rel_type == t)
            })
            .cloned()
    }

    /// Every relationship, stale or not, in insertion order.
    pub async fn all_relationships(&self) -> Vec<Relationship> {
        self.lock().await.relationships.clone()
    }

    /// Remove a relationship by id. Unknown ids are a no-op returning false.
    pub async fn remove_relationship(&self, id: &Uuid) -> bool {
        let mut state = self.lock().await;
        let removed = state.remove_relationship(id);
        if removed {
            self.persist(&state).await;
        }
        removed
    }

    /// Absolute-age staleness against the graph's clock.
    pub fn is_stale(&self, relationship: &Relationship) -> bool {
        relationship.is_stale_at(self.clock().now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use relmem_types::attr::{AttrValue, attrs};
    use relmem_types::entity::EntityType;
    use relmem_types::relationship::Direction;

    use super::*;
    use crate::graph::test_support::graph;

    async fn me_and(
        graph: &MemoryGraph<crate::storage::memory_kv::InMemoryKvStore>,
        entity_type: EntityType,
        name: &str,
    ) -> (EntityId, EntityId) {
        let me = graph.ensure_self_entity().await;
        let other = graph.add_entity(entity_type, name, Attributes::new()).await.unwrap();
        (me, other.id)
    }

    #[tokio::test]
    async fn test_relationship_uniqueness() {
        let (graph, clock) = graph().await;
        let (me, acme) = me_and(&graph, EntityType::Organization, "Acme").await;

        let first = graph
            .add_relationship(&me, &acme, "works_at", attrs([("role", "engineer")]))
            .await
            .unwrap();
        clock.advance(Duration::days(3));
        let second = graph
            .add_relationship(&me, &acme, "works_at", attrs([("role", "manager")]))
            .await
            .unwrap();

        let rels = graph.get_relationships(&me, &RelationshipQuery::default()).await;
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].id, first.id);
        assert_eq!(rels[0].created, first.created);
        assert_eq!(second.created, first.created);
        assert_eq!(rels[0].attributes.get("role"), Some(&AttrValue::from("manager")));
    }

    #[tokio::test]
    async fn test_missing_endpoint_returns_none() {
        let (graph, _clock) = graph().await;
        let me = graph.ensure_self_entity().await;
        let ghost = EntityId::from("person:ghost");
        assert!(graph.add_relationship(&me, &ghost, "friend", Attributes::new()).await.is_none());
        assert!(graph.add_relationship(&ghost, &me, "friend", Attributes::new()).await.is_none());
        assert!(graph.all_relationships().await.is_empty());
    }

    #[tokio::test]
    async fn test_confidence_default_and_override() {
        let (graph, _clock) = graph().await;
        let (me, acme) = me_and(&graph, EntityType::Organization, "Acme").await;
        let rel = graph.add_relationship(&me, &acme, "works_at", Attributes::new()).await.unwrap();
        assert_eq!(rel.confidence, 0.8);

        let (_, jane) = me_and(&graph, EntityType::Person, "Jane").await;
        let rel = graph
            .add_relationship(&me, &jane, "friend", attrs([("confidence", 0.95)]))
            .await
            .unwrap();
        assert_eq!(rel.confidence, 0.95);

        let rel = graph
            .add_relationship(&me, &jane, "friend", attrs([("confidence", 7.0)]))
            .await
            .unwrap();
        assert_eq!(rel.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_stale_excluded_unless_requested() {
        let (graph, clock) = graph().await;
        let (me, austin) = me_and(&graph, EntityType::Location, "Austin").await;
        let (_, jane) = me_and(&graph, EntityType::Person, "Jane").await;
        graph.add_relationship(&me, &austin, "lives_in", Attributes::new()).await.unwrap();
        graph.add_relationship(&me, &jane, "spouse", Attributes::new()).await.unwrap();

        clock.advance(Duration::days(10));
        assert_eq!(graph.get_relationships(&me, &RelationshipQuery::default()).await.len(), 2);

        clock.advance(Duration::days(390));
        let fresh = graph.get_relationships(&me, &RelationshipQuery::default()).await;
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].rel_type, "spouse");

        let all = graph
            .get_relationships(&me, &RelationshipQuery::default().include_stale(true))
            .await;
        assert_eq!(all.len(), 2);
        assert!(graph.is_stale(&all[0]));
        assert!(!graph.is_stale(&all[1]));
    }

    #[tokio::test]
    async fn test_readd_does_not_reset_staleness_clock() {
        let (graph, clock) = graph().await;
        let (me, coffee) = me_and(&graph, EntityType::Preference, "coffee").await;
        graph.add_relationship(&me, &coffee, "prefers", Attributes::new()).await.unwrap();

        clock.advance(Duration::days(89));
        graph.add_relationship(&me, &coffee, "prefers", Attributes::new()).await.unwrap();
        clock.advance(Duration::days(2));

        let rel = graph.get_relationship(&me, &coffee, Some("prefers")).await.unwrap();
        assert!(graph.is_stale(&rel));
    }

    #[tokio::test]
    async fn test_type_and_direction_filters() {
        let (graph, _clock) = graph().await;
        let (me, acme) = me_and(&graph, EntityType::Organization, "Acme").await;
        let (_, jane) = me_and(&graph, EntityType::Person, "Jane").await;
        graph.add_relationship(&me, &acme, "works_at", Attributes::new()).await.unwrap();
        graph.add_relationship(&jane, &me, "friend", Attributes::new()).await.unwrap();

        let works = graph
            .get_relationships(&me, &RelationshipQuery::of_type("works_at"))
            .await;
        assert_eq!(works.len(), 1);

        let outgoing = graph
            .get_relationships(&me, &RelationshipQuery::default().direction(Direction::Outgoing))
            .await;
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to, acme);

        let incoming = graph
            .get_relationships(&me, &RelationshipQuery::default().direction(Direction::Incoming))
            .await;
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from, jane);
    }

    #[tokio::test]
    async fn test_get_relationship_exact() {
        let (graph, _clock) = graph().await;
        let (me, acme) = me_and(&graph, EntityType::Organization, "Acme").await;
        graph.add_relationship(&me, &acme, "works_at", Attributes::new()).await.unwrap();

        assert!(graph.get_relationship(&me, &acme, None).await.is_some());
        assert!(graph.get_relationship(&me, &acme, Some("works_at")).await.is_some());
        assert!(graph.get_relationship(&me, &acme, Some("purchased")).await.is_none());
        assert!(graph.get_relationship(&acme, &me, None).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_relationship() {
        let (graph, _clock) = graph().await;
        let (me, acme) = me_and(&graph, EntityType::Organization, "Acme").await;
        let rel = graph.add_relationship(&me, &acme, "works_at", Attributes::new()).await.unwrap();

        assert!(graph.remove_relationship(&rel.id).await);
        assert!(!graph.remove_relationship(&rel.id).await);
        assert!(graph.all_relationships().await.is_empty());
    }

    #[tokio::test]
    async fn test_readd_without_override_keeps_confidence() {
        let (graph, _clock) = graph().await;
        let (me, acme) = me_and(&graph, EntityType::Organization, "Acme").await;
        let rel = graph.add_relationship(&me, &acme, "works_at", Attributes::new()).await.unwrap();
        graph.confirm_relationship(&rel.id).await.unwrap();

        let readded = graph
            .add_relationship(&me, &acme, "works_at", attrs([("role", "engineer")]))
            .await
            .unwrap();
        assert!((readded.confidence - 0.9).abs() < 1e-12);

        let lowered = graph
            .add_relationship(&me, &acme, "works_at", attrs([("confidence", 0.5)]))
            .await
            .unwrap();
        assert_eq!(lowered.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_non_finite_attributes_are_refused() {
        let (graph, _clock) = graph().await;
        let (me, jane) = me_and(&graph, EntityType::Person, "Jane").await;
        assert!(graph
            .add_relationship(&me, &jane, "friend", attrs([("since", f64::NAN)]))
            .await
            .is_none());
        assert!(graph.all_relationships().await.is_empty());

        let rel = graph
            .add_relationship(&me, &jane, "friend", attrs([("confidence", f64::INFINITY)]))
            .await;
        assert!(rel.is_none());
    }
}
