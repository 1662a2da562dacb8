//! Entity store operations.
//!
//! Entities are keyed by an id derived from `(type, normalized name)`, so
//! re-adding the same pair merges into the existing record instead of
//! creating a second one. Deleting an entity cascades to every relationship
//! touching it and every fact about it.

use chrono::{DateTime, Utc};

use relmem_types::attr::{AttrValue, Attributes, merge_attributes, non_finite_key};
use relmem_types::entity::{
    Entity, EntityId, EntityQuery, EntityType, SELF_ENTITY_ID, SELF_ENTITY_NAME,
};
use relmem_types::error::MemoryError;

use super::{GraphState, MemoryGraph};
use crate::storage::kv_store::KvStore;

/// What a cascading delete removed besides the entity itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub relationships_removed: usize,
    pub facts_removed: usize,
}

/// Reject attribute maps that could not be persisted as JSON.
pub(crate) fn check_finite(attributes: &Attributes) -> Result<(), MemoryError> {
    match non_finite_key(attributes) {
        Some(key) => Err(MemoryError::InvalidArgument(format!(
            "attribute '{key}' is not a finite number"
        ))),
        None => Ok(()),
    }
}

impl GraphState {
    /// Create-or-merge by derived id.
    pub(crate) fn upsert_entity(
        &mut self,
        entity_type: EntityType,
        name: &str,
        attributes: Attributes,
        now: DateTime<Utc>,
    ) -> Result<Entity, MemoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MemoryError::InvalidArgument(
                "entity name cannot be empty".to_string(),
            ));
        }
        check_finite(&attributes)?;

        let id = EntityId::derive(entity_type, name);
        if let Some(existing) = self.entities.get_mut(&id) {
            merge_attributes(&mut existing.attributes, attributes);
            existing.updated = now;
            existing.access_count += 1;
            tracing::debug!(entity_id = %id, "Merged entity");
            return Ok(existing.clone());
        }

        let entity = Entity::new(entity_type, name, attributes, now);
        tracing::debug!(entity_id = %entity.id, "Created entity");
        self.entities.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    /// Create the self entity if missing. Returns its id.
    pub(crate) fn ensure_self(&mut self, now: DateTime<Utc>) -> EntityId {
        let id = EntityId::self_id();
        self.entities.entry(id.clone()).or_insert_with(|| {
            tracing::debug!("Created self entity");
            let mut attributes = Attributes::new();
            attributes.insert("is_self".to_string(), AttrValue::Bool(true));
            Entity {
                id: EntityId::from(SELF_ENTITY_ID),
                entity_type: EntityType::Person,
                name: SELF_ENTITY_NAME.to_string(),
                attributes,
                created: now,
                updated: now,
                access_count: 0,
                last_accessed: None,
            }
        });
        id
    }

    pub(crate) fn touch_entity(&mut self, id: &EntityId, now: DateTime<Utc>) -> Option<Entity> {
        let entity = self.entities.get_mut(id)?;
        entity.access_count += 1;
        entity.last_accessed = Some(now);
        Some(entity.clone())
    }

    pub(crate) fn update_entity(
        &mut self,
        id: &EntityId,
        attributes: Attributes,
        now: DateTime<Utc>,
    ) -> Result<Option<Entity>, MemoryError> {
        check_finite(&attributes)?;
        let Some(entity) = self.entities.get_mut(id) else {
            return Ok(None);
        };
        merge_attributes(&mut entity.attributes, attributes);
        entity.updated = now;
        Ok(Some(entity.clone()))
    }

    /// Remove an entity and everything referencing it.
    pub(crate) fn remove_entity(&mut self, id: &EntityId) -> Option<CascadeReport> {
        self.entities.remove(id)?;

        let rel_before = self.relationships.len();
        self.relationships.retain(|r| !r.touches(id));
        let fact_before = self.facts.len();
        self.facts.retain(|f| &f.subject != id);

        Some(CascadeReport {
            relationships_removed: rel_before - self.relationships.len(),
            facts_removed: fact_before - self.facts.len(),
        })
    }
}

impl<K: KvStore> MemoryGraph<K> {
    /// Create an entity, or merge `attributes` into the existing one with the
    /// same `(type, normalized name)`.
    ///
    /// On merge `created` is kept, `updated` is bumped and `access_count`
    /// goes up by one. Fails only for an empty name.
    pub async fn add_entity(
        &self,
        entity_type: EntityType,
        name: &str,
        attributes: Attributes,
    ) -> Result<Entity, MemoryError> {
        let mut state = self.lock().await;
        let entity = state.upsert_entity(entity_type, name, attributes, self.clock().now())?;
        self.persist(&state).await;
        Ok(entity)
    }

    /// Look up an entity by id, bumping its access metadata.
    pub async fn get_entity(&self, id: &EntityId) -> Option<Entity> {
        let mut state = self.lock().await;
        let entity = state.touch_entity(id, self.clock().now())?;
        self.persist(&state).await;
        Some(entity)
    }

    /// Shallow-merge `attributes` into an existing entity.
    ///
    /// `Ok(None)` when the id is unknown.
    pub async fn update_entity(
        &self,
        id: &EntityId,
        attributes: Attributes,
    ) -> Result<Option<Entity>, MemoryError> {
        let mut state = self.lock().await;
        let updated = state.update_entity(id, attributes, self.clock().now())?;
        if updated.is_some() {
            self.persist(&state).await;
        }
        Ok(updated)
    }

    /// Entities matching every set field of `query`, ordered by id.
    pub async fn find_entities(&self, query: &EntityQuery) -> Vec<Entity> {
        let state = self.lock().await;
        state
            .entities
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect()
    }

    /// All entities, ordered by id. Does not bump access metadata.
    pub async fn list_entities(&self) -> Vec<Entity> {
        let state = self.lock().await;
        state.entities.values().cloned().collect()
    }

    /// Delete an entity and cascade to its relationships and facts.
    ///
    /// Returns `None` (and does nothing) when the id is unknown.
    pub async fn delete_entity(&self, id: &EntityId) -> Option<CascadeReport> {
        let mut state = self.lock().await;
        let report = state.remove_entity(id)?;
        tracing::info!(
            entity_id = %id,
            relationships_removed = report.relationships_removed,
            facts_removed = report.facts_removed,
            "Deleted entity"
        );
        self.persist(&state).await;
        Some(report)
    }

    /// Id of the self entity, creating it on first need.
    pub async fn ensure_self_entity(&self) -> EntityId {
        let mut state = self.lock().await;
        if state.entities.contains_key(&EntityId::self_id()) {
            return EntityId::self_id();
        }
        let id = state.ensure_self(self.clock().now());
        self.persist(&state).await;
        id
    }
}
