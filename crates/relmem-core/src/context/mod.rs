//! Renders what the graph knows about the user for a language-model prompt.
//!
//! Relationships are filtered by absolute-age staleness; facts by confidence
//! decay. Each relationship type maps to a verb phrase through
//! [`verb_phrase`], falling back to the raw type name.

use std::cmp::Ordering;

use serde::Serialize;

use relmem_types::entity::{Entity, EntityId, SELF_ENTITY_NAME};
use relmem_types::fact::Fact;
use relmem_types::relationship::{Relationship, RelationshipQuery, kinds};

use crate::decay::Decayable;
use crate::graph::MemoryGraph;
use crate::storage::kv_store::KvStore;

/// A non-stale relationship of the user, resolved to the entity at its other end.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedEntity {
    pub relationship: Relationship,
    pub entity: Entity,
    /// True when the user is the `from` end.
    pub outgoing: bool,
    pub decayed_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceEntry {
    pub name: String,
    pub context: String,
    pub confidence: f64,
}

/// Everything the context string is built from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextSnapshot {
    /// The self entity, if it has been created yet.
    pub user: Option<Entity>,
    pub related: Vec<RelatedEntity>,
    pub facts: Vec<Fact>,
    pub preferences: Vec<PreferenceEntry>,
}

/// Human-readable verb phrase for a relationship type.
pub fn verb_phrase(rel_type: &str) -> &str {
    match rel_type {
        kinds::SPOUSE => "is married to",
        kinds::FAMILY => "is related to",
        kinds::FRIEND => "is friends with",
        kinds::WORKS_AT => "works at",
        kinds::LIVES_IN => "lives in",
        kinds::PREFERS => "prefers",
        kinds::INTERESTED_IN => "is interested in",
        kinds::PURCHASED => "purchased",
        kinds::RECENTLY_SEARCHED => "recently searched for",
        kinds::RECENTLY_VISITED => "recently visited",
        other => other,
    }
}

/// Types left out of "Known information" as too short-lived.
fn is_ephemeral(rel_type: &str) -> bool {
    rel_type == kinds::INTERESTED_IN || rel_type == kinds::RECENTLY_SEARCHED
}

impl ContextSnapshot {
    fn user_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(SELF_ENTITY_NAME)
    }

    fn describe(&self, related: &RelatedEntity) -> String {
        let verb = verb_phrase(&related.relationship.rel_type);
        if related.outgoing {
            format!("{} {verb} {}", self.user_name(), related.entity.name)
        } else {
            format!("{} {verb} {}", related.entity.name, self.user_name())
        }
    }

    /// Up to `limit` interests, most confident first, newest first on ties.
    pub fn recent_interests(&self, limit: usize) -> Vec<&RelatedEntity> {
        let mut interests: Vec<&RelatedEntity> = self
            .related
            .iter()
            .filter(|r| r.relationship.rel_type == kinds::INTERESTED_IN)
            .collect();
        interests.sort_by(|a, b| {
            b.decayed_confidence
                .partial_cmp(&a.decayed_confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.relationship.created.cmp(&a.relationship.created))
        });
        interests.truncate(limit);
        interests
    }

    /// Render the non-empty sections, separated by blank lines.
    pub fn render(&self, interest_limit: usize) -> String {
        let mut sections = Vec::with_capacity(4);

        let known: Vec<String> = self
            .related
            .iter()
            .filter(|r| !is_ephemeral(&r.relationship.rel_type))
            .map(|r| format!("- {}", self.describe(r)))
            .collect();
        if !known.is_empty() {
            sections.push(format!("Known information:\n{}", known.join("\n")));
        }

        let interests: Vec<String> = self
            .recent_interests(interest_limit)
            .into_iter()
            .map(|r| format!("- {}", r.entity.name))
            .collect();
        if !interests.is_empty() {
            sections.push(format!("Recent interests:\n{}", interests.join("\n")));
        }

        if !self.preferences.is_empty() {
            let lines: Vec<String> = self
                .preferences
                .iter()
                .map(|p| format!("- {} (context: {})", p.name, p.context))
                .collect();
            sections.push(format!("Preferences:\n{}", lines.join("\n")));
        }

        if !self.facts.is_empty() {
            let lines: Vec<String> = self
                .facts
                .iter()
                .map(|f| format!("- {}: {}", f.predicate, f.object))
                .collect();
            sections.push(format!("Facts:\n{}", lines.join("\n")));
        }

        sections.join("\n\n")
    }
}

impl<K: KvStore> MemoryGraph<K> {
    /// Gather the user's non-stale relationships, resolved entities, live
    /// facts and preferences. Read-only: no access metadata is bumped.
    pub async fn query_for_context(&self) -> ContextSnapshot {
        let state = self.lock().await;
        let now = self.clock().now();
        let me = EntityId::self_id();

        let related: Vec<RelatedEntity> = state
            .relationships_of(&me, &RelationshipQuery::default(), now)
            .into_iter()
            .filter_map(|relationship| {
                let entity = state.entities.get(relationship.other_end(&me))?.clone();
                Some(RelatedEntity {
                    outgoing: relationship.from == me,
                    decayed_confidence: relationship.decayed_confidence_at(now),
                    relationship,
                    entity,
                })
            })
            .collect();

        let preferences = related
            .iter()
            .filter(|r| r.relationship.rel_type == kinds::PREFERS)
            .map(|r| PreferenceEntry {
                name: r.entity.name.clone(),
                context: r
                    .relationship
                    .attributes
                    .get("context")
                    .or_else(|| r.entity.attributes.get("context"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("general")
                    .to_string(),
                confidence: r.decayed_confidence,
            })
            .collect();

        let threshold = self.config().decay_stale_threshold;
        let facts = state
            .facts_of(&me, None)
            .into_iter()
            .filter(|f| !f.is_stale_by_decay(now, threshold))
            .collect();

        ContextSnapshot {
            user: state.entities.get(&me).cloned(),
            related,
            facts,
            preferences,
        }
    }

    /// The context string for inclusion in a prompt. Empty when nothing is known.
    pub async fn context_for_ai(&self) -> String {
        self.query_for_context()
            .await
            .render(self.config().recent_interest_limit)
    }
}
