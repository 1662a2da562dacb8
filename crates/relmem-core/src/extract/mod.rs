//! Pattern-based extraction of entities, relationships and facts from text.
//!
//! Extraction is split into independent [`Extractor`] strategies. Each one is
//! a pure function from text to [`Proposal`]s; the graph then applies every
//! proposal through the normal store operations, so repeated mentions merge
//! instead of duplicating. A strategy that finds nothing (or whose pattern
//! failed to compile) simply contributes no proposals.

pub mod gazetteer;
pub mod patterns;

use chrono::{DateTime, Utc};

use relmem_types::attr::{AttrValue, Attributes};
use relmem_types::entity::{Entity, EntityId, EntityType};
use relmem_types::fact::{Fact, SOURCE_ATTR};
use relmem_types::relationship::Relationship;

use crate::graph::MemoryGraph;
use crate::storage::kv_store::KvStore;

pub use patterns::{
    EmploymentExtractor, GazetteerExtractor, PreferenceExtractor, RelationNameExtractor,
    ResidenceExtractor, SearchInterestExtractor,
};

/// Provenance recorded on facts created by extraction.
pub const EXTRACTION_SOURCE: &str = "extraction";

/// Caller-supplied hints for one extraction pass.
#[derive(Debug, Clone)]
pub struct ExtractionContext<'a> {
    /// Topic label attached to extracted preferences; `"general"` when absent.
    pub topic: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl ExtractionContext<'_> {
    pub fn topic_or_general(&self) -> &str {
        self.topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("general")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposedEntity {
    pub entity_type: EntityType,
    pub name: String,
    pub attributes: Attributes,
}

/// A relationship from the self entity to the proposed entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedRelationship {
    pub rel_type: String,
    pub attributes: Attributes,
}

/// A fact about the self entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedFact {
    pub predicate: String,
    pub object: String,
}

/// One unit of extracted knowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub entity: ProposedEntity,
    pub relationship: Option<ProposedRelationship>,
    pub facts: Vec<ProposedFact>,
}

impl Proposal {
    pub fn entity(entity_type: EntityType, name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            entity: ProposedEntity {
                entity_type,
                name: name.into(),
                attributes,
            },
            relationship: None,
            facts: Vec::new(),
        }
    }

    pub fn related_by(mut self, rel_type: &str, attributes: Attributes) -> Self {
        self.relationship = Some(ProposedRelationship {
            rel_type: rel_type.to_string(),
            attributes,
        });
        self
    }

    pub fn with_fact(mut self, predicate: impl Into<String>, object: impl Into<String>) -> Self {
        self.facts.push(ProposedFact {
            predicate: predicate.into(),
            object: object.into(),
        });
        self
    }
}

/// A single extraction strategy.
pub trait Extractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn extract(&self, text: &str, ctx: &ExtractionContext<'_>) -> Vec<Proposal>;
}

/// The built-in strategies, in the order they run.
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(RelationNameExtractor),
        Box::new(PreferenceExtractor),
        Box::new(ResidenceExtractor),
        Box::new(EmploymentExtractor),
        Box::new(SearchInterestExtractor),
        Box::new(GazetteerExtractor),
    ]
}

/// Records touched by one extraction pass, each listed once in its final state.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub facts: Vec<Fact>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty() && self.facts.is_empty()
    }

    fn record_entity(&mut self, entity: Entity) {
        replace_or_push(&mut self.entities, entity, |a, b| a.id == b.id);
    }

    fn record_relationship(&mut self, relationship: Relationship) {
        replace_or_push(&mut self.relationships, relationship, |a, b| a.id == b.id);
    }

    fn record_fact(&mut self, fact: Fact) {
        replace_or_push(&mut self.facts, fact, |a, b| a.id == b.id);
    }
}

fn replace_or_push<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

impl<K: KvStore> MemoryGraph<K> {
    /// Run every extractor over `text` and apply the proposals to the graph.
    ///
    /// The self entity is created first if needed. Proposals are applied
    /// independently: one that cannot be stored is logged and skipped. All
    /// changes are flushed once at the end.
    #[tracing::instrument(name = "extract_from_text", skip(self, text), fields(text_len = text.len()))]
    pub async fn extract_from_text(&self, text: &str, topic: Option<&str>) -> ExtractionResult {
        let mut state = self.lock().await;
        let now = self.clock().now();
        let default_confidence = self.config().default_confidence;
        let ctx = ExtractionContext { topic, now };

        let had_self = state.entities.contains_key(&EntityId::self_id());
        let me = state.ensure_self(now);

        let mut result = ExtractionResult::default();
        let mut fact_attrs = Attributes::new();
        fact_attrs.insert(SOURCE_ATTR.to_string(), AttrValue::from(EXTRACTION_SOURCE));

        for extractor in self.extractors() {
            let proposals = extractor.extract(text, &ctx);
            if !proposals.is_empty() {
                tracing::debug!(extractor = extractor.name(), proposals = proposals.len(), "Extractor matched");
            }

            for proposal in proposals {
                let ProposedEntity {
                    entity_type,
                    name,
                    attributes,
                } = proposal.entity;

                let entity = match state.upsert_entity(entity_type, &name, attributes, now) {
                    Ok(entity) => entity,
                    Err(e) => {
                        tracing::debug!(extractor = extractor.name(), error = %e, "Skipping proposal");
                        continue;
                    }
                };

                if let Some(rel) = proposal.relationship {
                    if let Some(relationship) = state.upsert_relationship(
                        &me,
                        &entity.id,
                        &rel.rel_type,
                        rel.attributes,
                        default_confidence,
                        now,
                    ) {
                        result.record_relationship(relationship);
                    }
                }

                for fact in proposal.facts {
                    let fact = state.upsert_fact(
                        &me,
                        &fact.predicate,
                        &fact.object,
                        &fact_attrs,
                        default_confidence,
                        now,
                    );
                    result.record_fact(fact);
                }

                result.record_entity(entity);
            }
        }

        if !had_self || !result.is_empty() {
            self.persist(&state).await;
        }

        tracing::debug!(
            entities = result.entities.len(),
            relationships = result.relationships.len(),
            facts = result.facts.len(),
            "Extraction complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use relmem_types::entity::EntityQuery;
    use relmem_types::relationship::RelationshipQuery;

    use super::*;
    use crate::graph::test_support::graph;

    struct Broken;

    impl Extractor for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn extract(&self, _text: &str, _ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
            vec![Proposal::entity(EntityType::Person, "   ", Attributes::new())
                .related_by("friend", Attributes::new())]
        }
    }

    #[tokio::test]
    async fn test_i_live_in_austin_end_to_end() {
        let (graph, _clock) = graph().await;
        graph.extract_from_text("I live in Austin", None).await;

        let austin = graph
            .find_entities(&EntityQuery::by_type(EntityType::Location).with_name("Austin"))
            .await;
        assert_eq!(austin.len(), 1);

        let lives_in = graph
            .get_relationships(&EntityId::self_id(), &RelationshipQuery::of_type("lives_in"))
            .await;
        assert_eq!(lives_in.len(), 1);
        assert_eq!(lives_in[0].to, austin[0].id);

        let home = graph.get_facts(&EntityId::self_id(), Some("home_location")).await;
        assert_eq!(home[0].object, "Austin");
        assert_eq!(home[0].source, EXTRACTION_SOURCE);
    }

    #[tokio::test]
    async fn test_repeated_mentions_do_not_duplicate() {
        let (graph, clock) = graph().await;
        graph.extract_from_text("My wife's name is Jane. I work at Acme.", None).await;
        clock.advance(Duration::days(1));
        graph.extract_from_text("my wife is Jane and I work for Acme", None).await;

        let stats = graph.stats().await;
        // self, Jane, Acme
        assert_eq!(stats.entity_count, 3);
        assert_eq!(stats.relationship_count, 2);
        // spouse_name, employer
        assert_eq!(stats.fact_count, 2);
    }

    #[tokio::test]
    async fn test_reobservation_keeps_confirmed_confidence() {
        let (graph, _clock) = graph().await;
        let me = EntityId::self_id();
        graph.extract_from_text("I work at Acme", None).await;
        let acme = EntityId::derive(EntityType::Organization, "Acme");
        let works_at = graph.get_relationship(&me, &acme, Some("works_at")).await.unwrap();

        let confirmed = graph.confirm_relationship(&works_at.id).await.unwrap();
        graph.confirm_fact(&me, "employer").await.unwrap();
        assert!((confirmed.confidence - 0.9).abs() < 1e-12);

        graph.extract_from_text("I work at Acme", None).await;
        let again = graph.get_relationship(&me, &acme, Some("works_at")).await.unwrap();
        assert!((again.confidence - 0.9).abs() < 1e-12);
        let employer = graph.get_facts(&me, Some("employer")).await;
        assert!((employer[0].confidence - 0.9).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_result_lists_each_record_once() {
        let (graph, _clock) = graph().await;
        let result = graph.extract_from_text("I live in Austin", None).await;

        // Residence and gazetteer both propose Austin.
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.relationships.len(), 2);
        assert_eq!(result.facts.len(), 1);
    }

    #[tokio::test]
    async fn test_self_entity_exists_after_any_extraction() {
        let (graph, _clock) = graph().await;
        let result = graph.extract_from_text("nothing to see here", None).await;
        assert!(result.is_empty());

        let me = graph.get_entity(&EntityId::self_id()).await.unwrap();
        assert_eq!(me.name, "User");
        assert_eq!(me.attributes.get("is_self"), Some(&AttrValue::Bool(true)));
    }

    #[tokio::test]
    async fn test_failing_proposal_does_not_block_others() {
        let (graph, _clock) = graph().await;
        let mut extractors: Vec<Box<dyn Extractor>> = vec![Box::new(Broken)];
        extractors.extend(default_extractors());
        let graph = graph.with_extractors(extractors);

        let result = graph.extract_from_text("I work at Globex", None).await;
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].name, "Globex");
    }

    #[tokio::test]
    async fn test_preference_uses_topic() {
        let (graph, _clock) = graph().await;
        graph.extract_from_text("I love espresso", Some("coffee")).await;

        let prefs = graph
            .get_relationships(&EntityId::self_id(), &RelationshipQuery::of_type("prefers"))
            .await;
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].attributes.get("context"), Some(&AttrValue::from("coffee")));
    }
}
