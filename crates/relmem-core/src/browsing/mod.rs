//! Browsing memory: pages the user visited and searches they ran.
//!
//! A visit is a `url` entity named by the normalized URL, carrying its title,
//! domain and a visit counter, and linked from the user by
//! `recently_visited`. A search is a preference entity linked by
//! `recently_searched`. Both link types go stale within days, so a visit or
//! search seen again after its link aged out starts a fresh link.

use chrono::{DateTime, Utc};
use url::Url;

use relmem_types::attr::{AttrValue, Attributes};
use relmem_types::entity::{Entity, EntityId, EntityType};
use relmem_types::error::MemoryError;
use relmem_types::relationship::{Relationship, kinds};

use crate::graph::{GraphState, MemoryGraph};
use crate::storage::kv_store::KvStore;

pub const TITLE_ATTR: &str = "title";
pub const DOMAIN_ATTR: &str = "domain";
pub const VISIT_COUNT_ATTR: &str = "visit_count";
pub const FIRST_VISIT_ATTR: &str = "first_visit";
pub const LAST_VISIT_ATTR: &str = "last_visit";

/// `category` attribute of entities created by [`MemoryGraph::record_search`].
pub const SEARCH_QUERY_CATEGORY: &str = "search_query";

/// Times a page was visited, 0 for entities without a counter.
pub fn visit_count(entity: &Entity) -> u64 {
    entity
        .attributes
        .get(VISIT_COUNT_ATTR)
        .and_then(AttrValue::as_f64)
        .map(|n| n.max(0.0) as u64)
        .unwrap_or(0)
}

/// Time of the most recent visit, falling back to `updated`.
pub fn last_visit(entity: &Entity) -> DateTime<Utc> {
    entity
        .attributes
        .get(LAST_VISIT_ATTR)
        .and_then(AttrValue::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(entity.updated)
}

fn parse_url(raw: &str) -> Result<Url, MemoryError> {
    Url::parse(raw.trim())
        .map_err(|e| MemoryError::InvalidArgument(format!("invalid URL '{raw}': {e}")))
}

impl GraphState {
    /// Link the user to `target`, replacing a link of the same type that has
    /// already gone stale.
    fn refresh_link(
        &mut self,
        me: &EntityId,
        target: &EntityId,
        rel_type: &str,
        attributes: Attributes,
        default_confidence: f64,
        now: DateTime<Utc>,
    ) -> Option<Relationship> {
        let expired = self
            .relationships
            .iter()
            .find(|r| &r.from == me && &r.to == target && r.rel_type == rel_type)
            .filter(|r| r.is_stale_at(now))
            .map(|r| r.id);
        if let Some(id) = expired {
            self.remove_relationship(&id);
        }
        self.upsert_relationship(me, target, rel_type, attributes, default_confidence, now)
    }
}

impl<K: KvStore> MemoryGraph<K> {
    /// Remember a page visit.
    ///
    /// Creates or updates the page's `url` entity, bumping its visit counter,
    /// and links the user to it by `recently_visited`. Fails for a string
    /// that is not an absolute URL.
    #[tracing::instrument(name = "record_visit", skip(self, title))]
    pub async fn record_visit(&self, url: &str, title: Option<&str>) -> Result<Entity, MemoryError> {
        let parsed = parse_url(url)?;
        let domain = parsed.host_str().map(str::to_lowercase).unwrap_or_default();

        let mut state = self.lock().await;
        let now = self.clock().now();
        let id = EntityId::derive(EntityType::Url, parsed.as_str());
        let previous = state.entities.get(&id).map(visit_count).unwrap_or(0);

        let mut attributes = Attributes::new();
        attributes.insert(DOMAIN_ATTR.to_string(), AttrValue::from(domain));
        attributes.insert(
            VISIT_COUNT_ATTR.to_string(),
            AttrValue::Number((previous + 1) as f64),
        );
        attributes.insert(LAST_VISIT_ATTR.to_string(), AttrValue::from(now.to_rfc3339()));
        if previous == 0 {
            attributes.insert(FIRST_VISIT_ATTR.to_string(), AttrValue::from(now.to_rfc3339()));
        }
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            attributes.insert(TITLE_ATTR.to_string(), AttrValue::from(title));
        }

        let page = state.upsert_entity(EntityType::Url, parsed.as_str(), attributes, now)?;
        let me = state.ensure_self(now);
        state.refresh_link(
            &me,
            &page.id,
            kinds::RECENTLY_VISITED,
            Attributes::new(),
            self.config().default_confidence,
            now,
        );
        self.persist(&state).await;

        tracing::debug!(entity_id = %page.id, visits = previous + 1, "Recorded visit");
        Ok(page)
    }

    /// Remember a search the user ran.
    ///
    /// The query (whitespace collapsed) becomes a preference entity with
    /// category `search_query`, linked by `recently_searched` with the query
    /// text and timestamp. Fails for an empty query.
    #[tracing::instrument(name = "record_search", skip(self, query))]
    pub async fn record_search(&self, query: &str) -> Result<Entity, MemoryError> {
        let query = query.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut state = self.lock().await;
        let now = self.clock().now();

        let mut attributes = Attributes::new();
        attributes.insert("category".to_string(), AttrValue::from(SEARCH_QUERY_CATEGORY));
        let entity = state.upsert_entity(EntityType::Preference, &query, attributes, now)?;

        let mut link = Attributes::new();
        link.insert("query".to_string(), AttrValue::from(query.as_str()));
        link.insert("timestamp".to_string(), AttrValue::from(now.to_rfc3339()));

        let me = state.ensure_self(now);
        state.refresh_link(
            &me,
            &entity.id,
            kinds::RECENTLY_SEARCHED,
            link,
            self.config().default_confidence,
            now,
        );
        self.persist(&state).await;
        Ok(entity)
    }

    /// Visited pages, most recent visit first.
    pub async fn recent_visits(&self, limit: usize) -> Vec<Entity> {
        let state = self.lock().await;
        let mut pages: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| e.entity_type == EntityType::Url)
            .cloned()
            .collect();
        pages.sort_by_key(|p| std::cmp::Reverse(last_visit(p)));
        pages.truncate(limit);
        pages
    }

    /// Visited pages whose URL or title contains any of the query's words,
    /// most visited first, ties broken by most recent visit.
    pub async fn search_visits(&self, query: &str, limit: usize) -> Vec<Entity> {
        let keywords: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        let state = self.lock().await;
        let mut hits: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| e.entity_type == EntityType::Url)
            .filter(|e| {
                let url = e.name.to_lowercase();
                let title = e
                    .attributes
                    .get(TITLE_ATTR)
                    .and_then(AttrValue::as_str)
                    .map(str::to_lowercase)
                    .unwrap_or_default();
                keywords
                    .iter()
                    .any(|k| url.contains(k.as_str()) || title.contains(k.as_str()))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            visit_count(b)
                .cmp(&visit_count(a))
                .then_with(|| last_visit(b).cmp(&last_visit(a)))
        });
        hits.truncate(limit);
        hits
    }

    /// Forget a visited page and its links. False if it was never visited
    /// or `url` does not parse.
    pub async fn forget_visit(&self, url: &str) -> bool {
        let Ok(parsed) = parse_url(url) else {
            return false;
        };
        let id = EntityId::derive(EntityType::Url, parsed.as_str());
        self.delete_entity(&id).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use relmem_types::relationship::RelationshipQuery;

    use super::*;
    use crate::clock::Clock;
    use crate::graph::test_support::graph;

    #[tokio::test]
    async fn test_repeat_visits_count_up() {
        let (graph, clock) = graph().await;
        let first = graph
            .record_visit("https://Example.com/docs", Some("Docs"))
            .await
            .unwrap();
        clock.advance(Duration::hours(2));
        let second = graph
            .record_visit("https://example.com/docs", Some("Docs v2"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(visit_count(&second), 2);
        assert_eq!(second.attributes.get(DOMAIN_ATTR), Some(&AttrValue::from("example.com")));
        assert_eq!(second.attributes.get(TITLE_ATTR), Some(&AttrValue::from("Docs v2")));
        assert_eq!(
            second.attributes.get(FIRST_VISIT_ATTR),
            first.attributes.get(FIRST_VISIT_ATTR)
        );
        assert_eq!(last_visit(&second), clock.now());

        let visited = graph
            .get_relationships(
                &EntityId::self_id(),
                &RelationshipQuery::of_type(kinds::RECENTLY_VISITED),
            )
            .await;
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].to, first.id);
        assert_eq!(graph.stats().await.entity_count, 2);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let (graph, _clock) = graph().await;
        let err = graph.record_visit("not a url", None).await.unwrap_err();
        assert!(matches!(err, MemoryError::InvalidArgument(_)));
        assert_eq!(graph.stats().await.entity_count, 0);
    }

    #[tokio::test]
    async fn test_visit_after_link_aged_out_starts_fresh_link() {
        let (graph, clock) = graph().await;
        graph.record_visit("https://example.com/", None).await.unwrap();
        let me = EntityId::self_id();
        let all = RelationshipQuery::of_type(kinds::RECENTLY_VISITED).include_stale(true);
        let original = graph.get_relationships(&me, &all).await.remove(0);

        // Within the 24h window the link keeps its creation time.
        clock.advance(Duration::hours(12));
        graph.record_visit("https://example.com/", None).await.unwrap();
        let same = graph.get_relationships(&me, &all).await;
        assert_eq!(same.len(), 1);
        assert_eq!(same[0].created, original.created);

        clock.advance(Duration::days(2));
        graph.record_visit("https://example.com/", None).await.unwrap();
        let fresh = graph.get_relationships(&me, &all).await;
        assert_eq!(fresh.len(), 1);
        assert_ne!(fresh[0].id, original.id);
        assert!(!graph.is_stale(&fresh[0]));
    }

    #[tokio::test]
    async fn test_record_search_links_query() {
        let (graph, _clock) = graph().await;
        let entity = graph.record_search("  best   ramen  ").await.unwrap();
        assert_eq!(entity.name, "best ramen");
        assert_eq!(
            entity.attributes.get("category"),
            Some(&AttrValue::from(SEARCH_QUERY_CATEGORY))
        );

        let searched = graph
            .get_relationships(
                &EntityId::self_id(),
                &RelationshipQuery::of_type(kinds::RECENTLY_SEARCHED),
            )
            .await;
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].attributes.get("query"), Some(&AttrValue::from("best ramen")));

        // Searches are short-lived and stay out of the AI context.
        let context = graph.context_for_ai().await;
        assert!(!context.contains("best ramen"));

        assert!(graph.record_search("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_recent_visits_newest_first() {
        let (graph, clock) = graph().await;
        graph.record_visit("https://a.example/", None).await.unwrap();
        clock.advance(Duration::minutes(1));
        graph.record_visit("https://b.example/", None).await.unwrap();
        clock.advance(Duration::minutes(1));
        graph.record_visit("https://a.example/", None).await.unwrap();

        let recent = graph.recent_visits(10).await;
        let names: Vec<&str> = recent.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["https://a.example/", "https://b.example/"]);
        assert_eq!(graph.recent_visits(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_search_visits_by_keyword() {
        let (graph, clock) = graph().await;
        graph
            .record_visit("https://docs.rs/tokio", Some("Tokio runtime"))
            .await
            .unwrap();
        clock.advance(Duration::minutes(1));
        graph
            .record_visit("https://blog.example/async-rust", Some("Async Rust"))
            .await
            .unwrap();
        graph
            .record_visit("https://blog.example/async-rust", None)
            .await
            .unwrap();
        graph
            .record_visit("https://news.example/", Some("Headlines"))
            .await
            .unwrap();

        let hits = graph.search_visits("TOKIO async", 10).await;
        let names: Vec<&str> = hits.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["https://blog.example/async-rust", "https://docs.rs/tokio"]);
        assert!(graph.search_visits("   ", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_forget_visit_cascades() {
        let (graph, _clock) = graph().await;
        graph.record_visit("https://example.com/", None).await.unwrap();
        assert!(graph.forget_visit("https://example.com").await);
        assert!(!graph.forget_visit("https://example.com").await);
        assert!(!graph.forget_visit("nonsense").await);
        assert!(graph.all_relationships().await.is_empty());
    }
}
