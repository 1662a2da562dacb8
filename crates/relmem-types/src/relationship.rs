//! Relationship types for relmem.
//!
//! A relationship is a typed, directed link between two entities. Each type
//! carries a staleness policy assigned at creation time: after that much
//! absolute age the relationship is no longer trusted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attr::Attributes;
use crate::entity::EntityId;

/// Well-known relationship type names.
pub mod kinds {
    pub const SPOUSE: &str = "spouse";
    pub const FAMILY: &str = "family";
    pub const FRIEND: &str = "friend";
    pub const PURCHASED: &str = "purchased";
    pub const WORKS_AT: &str = "works_at";
    pub const LIVES_IN: &str = "lives_in";
    pub const PREFERS: &str = "prefers";
    pub const INTERESTED_IN: &str = "interested_in";
    pub const RECENTLY_SEARCHED: &str = "recently_searched";
    pub const RECENTLY_VISITED: &str = "recently_visited";
}

/// Attribute key that overrides the default confidence of a new record.
pub const CONFIDENCE_ATTR: &str = "confidence";

/// How long a relationship stays trustworthy by absolute age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    Never,
    AfterSeconds(i64),
}

impl StalePolicy {
    pub fn after(duration: Duration) -> Self {
        StalePolicy::AfterSeconds(duration.num_seconds())
    }

    /// Policy table keyed by relationship type. Unknown types get 30 days.
    pub fn for_type(rel_type: &str) -> Self {
        match rel_type {
            kinds::SPOUSE | kinds::FAMILY | kinds::FRIEND | kinds::PURCHASED => StalePolicy::Never,
            kinds::WORKS_AT | kinds::LIVES_IN => Self::after(Duration::days(365)),
            kinds::PREFERS => Self::after(Duration::days(90)),
            kinds::INTERESTED_IN => Self::after(Duration::days(30)),
            kinds::RECENTLY_SEARCHED => Self::after(Duration::days(7)),
            kinds::RECENTLY_VISITED => Self::after(Duration::hours(24)),
            _ => Self::after(Duration::days(30)),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            StalePolicy::Never => None,
            StalePolicy::AfterSeconds(secs) => Some(Duration::seconds(*secs)),
        }
    }
}

/// A directed link between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Assigned at first creation, preserved across in-place updates.
    pub id: Uuid,
    pub from: EntityId,
    pub to: EntityId,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub attributes: Attributes,
    pub confidence: f64,
    pub stale_after: StalePolicy,
    /// Preserved across re-adds so re-confirmation never resets staleness.
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub last_confirmed: Option<DateTime<Utc>>,
}

impl Relationship {
    /// True iff the policy has a limit and `now - created` exceeds it.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match self.stale_after.duration() {
            None => false,
            Some(limit) => now.signed_duration_since(self.created) > limit,
        }
    }

    /// True if `entity` is either endpoint.
    pub fn touches(&self, entity: &EntityId) -> bool {
        &self.from == entity || &self.to == entity
    }

    /// The endpoint opposite to `entity`.
    pub fn other_end(&self, entity: &EntityId) -> &EntityId {
        if &self.from == entity { &self.to } else { &self.from }
    }
}

/// Which endpoint a relationship query matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Any,
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn matches(&self, rel: &Relationship, entity: &EntityId) -> bool {
        match self {
            Direction::Any => rel.touches(entity),
            Direction::Outgoing => &rel.from == entity,
            Direction::Incoming => &rel.to == entity,
        }
    }
}

/// Options for `get_relationships`.
#[derive(Debug, Clone, Default)]
pub struct RelationshipQuery {
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub include_stale: bool,
}

impl RelationshipQuery {
    pub fn of_type(rel_type: impl Into<String>) -> Self {
        Self {
            rel_type: Some(rel_type.into()),
            ..Self::default()
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn include_stale(mut self, include: bool) -> Self {
        self.include_stale = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(rel_type: &str, age: Duration, now: DateTime<Utc>) -> Relationship {
        Relationship {
            id: Uuid::now_v7(),
            from: EntityId::self_id(),
            to: EntityId::from("location:austin"),
            rel_type: rel_type.to_string(),
            attributes: Attributes::new(),
            confidence: 0.8,
            stale_after: StalePolicy::for_type(rel_type),
            created: now - age,
            updated: now - age,
            last_confirmed: None,
        }
    }

    #[test]
    fn test_policy_table() {
        assert_eq!(StalePolicy::for_type("spouse"), StalePolicy::Never);
        assert_eq!(StalePolicy::for_type("purchased"), StalePolicy::Never);
        assert_eq!(StalePolicy::for_type("works_at"), StalePolicy::AfterSeconds(365 * 86_400));
        assert_eq!(StalePolicy::for_type("prefers"), StalePolicy::AfterSeconds(90 * 86_400));
        assert_eq!(StalePolicy::for_type("interested_in"), StalePolicy::AfterSeconds(30 * 86_400));
        assert_eq!(StalePolicy::for_type("recently_searched"), StalePolicy::AfterSeconds(7 * 86_400));
        assert_eq!(StalePolicy::for_type("recently_visited"), StalePolicy::AfterSeconds(86_400));
        assert_eq!(StalePolicy::for_type("owns_pet"), StalePolicy::AfterSeconds(30 * 86_400));
    }

    #[test]
    fn test_lives_in_staleness_by_age() {
        let now = Utc::now();
        assert!(rel("lives_in", Duration::days(400), now).is_stale_at(now));
        assert!(!rel("lives_in", Duration::days(10), now).is_stale_at(now));
    }

    #[test]
    fn test_spouse_never_stale() {
        let now = Utc::now();
        assert!(!rel("spouse", Duration::days(10_000), now).is_stale_at(now));
    }

    #[test]
    fn test_recently_visited_day_boundary() {
        let now = Utc::now();
        assert!(!rel("recently_visited", Duration::hours(23), now).is_stale_at(now));
        assert!(rel("recently_visited", Duration::hours(25), now).is_stale_at(now));
    }

    #[test]
    fn test_direction_matching() {
        let now = Utc::now();
        let r = rel("lives_in", Duration::zero(), now);
        let me = EntityId::self_id();
        let city = EntityId::from("location:austin");
        assert!(Direction::Outgoing.matches(&r, &me));
        assert!(!Direction::Incoming.matches(&r, &me));
        assert!(Direction::Incoming.matches(&r, &city));
        assert!(Direction::Any.matches(&r, &city));
        assert_eq!(r.other_end(&me), &city);
    }

    #[test]
    fn test_stale_policy_serde() {
        let json = serde_json::to_string(&StalePolicy::Never).unwrap();
        assert_eq!(json, "\"never\"");
        let json = serde_json::to_string(&StalePolicy::AfterSeconds(60)).unwrap();
        assert_eq!(json, r#"{"after_seconds":60}"#);
    }
}
