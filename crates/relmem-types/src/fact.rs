//! Fact types for relmem.
//!
//! A fact is a subject/predicate/object triple hanging off one entity.
//! At most one fact exists per `(subject, predicate)`; later writes replace
//! the object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityId;

/// Attribute key carrying the provenance of a fact.
pub const SOURCE_ATTR: &str = "source";

/// Provenance label for facts written without an explicit source.
pub const DEFAULT_SOURCE: &str = "manual";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: Uuid,
    pub subject: EntityId,
    pub predicate: String,
    pub object: String,
    pub confidence: f64,
    pub source: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub last_confirmed: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_serialize() {
        let now = Utc::now();
        let fact = Fact {
            id: Uuid::now_v7(),
            subject: EntityId::self_id(),
            predicate: "employer".to_string(),
            object: "Acme".to_string(),
            confidence: 0.8,
            source: DEFAULT_SOURCE.to_string(),
            created: now,
            updated: now,
            last_confirmed: None,
        };
        let json = serde_json::to_string(&fact).unwrap();
        assert!(json.contains("\"subject\":\"self:user\""));
        assert!(json.contains("\"predicate\":\"employer\""));

        let parsed: Fact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.object, "Acme");
        assert!(parsed.last_confirmed.is_none());
    }
}
