//! Entity types for relmem.
//!
//! An entity is a named, typed thing the assistant remembers about the user:
//! a person, a place, a product, a stated preference. Entity identity is
//! derived from `(type, normalized name)` so repeated mentions merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::attr::Attributes;

/// Fixed id of the entity representing the end user.
///
/// Not derivable from any `(type, name)` pair, so it never collides with
/// an entity created through `add_entity`.
pub const SELF_ENTITY_ID: &str = "self:user";

/// Display name of the self entity.
pub const SELF_ENTITY_NAME: &str = "User";

/// Kind of thing an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Product,
    Preference,
    Date,
    Url,
    Other,
}

impl EntityType {
    pub const ALL: [EntityType; 8] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Location,
        EntityType::Product,
        EntityType::Preference,
        EntityType::Date,
        EntityType::Url,
        EntityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Organization => "organization",
            EntityType::Location => "location",
            EntityType::Product => "product",
            EntityType::Preference => "preference",
            EntityType::Date => "date",
            EntityType::Url => "url",
            EntityType::Other => "other",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "person" => Ok(EntityType::Person),
            "organization" => Ok(EntityType::Organization),
            "location" => Ok(EntityType::Location),
            "product" => Ok(EntityType::Product),
            "preference" => Ok(EntityType::Preference),
            "date" => Ok(EntityType::Date),
            "url" => Ok(EntityType::Url),
            "other" => Ok(EntityType::Other),
            other => Err(format!("invalid entity type: '{other}'")),
        }
    }
}

/// Deterministic entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Derive the id for a `(type, name)` pair: `"{type}:{normalized name}"`.
    pub fn derive(entity_type: EntityType, name: &str) -> Self {
        Self(format!("{}:{}", entity_type, normalize_name(name)))
    }

    /// The well-known id of the self entity.
    pub fn self_id() -> Self {
        Self(SELF_ENTITY_ID.to_string())
    }

    pub fn is_self(&self) -> bool {
        self.0 == SELF_ENTITY_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lower-case a name and collapse every non-alphanumeric run into one `_`.
///
/// Leading and trailing separators are trimmed, so `"  Jane  Doe! "` and
/// `"jane-doe"` both normalize to `"jane_doe"`.
pub fn normalize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !result.is_empty() {
                result.push('_');
            }
            pending_separator = false;
            result.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    result
}

/// A remembered entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Display name, never empty.
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Set once at creation; merges never touch it.
    pub created: DateTime<Utc>,
    /// Set on every write.
    pub updated: DateTime<Utc>,
    /// Incremented on merge-write and on read-by-id.
    #[serde(default)]
    pub access_count: u64,
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl Entity {
    /// Build a fresh entity with a derived id.
    pub fn new(
        entity_type: EntityType,
        name: impl Into<String>,
        attributes: Attributes,
        now: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        Self {
            id: EntityId::derive(entity_type, &name),
            entity_type,
            name,
            attributes,
            created: now,
            updated: now,
            access_count: 0,
            last_accessed: None,
        }
    }
}

/// Filter for entity search. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    /// Exact type match.
    pub entity_type: Option<EntityType>,
    /// Case-insensitive substring match on the display name.
    pub name: Option<String>,
    /// Containment check on a single attribute.
    pub attribute: Option<(String, crate::attr::AttrValue)>,
}

impl EntityQuery {
    pub fn by_type(entity_type: EntityType) -> Self {
        Self {
            entity_type: Some(entity_type),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::attr::AttrValue>,
    ) -> Self {
        self.attribute = Some((key.into(), value.into()));
        self
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(t) = self.entity_type {
            if entity.entity_type != t {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !entity.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some((key, value)) = &self.attribute {
            match entity.attributes.get(key) {
                Some(have) if have.contains(value) => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::attrs;

    #[test]
    fn test_entity_type_roundtrip() {
        for t in EntityType::ALL {
            let parsed: EntityType = t.to_string().parse().unwrap();
            assert_eq!(t, parsed);
        }
    }

    #[test]
    fn test_entity_type_serde() {
        let json = serde_json::to_string(&EntityType::Organization).unwrap();
        assert_eq!(json, "\"organization\"");
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize_name("Jane Doe"), "jane_doe");
        assert_eq!(normalize_name("  Jane  --  Doe!! "), "jane_doe");
        assert_eq!(normalize_name("New York"), "new_york");
        assert_eq!(normalize_name("AT&T"), "at_t");
    }

    #[test]
    fn test_derive_id_is_deterministic() {
        let a = EntityId::derive(EntityType::Person, "Jane Doe");
        let b = EntityId::derive(EntityType::Person, "jane   doe");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "person:jane_doe");
        assert_ne!(a, EntityId::derive(EntityType::Organization, "Jane Doe"));
    }

    #[test]
    fn test_self_id_not_derivable() {
        for t in EntityType::ALL {
            assert_ne!(EntityId::derive(t, "user"), EntityId::self_id());
        }
        assert!(EntityId::self_id().is_self());
    }

    #[test]
    fn test_entity_serializes_type_field() {
        let e = Entity::new(EntityType::Location, "Austin", attrs([("category", "city")]), Utc::now());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "location");
        assert_eq!(json["id"], "location:austin");
        assert_eq!(json["attributes"]["category"], "city");
    }

    #[test]
    fn test_query_matches() {
        let e = Entity::new(EntityType::Location, "Austin", attrs([("category", "city")]), Utc::now());
        assert!(EntityQuery::default().matches(&e));
        assert!(EntityQuery::by_type(EntityType::Location).with_name("aus").matches(&e));
        assert!(!EntityQuery::by_type(EntityType::Person).matches(&e));
        assert!(EntityQuery::default().with_attribute("category", "CITY").matches(&e));
        assert!(!EntityQuery::default().with_attribute("region", "city").matches(&e));
    }
}
