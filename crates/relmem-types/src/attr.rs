//! Open attribute maps attached to entities and relationships.
//!
//! Attributes are schemaless but statically typed: every value is a string,
//! number, boolean, or a nested map of further values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute map keyed by attribute name. Ordered so persisted output is stable.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// False if this value, or any value nested in it, is a NaN or infinite
    /// number. Such numbers have no JSON form.
    pub fn is_finite(&self) -> bool {
        match self {
            AttrValue::Number(n) => n.is_finite(),
            AttrValue::Map(map) => map.values().all(AttrValue::is_finite),
            AttrValue::Bool(_) | AttrValue::Text(_) => true,
        }
    }

    /// Containment check used by attribute queries.
    ///
    /// Text values match when `needle` is a case-insensitive substring;
    /// every other variant requires equality.
    pub fn contains(&self, needle: &AttrValue) -> bool {
        match (self, needle) {
            (AttrValue::Text(haystack), AttrValue::Text(n)) => {
                haystack.to_lowercase().contains(&n.to_lowercase())
            }
            (AttrValue::Map(map), AttrValue::Map(sub)) => sub
                .iter()
                .all(|(k, v)| map.get(k).is_some_and(|have| have.contains(v))),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Number(n) => write!(f, "{n}"),
            AttrValue::Text(s) => write!(f, "{s}"),
            AttrValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Shallow merge: keys in `update` overwrite `base`, unspecified keys survive.
pub fn merge_attributes(base: &mut Attributes, update: Attributes) {
    for (key, value) in update {
        base.insert(key, value);
    }
}

/// Name of the first attribute holding a non-finite number, if any.
pub fn non_finite_key(attributes: &Attributes) -> Option<&str> {
    attributes
        .iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(key, _)| key.as_str())
}

/// Build an attribute map from `(key, value)` pairs.
pub fn attrs<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_and_preserves() {
        let mut base = attrs([("role", "engineer"), ("team", "infra")]);
        merge_attributes(&mut base, attrs([("role", "manager")]));
        assert_eq!(base.get("role"), Some(&AttrValue::from("manager")));
        assert_eq!(base.get("team"), Some(&AttrValue::from("infra")));
    }

    #[test]
    fn test_untagged_serde_shapes() {
        let mut nested = Attributes::new();
        nested.insert("city".to_string(), AttrValue::from("Austin"));
        let mut map = attrs([("confidence", 0.9)]);
        map.insert("flag".to_string(), AttrValue::Bool(true));
        map.insert("where".to_string(), AttrValue::Map(nested));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"confidence":0.9,"flag":true,"where":{"city":"Austin"}}"#
        );
        let parsed: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_text_containment_is_case_insensitive() {
        let v = AttrValue::from("Search Interest");
        assert!(v.contains(&AttrValue::from("interest")));
        assert!(!v.contains(&AttrValue::from("visit")));
        assert!(!v.contains(&AttrValue::Number(1.0)));
    }

    #[test]
    fn test_number_containment_requires_equality() {
        assert!(AttrValue::Number(2.0).contains(&AttrValue::Number(2.0)));
        assert!(!AttrValue::Number(2.0).contains(&AttrValue::Number(3.0)));
    }

    #[test]
    fn test_non_finite_numbers_are_found_at_any_depth() {
        assert_eq!(non_finite_key(&attrs([("size", 3.0)])), None);
        assert_eq!(non_finite_key(&attrs([("nickname", f64::NAN)])), Some("nickname"));

        let mut nested = Attributes::new();
        nested.insert("limit".to_string(), AttrValue::Number(f64::INFINITY));
        let mut map = attrs([("name", "Grandma")]);
        map.insert("meta".to_string(), AttrValue::Map(nested));
        assert_eq!(non_finite_key(&map), Some("meta"));
        assert!(AttrValue::from("NaN").is_finite());
    }
}
