//! Built-in regex extractors.
//!
//! Cue words are matched case-insensitively through scoped `(?i:...)` groups;
//! the captured names stay case-sensitive so that only capitalized words are
//! taken as proper nouns.

use std::sync::LazyLock;

use regex::Regex;

use relmem_types::attr::{Attributes, attrs};
use relmem_types::entity::EntityType;
use relmem_types::relationship::kinds;

use super::gazetteer::lookup_city;
use super::{ExtractionContext, Extractor, Proposal};

macro_rules! pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ---------------------------------------------------------------------------
// Patterns
//
// Continuation words of a captured name need a lowercase second letter, so a
// trailing "I" or "I'm" never becomes part of the name.
// ---------------------------------------------------------------------------

// "my wife's name is Jane", "my brother is Tom"
pattern!(
    RE_RELATION_NAME,
    r"(?i:\bmy\s+(best\s+friend|wife|husband|spouse|partner|mother|mom|father|dad|brother|sister|son|daughter|grandmother|grandma|grandfather|grandpa|aunt|uncle|cousin|friend)(?:'s)?\s+(?:name\s+is|is\s+named|is\s+called|is)\s+)([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)"
);

// "I like/prefer/love/enjoy X"
pattern!(
    RE_PREFERENCE,
    r"(?i:\bI\s+(?:really\s+|also\s+|do\s+)?(?:like|prefer|love|enjoy)\s+)([^.,!?;\n]+)"
);

// "I live in Austin", "I moved to New York"
pattern!(
    RE_RESIDENCE,
    r"(?i:\bI\s+(?:live|reside)\s+in\s+|\bI\s+am\s+living\s+in\s+|\bI'm\s+living\s+in\s+|\bI\s+moved\s+to\s+)([A-Z][\w'-]+(?:\s+[A-Z][a-z][\w'-]*)*)"
);

// "I work at Acme", "I'm employed by Globex Corp"
pattern!(
    RE_EMPLOYMENT,
    r"(?i:\bI\s+work\s+(?:at|for)\s+|\bI\s+am\s+(?:employed|working)\s+(?:at|by|for)\s+|\bI'm\s+(?:employed|working)\s+(?:at|by|for)\s+)([A-Z][\w&'-]+(?:\s+[A-Z][a-z][\w&'-]*)*)"
);

// "looking for a coffee shop in Austin"
pattern!(
    RE_SEARCH_INTEREST,
    r"(?i:\b(?:looking\s+for|searching\s+for|interested\s+in|shopping\s+for)\s+)([^.,!?;\n]+?)(?:(?i:\s+(?:in|near|around)\s+)([A-Z][\w'-]+(?:\s+[A-Z][a-z][\w'-]*)*))?\s*(?:[.,!?;\n]|$)"
);

// "in Austin", "near San Francisco"
pattern!(
    RE_PLACE_CUE,
    r"(?i:\b(?:in|at|near|around)\s+)([A-Z][a-z]+)(?:\s+([A-Z][a-z]+))?"
);

/// Longest preference or search phrase accepted, in words.
const MAX_PHRASE_WORDS: usize = 8;
const MAX_PHRASE_CHARS: usize = 80;

const PRONOUNS: &[&str] = &["it", "that", "this", "them", "those", "these", "you", "him", "her"];
const LEADING_ARTICLES: &[&str] = &["a ", "an ", "the ", "some "];

/// Trim a free-text capture down to the phrase worth storing.
fn clean_phrase(raw: &str) -> Option<String> {
    let mut phrase = raw.trim();
    for cut in [" because ", " but ", " since "] {
        // ASCII lowering keeps byte offsets valid for slicing.
        if let Some(idx) = phrase.to_ascii_lowercase().find(cut) {
            phrase = &phrase[..idx];
        }
    }
    let phrase = phrase.trim();

    if phrase.is_empty()
        || phrase.len() > MAX_PHRASE_CHARS
        || phrase.split_whitespace().count() > MAX_PHRASE_WORDS
        || PRONOUNS.contains(&phrase.to_ascii_lowercase().as_str())
    {
        return None;
    }
    Some(phrase.to_string())
}

fn strip_prefix_ci<'a>(text: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|p| {
            let head = text.get(..p.len())?;
            head.eq_ignore_ascii_case(p).then(|| &text[p.len()..])
        })
        .unwrap_or(text)
}

/// Person mentioned by their relation to the user.
///
/// Spouses and partners map to `spouse`, friends to `friend`, everyone else
/// to `family` with the relation kept as an attribute. Also records a
/// `<relation>_name` fact on the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationNameExtractor;

impl RelationNameExtractor {
    /// `(relationship type, relation label)` for a matched relation word.
    fn classify(relation: &str) -> (&'static str, String) {
        let label = relation
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        match label.as_str() {
            "wife" | "husband" | "spouse" | "partner" => (kinds::SPOUSE, "spouse".to_string()),
            "friend" | "best_friend" => (kinds::FRIEND, label),
            "mom" => (kinds::FAMILY, "mother".to_string()),
            "dad" => (kinds::FAMILY, "father".to_string()),
            "grandma" => (kinds::FAMILY, "grandmother".to_string()),
            "grandpa" => (kinds::FAMILY, "grandfather".to_string()),
            _ => (kinds::FAMILY, label),
        }
    }
}

impl Extractor for RelationNameExtractor {
    fn name(&self) -> &'static str {
        "relation_name"
    }

    fn extract(&self, text: &str, _ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
        let Some(re) = RE_RELATION_NAME.as_ref() else {
            return Vec::new();
        };

        re.captures_iter(text)
            .filter_map(|caps| {
                let relation = caps.get(1)?.as_str();
                let name = caps.get(2)?.as_str().trim();
                let (rel_type, label) = Self::classify(relation);
                let spoken = relation.to_lowercase();

                Some(
                    Proposal::entity(EntityType::Person, name, attrs([("relation", spoken.as_str())]))
                        .related_by(rel_type, attrs([("relation", label.as_str())]))
                        .with_fact(format!("{label}_name"), name),
                )
            })
            .collect()
    }
}

/// Stated likes and preferences, tagged with the conversation topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferenceExtractor;

impl Extractor for PreferenceExtractor {
    fn name(&self) -> &'static str {
        "preference"
    }

    fn extract(&self, text: &str, ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
        let Some(re) = RE_PREFERENCE.as_ref() else {
            return Vec::new();
        };
        let topic = ctx.topic_or_general();

        re.captures_iter(text)
            .filter_map(|caps| {
                let raw = caps.get(1)?.as_str();
                let phrase = clean_phrase(strip_prefix_ci(raw.trim(), &["to "]))?;
                Some(
                    Proposal::entity(EntityType::Preference, phrase, attrs([("context", topic)]))
                        .related_by(kinds::PREFERS, attrs([("context", topic)])),
                )
            })
            .collect()
    }
}

/// Where the user lives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidenceExtractor;

impl Extractor for ResidenceExtractor {
    fn name(&self) -> &'static str {
        "residence"
    }

    fn extract(&self, text: &str, _ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
        let Some(re) = RE_RESIDENCE.as_ref() else {
            return Vec::new();
        };

        re.captures_iter(text)
            .filter_map(|caps| {
                let place = caps.get(1)?.as_str().trim();
                Some(
                    Proposal::entity(EntityType::Location, place, Attributes::new())
                        .related_by(kinds::LIVES_IN, Attributes::new())
                        .with_fact("home_location", place),
                )
            })
            .collect()
    }
}

/// Where the user works.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmploymentExtractor;

impl Extractor for EmploymentExtractor {
    fn name(&self) -> &'static str {
        "employment"
    }

    fn extract(&self, text: &str, _ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
        let Some(re) = RE_EMPLOYMENT.as_ref() else {
            return Vec::new();
        };

        re.captures_iter(text)
            .filter_map(|caps| {
                let org = caps.get(1)?.as_str().trim();
                Some(
                    Proposal::entity(EntityType::Organization, org, Attributes::new())
                        .related_by(kinds::WORKS_AT, Attributes::new())
                        .with_fact("employer", org),
                )
            })
            .collect()
    }
}

/// What the user is searching or shopping for, with an optional place.
///
/// The interest relationship carries the originating text and when it was
/// seen. A captured place becomes a location entity without a relationship.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchInterestExtractor;

impl Extractor for SearchInterestExtractor {
    fn name(&self) -> &'static str {
        "search_interest"
    }

    fn extract(&self, text: &str, ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
        let Some(re) = RE_SEARCH_INTEREST.as_ref() else {
            return Vec::new();
        };
        let timestamp = ctx.now.to_rfc3339();
        let query = text.trim();

        let mut proposals = Vec::new();
        for caps in re.captures_iter(text) {
            let Some(subject) = caps
                .get(1)
                .and_then(|m| clean_phrase(strip_prefix_ci(m.as_str().trim(), LEADING_ARTICLES)))
            else {
                continue;
            };

            proposals.push(
                Proposal::entity(
                    EntityType::Preference,
                    subject,
                    attrs([("category", "search_interest")]),
                )
                .related_by(
                    kinds::INTERESTED_IN,
                    attrs([("query", query), ("timestamp", timestamp.as_str())]),
                ),
            );

            if let Some(place) = caps.get(2) {
                proposals.push(Proposal::entity(
                    EntityType::Location,
                    place.as_str().trim(),
                    attrs([("category", "search_location")]),
                ));
            }
        }
        proposals
    }
}

/// Known city names following a place preposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct GazetteerExtractor;

impl Extractor for GazetteerExtractor {
    fn name(&self) -> &'static str {
        "gazetteer"
    }

    fn extract(&self, text: &str, _ctx: &ExtractionContext<'_>) -> Vec<Proposal> {
        let Some(re) = RE_PLACE_CUE.as_ref() else {
            return Vec::new();
        };

        re.captures_iter(text)
            .filter_map(|caps| {
                let first = caps.get(1)?.as_str();
                let two_words = caps
                    .get(2)
                    .and_then(|second| lookup_city(&format!("{first} {}", second.as_str())));
                let city = two_words.or_else(|| lookup_city(first))?;
                Some(
                    Proposal::entity(EntityType::Location, city, attrs([("category", "city")]))
                        .related_by(kinds::INTERESTED_IN, Attributes::new()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use relmem_types::attr::AttrValue;

    use super::*;

    fn ctx() -> ExtractionContext<'static> {
        ExtractionContext {
            topic: None,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_all_patterns_compile() {
        assert!(RE_RELATION_NAME.is_some());
        assert!(RE_PREFERENCE.is_some());
        assert!(RE_RESIDENCE.is_some());
        assert!(RE_EMPLOYMENT.is_some());
        assert!(RE_SEARCH_INTEREST.is_some());
        assert!(RE_PLACE_CUE.is_some());
    }

    #[test]
    fn test_spouse_name() {
        let proposals = RelationNameExtractor.extract("My wife's name is Jane Doe.", &ctx());
        assert_eq!(proposals.len(), 1);
        let p = &proposals[0];
        assert_eq!(p.entity.entity_type, EntityType::Person);
        assert_eq!(p.entity.name, "Jane Doe");
        assert_eq!(p.relationship.as_ref().unwrap().rel_type, kinds::SPOUSE);
        assert_eq!(p.facts[0].predicate, "spouse_name");
        assert_eq!(p.facts[0].object, "Jane Doe");
    }

    #[test]
    fn test_family_and_friend_relations() {
        let proposals =
            RelationNameExtractor.extract("my mom is Carol and my best friend is Sam", &ctx());
        assert_eq!(proposals.len(), 2);

        let mom = &proposals[0];
        let rel = mom.relationship.as_ref().unwrap();
        assert_eq!(rel.rel_type, kinds::FAMILY);
        assert_eq!(rel.attributes.get("relation"), Some(&AttrValue::from("mother")));
        assert_eq!(mom.facts[0].predicate, "mother_name");

        let friend = &proposals[1];
        assert_eq!(friend.relationship.as_ref().unwrap().rel_type, kinds::FRIEND);
        assert_eq!(friend.facts[0].predicate, "best_friend_name");
    }

    #[test]
    fn test_relation_requires_capitalized_name() {
        assert!(RelationNameExtractor.extract("my friend is coming over", &ctx()).is_empty());
    }

    #[test]
    fn test_preference_with_topic() {
        let ctx = ExtractionContext {
            topic: Some("food"),
            now: Utc::now(),
        };
        let proposals = PreferenceExtractor.extract("I really love Thai food, honestly.", &ctx);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].entity.name, "Thai food");
        let rel = proposals[0].relationship.as_ref().unwrap();
        assert_eq!(rel.rel_type, kinds::PREFERS);
        assert_eq!(rel.attributes.get("context"), Some(&AttrValue::from("food")));
    }

    #[test]
    fn test_preference_cleanup() {
        let proposals = PreferenceExtractor.extract("I like to hike because it is calm", &ctx());
        assert_eq!(proposals[0].entity.name, "hike");
        assert_eq!(
            proposals[0].entity.attributes.get("context"),
            Some(&AttrValue::from("general"))
        );

        assert!(PreferenceExtractor.extract("I like it.", &ctx()).is_empty());
        assert!(PreferenceExtractor
            .extract("I like the way the old lighthouse keeper told those long winding stories", &ctx())
            .is_empty());
    }

    #[test]
    fn test_residence() {
        let proposals = ResidenceExtractor.extract("I moved to New York last year", &ctx());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].entity.name, "New York");
        assert_eq!(proposals[0].entity.entity_type, EntityType::Location);
        assert_eq!(proposals[0].facts[0].predicate, "home_location");

        assert!(ResidenceExtractor.extract("I live in a small flat", &ctx()).is_empty());
    }

    #[test]
    fn test_employment() {
        let proposals = EmploymentExtractor.extract("These days I work for Globex Corp.", &ctx());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].entity.name, "Globex Corp");
        assert_eq!(proposals[0].relationship.as_ref().unwrap().rel_type, kinds::WORKS_AT);
        assert_eq!(proposals[0].facts[0].predicate, "employer");
    }

    #[test]
    fn test_names_stop_before_first_person() {
        let work = EmploymentExtractor.extract("I work at Acme I'm happy there", &ctx());
        assert_eq!(work[0].entity.name, "Acme");
        assert_eq!(work[0].facts[0].object, "Acme");

        let home = ResidenceExtractor.extract("I live in Austin I think", &ctx());
        assert_eq!(home[0].entity.name, "Austin");

        let home = ResidenceExtractor.extract("I live in San Antonio I'm told", &ctx());
        assert_eq!(home[0].entity.name, "San Antonio");
    }

    #[test]
    fn test_search_interest_with_location() {
        let text = "I'm looking for a coffee shop in Austin.";
        let proposals = SearchInterestExtractor.extract(text, &ctx());
        assert_eq!(proposals.len(), 2);

        let interest = &proposals[0];
        assert_eq!(interest.entity.name, "coffee shop");
        assert_eq!(
            interest.entity.attributes.get("category"),
            Some(&AttrValue::from("search_interest"))
        );
        let rel = interest.relationship.as_ref().unwrap();
        assert_eq!(rel.rel_type, kinds::INTERESTED_IN);
        assert_eq!(rel.attributes.get("query"), Some(&AttrValue::from(text)));
        assert!(rel.attributes.contains_key("timestamp"));

        let place = &proposals[1];
        assert_eq!(place.entity.name, "Austin");
        assert_eq!(
            place.entity.attributes.get("category"),
            Some(&AttrValue::from("search_location"))
        );
        assert!(place.relationship.is_none());
    }

    #[test]
    fn test_search_interest_without_location() {
        let proposals = SearchInterestExtractor.extract("searching for running shoes", &ctx());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].entity.name, "running shoes");
    }

    #[test]
    fn test_gazetteer_prefers_two_word_city() {
        let proposals =
            GazetteerExtractor.extract("We had dinner near San Francisco and in Paris", &ctx());
        let names: Vec<_> = proposals.iter().map(|p| p.entity.name.as_str()).collect();
        assert_eq!(names, vec!["San Francisco", "Paris"]);
        assert_eq!(
            proposals[0].entity.attributes.get("category"),
            Some(&AttrValue::from("city"))
        );
    }

    #[test]
    fn test_gazetteer_ignores_unknown_places() {
        assert!(GazetteerExtractor.extract("I work at Acme", &ctx()).is_empty());
    }
}
